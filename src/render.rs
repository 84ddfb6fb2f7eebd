//! Block renderer: turns one schema block into a libsonnet [`Document`].

use crate::config::GeneratorConfig;
use crate::constructor::{attrs_constructor, constructor, ensure_root_kind};
use crate::docstring::{
    core_fn_ref, fn_anchor, render, ConstructorDoc, DocRenderer, DocTemplate, MutatorDoc,
    PackageDoc, ParamDoc,
};
use crate::document::{docsonnet, required_then_name, sort_nodes, Comparator, Document, Node};
use crate::error::{Error, Result};
use crate::mutator::with_attribute_or_block_fn;
use crate::naming::{
    attribute_collection_kind, attribute_doc_type, block_doc_type, classify_collection,
    eligible_attributes, name_without_provider, nested_blocks, BlockKind, CollectionKind,
};
use crate::schema::Block;

/// Renders the blocks of one provider.
///
/// The generator holds no mutable state and can be shared by the threads
/// rendering the blocks of a library.
pub struct Generator<'a> {
    config: &'a GeneratorConfig,
    docs: &'a dyn DocRenderer,
    cmp: Comparator,
}

/// Position of a nested block in the library.
struct NestedPath {
    /// Dotted path used in doc strings, e.g. `aws.instance.ebs_block_device`.
    fn_prefix: String,
    /// Concatenated object names used for markdown anchors.
    anchor: String,
    /// Dotted schema path used in errors, e.g. `aws_instance.ebs_block_device`.
    schema_path: String,
}

impl NestedPath {
    fn child(&self, name: &str) -> Self {
        Self {
            fn_prefix: format!("{}.{}", self.fn_prefix, name),
            anchor: format!("{}{}", self.anchor, name),
            schema_path: format!("{}.{}", self.schema_path, name),
        }
    }
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a GeneratorConfig, docs: &'a dyn DocRenderer) -> Self {
        Self {
            config,
            docs,
            cmp: required_then_name,
        }
    }

    /// Replaces the ordering applied to fields and parameters.
    pub fn with_comparator(mut self, cmp: Comparator) -> Self {
        self.cmp = cmp;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.config
    }

    pub fn docs(&self) -> &dyn DocRenderer {
        self.docs
    }

    pub(crate) fn locals(&self) -> Vec<Node> {
        vec![
            Node::local(Node::import("tf", self.config.core_import.as_str())),
            Node::local(Node::import("d", self.config.docsonnet_import.as_str())),
        ]
    }

    /// Renders the library file of a resource or data source.
    pub fn render_resource_or_data_source(
        &self,
        kind: BlockKind,
        type_name: &str,
        block: &Block,
    ) -> Result<Document> {
        ensure_root_kind(kind, "resource library")?;
        let provider = self.config.provider_name();
        let short_name = name_without_provider(provider, type_name);
        let fn_prefix = match kind {
            BlockKind::DataSource => format!("{}.data.{}", provider, short_name),
            _ => format!("{}.{}", provider, short_name),
        };
        let names = self.config.names();

        let ctor_doc = ConstructorDoc {
            provider_name: provider.to_string(),
            type_name: type_name.to_string(),
            resource_or_data_source: kind.to_string(),
            label_param: kind.label_arg().unwrap_or_default().to_string(),
            core_fn: core_fn_ref(kind),
            fn_name: names.constructor.clone(),
            fn_prefix: fn_prefix.clone(),
            constructor_name: names.constructor.clone(),
            constructor_ref: fn_anchor("", &names.constructor),
            attrs_fn_name: names.attrs_constructor.clone(),
            meta_param: names.meta_param.clone(),
            params: self.param_docs("", block),
        };
        let attrs_doc = ConstructorDoc {
            fn_name: names.attrs_constructor.clone(),
            ..ctor_doc.clone()
        };

        let mut fields = vec![
            docsonnet::func(
                &names.constructor,
                render(self.docs, DocTemplate::Constructor, &ctor_doc)?,
            ),
            Node::hidden(constructor(self.config, kind, type_name, block, self.cmp)?),
            docsonnet::func(
                &names.attrs_constructor,
                render(self.docs, DocTemplate::AttrsConstructor, &attrs_doc)?,
            ),
            Node::hidden(attrs_constructor(
                self.config,
                &names.attrs_constructor,
                block,
                self.cmp,
            )),
        ];

        for input in eligible_attributes(self.config, block).values() {
            let collection_kind = attribute_collection_kind(input.attr)?;
            self.push_mutators(
                &mut fields,
                kind,
                type_name,
                &fn_prefix,
                input.tf_name,
                collection_kind,
                attribute_doc_type(input.attr),
            )?;
        }

        let root_path = NestedPath {
            fn_prefix,
            anchor: String::new(),
            schema_path: type_name.to_string(),
        };
        for input in nested_blocks(self.config, block).values() {
            let collection_kind = classify_collection(&input.block.nesting_mode)?;
            self.push_mutators(
                &mut fields,
                kind,
                type_name,
                &root_path.fn_prefix,
                input.tf_name,
                collection_kind,
                block_doc_type(&input.block.nesting_mode),
            )?;
            fields.push(Node::hidden(self.nested_block_object(
                &root_path.child(input.tf_name),
                input.tf_name,
                &input.block.block,
                1,
            )?));
        }
        sort_nodes(&mut fields, self.cmp);

        let pkg_doc = PackageDoc {
            provider_name: provider.to_string(),
            type_name: type_name.to_string(),
            fn_prefix: root_path.fn_prefix.clone(),
            resource_or_data_source: kind.to_string(),
            description: block.description.clone(),
        };
        fields.insert(
            0,
            docsonnet::pkg(
                short_name,
                "",
                render(self.docs, DocTemplate::Package, &pkg_doc)?,
            ),
        );

        Ok(Document::new(self.locals(), Node::object(type_name, fields)))
    }

    /// Renders the provider library file.
    ///
    /// Providers only get constructors since Terraform JSON keeps provider
    /// blocks in a list that a mutator could not address.
    pub fn render_provider(&self, block: &Block) -> Result<Document> {
        let provider = self.config.provider_name();
        let names = self.config.names();
        let fn_prefix = format!("{}.provider", provider);

        let ctor_doc = ConstructorDoc {
            provider_name: provider.to_string(),
            type_name: provider.to_string(),
            resource_or_data_source: BlockKind::Provider.to_string(),
            core_fn: core_fn_ref(BlockKind::Provider),
            fn_name: names.constructor.clone(),
            fn_prefix: fn_prefix.clone(),
            constructor_name: names.constructor.clone(),
            constructor_ref: fn_anchor("", &names.constructor),
            attrs_fn_name: names.attrs_constructor.clone(),
            params: self.param_docs("", block),
            ..Default::default()
        };
        let attrs_doc = ConstructorDoc {
            fn_name: names.attrs_constructor.clone(),
            ..ctor_doc.clone()
        };

        let mut fields = vec![
            docsonnet::func(
                &names.constructor,
                render(self.docs, DocTemplate::ProviderConstructor, &ctor_doc)?,
            ),
            Node::hidden(constructor(
                self.config,
                BlockKind::Provider,
                provider,
                block,
                self.cmp,
            )?),
            docsonnet::func(
                &names.attrs_constructor,
                render(self.docs, DocTemplate::ProviderAttrsConstructor, &attrs_doc)?,
            ),
            Node::hidden(attrs_constructor(
                self.config,
                &names.attrs_constructor,
                block,
                self.cmp,
            )),
        ];

        let root_path = NestedPath {
            fn_prefix,
            anchor: String::new(),
            schema_path: "provider".to_string(),
        };
        for input in nested_blocks(self.config, block).values() {
            classify_collection(&input.block.nesting_mode)?;
            fields.push(Node::hidden(self.nested_block_object(
                &root_path.child(input.tf_name),
                input.tf_name,
                &input.block.block,
                1,
            )?));
        }
        sort_nodes(&mut fields, self.cmp);

        let pkg_doc = PackageDoc {
            provider_name: provider.to_string(),
            type_name: provider.to_string(),
            fn_prefix: root_path.fn_prefix.clone(),
            resource_or_data_source: BlockKind::Provider.to_string(),
            description: block.description.clone(),
        };
        fields.insert(
            0,
            docsonnet::pkg(
                "provider",
                "",
                render(self.docs, DocTemplate::Provider, &pkg_doc)?,
            ),
        );

        Ok(Document::new(self.locals(), Node::object("provider", fields)))
    }

    /// Object holding the constructor of a nested block and, recursively, the
    /// objects of its own nested blocks.
    fn nested_block_object(
        &self,
        path: &NestedPath,
        tf_name: &str,
        block: &Block,
        depth: usize,
    ) -> Result<Node> {
        if depth > self.config.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                path: path.schema_path.clone(),
                limit: self.config.max_nesting_depth,
            });
        }
        let names = self.config.names();
        let doc = ConstructorDoc {
            provider_name: self.config.provider_name().to_string(),
            type_name: tf_name.to_string(),
            resource_or_data_source: BlockKind::NestedBlock.to_string(),
            fn_name: names.constructor.clone(),
            fn_prefix: path.fn_prefix.clone(),
            params: self.param_docs(&path.anchor, block),
            ..Default::default()
        };

        let mut fields = vec![
            docsonnet::func(
                &names.constructor,
                render(self.docs, DocTemplate::NestedConstructor, &doc)?,
            ),
            Node::hidden(constructor(
                self.config,
                BlockKind::NestedBlock,
                tf_name,
                block,
                self.cmp,
            )?),
        ];
        for input in nested_blocks(self.config, block).values() {
            classify_collection(&input.block.nesting_mode)?;
            fields.push(Node::hidden(self.nested_block_object(
                &path.child(input.tf_name),
                input.tf_name,
                &input.block.block,
                depth + 1,
            )?));
        }
        sort_nodes(&mut fields, self.cmp);

        Ok(Node::object(tf_name, fields))
    }

    #[allow(clippy::too_many_arguments)]
    fn push_mutators(
        &self,
        fields: &mut Vec<Node>,
        kind: BlockKind,
        type_name: &str,
        fn_prefix: &str,
        field: &str,
        collection_kind: CollectionKind,
        typ: &str,
    ) -> Result<()> {
        let bare = with_attribute_or_block_fn(
            self.config,
            kind,
            type_name,
            field,
            false,
            collection_kind,
        )?;
        let has_mixin = collection_kind != CollectionKind::Scalar;
        let mixin = if has_mixin {
            Some(with_attribute_or_block_fn(
                self.config,
                kind,
                type_name,
                field,
                true,
                collection_kind,
            )?)
        } else {
            None
        };

        let bare_name = bare.name().to_string();
        let mixin_name = mixin
            .as_ref()
            .map(|m| m.name().to_string())
            .unwrap_or_default();
        let doc = MutatorDoc {
            type_name: type_name.to_string(),
            field_name: field.to_string(),
            typ: typ.to_string(),
            fn_prefix: fn_prefix.to_string(),
            fn_name: bare_name.clone(),
            bare_fn_anchor: bare_name.to_lowercase(),
            bare_fn_name: bare_name.clone(),
            mixin_fn_anchor: mixin_name.to_lowercase(),
            mixin_fn_name: mixin_name.clone(),
            resource_or_data_source: kind.to_string(),
            label_param: kind.label_arg().unwrap_or_default().to_string(),
            is_array: collection_kind == CollectionKind::ListOrSet,
            is_map: collection_kind == CollectionKind::Map,
            is_mixin: false,
            has_mixin,
        };

        fields.push(docsonnet::func(
            &bare_name,
            render(self.docs, DocTemplate::Mutator, &doc)?,
        ));
        fields.push(Node::hidden(bare));
        if let Some(mixin) = mixin {
            let doc = MutatorDoc {
                fn_name: mixin_name.clone(),
                is_mixin: true,
                ..doc
            };
            fields.push(docsonnet::func(
                &mixin_name,
                render(self.docs, DocTemplate::Mutator, &doc)?,
            ));
            fields.push(Node::hidden(mixin));
        }
        Ok(())
    }

    /// Doc entries of the constructor parameters of `block`, in parameter order.
    fn param_docs(&self, anchor: &str, block: &Block) -> Vec<ParamDoc> {
        let mut params: Vec<ParamDoc> = eligible_attributes(self.config, block)
            .into_iter()
            .map(|(name, input)| ParamDoc {
                name,
                tf_name: input.tf_name.to_string(),
                description: input.attr.description.clone(),
                typ: attribute_doc_type(input.attr).to_string(),
                is_optional: !input.attr.required,
                is_block: false,
                constructor_ref: String::new(),
            })
            .collect();
        params.extend(
            nested_blocks(self.config, block)
                .into_iter()
                .map(|(name, input)| ParamDoc {
                    name,
                    tf_name: input.tf_name.to_string(),
                    description: input.block.block.description.clone(),
                    typ: block_doc_type(&input.block.nesting_mode).to_string(),
                    is_optional: true,
                    is_block: true,
                    constructor_ref: fn_anchor(
                        &format!("{}{}", anchor, input.tf_name),
                        &self.config.names().constructor,
                    ),
                }),
        );
        params.sort_by(|a, b| {
            a.is_optional
                .cmp(&b.is_optional)
                .then_with(|| a.name.cmp(&b.name))
        });
        params
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::docstring::HandlebarsDocs;
    use crate::emit;
    use crate::test_utils::{call_function, compose, load_fixture_block, load_fixture_provider, Value};
    use serde_json::json;

    fn config() -> GeneratorConfig {
        GeneratorConfig::new("test".to_string())
    }

    fn field_names(node: &Node) -> Vec<&str> {
        node.fields().iter().map(Node::name).collect()
    }

    fn has_mutator(node: &Node) -> bool {
        node.fields().iter().any(|f| f.name().starts_with("with"))
    }

    #[test]
    fn test_resource_root_fields() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block = load_fixture_block("resource", "test_resource_a");
        let doc = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_resource_a", &block)
            .unwrap();

        assert_eq!(doc.locals.len(), 2);
        let names = field_names(&doc.root);
        assert_eq!(names[0], "#");
        assert_eq!(&names[1..5], &["#new", "new", "#newAttrs", "newAttrs"]);
        assert!(doc.root.fields().iter().skip(1).all(Node::is_hidden));

        // scalars only get the bare mutator
        assert!(names.contains(&"withName"));
        assert!(!names.contains(&"withNameMixin"));
        assert!(names.contains(&"withLocal"));
        assert!(names.contains(&"withTagsMixin"));
        assert!(names.contains(&"withUsersMixin"));
        assert!(names.contains(&"withRuleAttrMixin"));
        // blocks get both mutators and a child object
        assert!(names.contains(&"withRule"));
        assert!(names.contains(&"withRuleMixin"));
        assert!(names.contains(&"rule"));
        assert!(names.contains(&"timeouts"));
        // read only fields are not inputs
        assert!(!names.contains(&"withId"));
        assert!(!names.contains(&"withStatus"));
    }

    #[test]
    fn test_doc_field_precedes_function() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block = load_fixture_block("resource", "test_resource_a");
        let doc = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_resource_a", &block)
            .unwrap();
        let names = field_names(&doc.root);
        for (i, name) in names.iter().enumerate() {
            if name.starts_with("with") {
                assert_eq!(names[i - 1], format!("#{}", name));
            }
        }
    }

    #[test]
    fn test_three_level_nesting() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block = load_fixture_block("resource", "test_resource_a");
        let doc = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_resource_a", &block)
            .unwrap();

        let rule = doc.root.field("rule").unwrap();
        assert!(rule.is_hidden());
        assert_eq!(field_names(rule), vec!["condition", "#new", "new"]);
        assert!(!has_mutator(rule));

        let condition = rule.field("condition").unwrap();
        assert_eq!(field_names(condition), vec!["match", "#new", "new"]);
        assert!(!has_mutator(condition));

        let m = condition.field("match").unwrap();
        assert_eq!(field_names(m), vec!["#new", "new"]);

        let out = call_function(
            &doc.root,
            &["rule", "condition", "match", "new"],
            &[("key", json!("k"))],
        )
        .unwrap();
        assert_eq!(out.to_json(), json!({"key": "k"}));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let config = config().with_max_nesting_depth(2);
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block = load_fixture_block("resource", "test_resource_a");
        let err = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_resource_a", &block)
            .unwrap_err();
        match err {
            Error::NestingTooDeep { path, limit } => {
                assert_eq!(path, "test_resource_a.rule.condition.match");
                assert_eq!(limit, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_generated_library_composes() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block = load_fixture_block("resource", "test_resource_a");
        let doc = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_resource_a", &block)
            .unwrap();
        let lib = &doc.root;

        let rule = call_function(lib, &["rule", "new"], &[("priority", json!(1))]).unwrap();
        let base = call_function(
            lib,
            &["new"],
            &[
                ("resourceLabel", json!("foo")),
                ("name", json!("n")),
                ("rule", json!([rule.to_json()])),
            ],
        )
        .unwrap();
        let rule2 = call_function(lib, &["rule", "new"], &[("priority", json!(2))]).unwrap();
        let patch = call_function(
            lib,
            &["withRuleMixin"],
            &[("resourceLabel", json!("foo")), ("value", rule2.to_json())],
        )
        .unwrap();
        let out = compose(compose(Value::from_json(&json!({})), base), patch);
        assert_eq!(
            out.to_json(),
            json!({"resource": {"test_resource_a": {"foo": {
                "name": "n",
                "rule": [{"priority": 1}, {"priority": 2}]
            }}}})
        );
    }

    #[test]
    fn test_data_source() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block = load_fixture_block("data", "test_data_source_a");
        let doc = gen
            .render_resource_or_data_source(BlockKind::DataSource, "test_data_source_a", &block)
            .unwrap();
        let out = call_function(
            &doc.root,
            &["withName"],
            &[("dataSrcLabel", json!("x")), ("value", json!("y"))],
        )
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"data": {"test_data_source_a": {"x": {"name": "y"}}}})
        );
    }

    #[test]
    fn test_provider() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let schema = load_fixture_provider();
        let doc = gen.render_provider(&schema.provider.block).unwrap();
        let names = field_names(&doc.root);
        assert_eq!(names, vec!["#", "#new", "new", "#newAttrs", "newAttrs", "retry"]);
        assert!(!has_mutator(&doc.root));
    }

    #[test]
    fn test_rejects_other_root_kinds() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let err = gen
            .render_resource_or_data_source(BlockKind::Provider, "test", &Block::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedBlockKind { .. }));
    }

    #[test]
    fn test_unknown_nesting_mode() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block: Block = serde_json::from_value(json!({
            "block_types": {"odd": {"nesting_mode": "tuple", "block": {}}}
        }))
        .unwrap();
        let err = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_x", &block)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedNestingMode(ref m) if m == "tuple"));
    }

    #[test]
    fn test_unknown_nesting_mode_below_root() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block: Block = serde_json::from_value(json!({
            "block_types": {"outer": {"nesting_mode": "list", "block": {
                "block_types": {"odd": {"nesting_mode": "tuple", "block": {}}}
            }}}
        }))
        .unwrap();
        let err = gen
            .render_resource_or_data_source(BlockKind::Resource, "test_x", &block)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedNestingMode(ref m) if m == "tuple"));
    }

    #[test]
    fn test_provider_unknown_nesting_mode() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let gen = Generator::new(&config, &docs);
        let block: Block = serde_json::from_value(json!({
            "block_types": {"odd": {"nesting_mode": "tuple", "block": {}}}
        }))
        .unwrap();
        let err = gen.render_provider(&block).unwrap_err();
        assert!(matches!(err, Error::UnsupportedNestingMode(ref m) if m == "tuple"));
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let config = config();
        let docs = HandlebarsDocs::new().unwrap();
        let block = load_fixture_block("resource", "test_resource_a");
        let render = || {
            let gen = Generator::new(&config, &docs);
            let doc = gen
                .render_resource_or_data_source(BlockKind::Resource, "test_resource_a", &block)
                .unwrap();
            emit::to_string(&doc).unwrap()
        };
        assert_eq!(render(), render());
    }
}
