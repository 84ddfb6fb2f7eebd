//! Generators for the `new` and `newAttrs` functions.

use crate::config::GeneratorConfig;
use crate::document::{Comparator, Node};
use crate::error::{Error, Result};
use crate::naming::BlockKind;
use crate::params::ParamList;
use crate::schema::Block;

const PROVIDER_PARAMS: [&str; 3] = ["alias", "src", "version"];

/// Function building the attribute object of a block.
///
/// The object is wrapped in `std.prune` so that fields left to `null` are
/// dropped when the library is evaluated.
pub fn attrs_constructor(
    config: &GeneratorConfig,
    fn_name: &str,
    block: &Block,
    cmp: Comparator,
) -> Node {
    let params = ParamList::new(config, block, cmp);
    Node::large_function(
        fn_name,
        params.params,
        Node::call(
            "",
            "std.prune",
            vec![Node::object("a", params.field_setters)],
        ),
    )
}

/// Primary constructor for a block of the given kind.
///
/// Resources and data sources take the label first and `_meta` last and
/// inject themselves into the root document. Nested blocks only get the
/// attribute constructor.
pub fn constructor(
    config: &GeneratorConfig,
    kind: BlockKind,
    type_name: &str,
    block: &Block,
    cmp: Comparator,
) -> Result<Node> {
    match kind {
        BlockKind::Resource | BlockKind::DataSource => {
            Ok(resource_constructor(config, kind, type_name, block, cmp))
        }
        BlockKind::Provider => Ok(provider_constructor(config, block, cmp)),
        BlockKind::NestedBlock => Ok(attrs_constructor(
            config,
            &config.names().constructor,
            block,
            cmp,
        )),
    }
}

fn attrs_call(config: &GeneratorConfig, forwarding_args: Vec<Node>) -> Node {
    Node::call(
        "attrs",
        format!("self.{}", config.names().attrs_constructor),
        forwarding_args,
    )
}

fn resource_constructor(
    config: &GeneratorConfig,
    kind: BlockKind,
    type_name: &str,
    block: &Block,
    cmp: Comparator,
) -> Node {
    let ParamList {
        params,
        forwarding_args,
        ..
    } = ParamList::new(config, block, cmp);
    let label = kind.label_arg().unwrap_or_default();
    let meta = config.names().meta_param.as_str();

    // Label and meta params are placed after sorting so they stay first and last.
    let mut args = Vec::with_capacity(params.len() + 2);
    args.push(Node::required(Node::string(label, "")));
    args.extend(params);
    args.push(Node::object(meta, vec![]));

    let body = Node::call(
        "",
        kind.core_fn().unwrap_or_default(),
        vec![
            Node::string("type", type_name),
            Node::reference("label", label),
            attrs_call(config, forwarding_args),
            Node::reference(meta, meta),
        ],
    );
    Node::large_function(config.names().constructor.as_str(), args, body)
}

fn provider_constructor(config: &GeneratorConfig, block: &Block, cmp: Comparator) -> Node {
    let ParamList {
        mut params,
        forwarding_args,
        ..
    } = ParamList::new(config, block, cmp);

    let mut call_args = vec![Node::string("name", config.provider_name())];
    for p in PROVIDER_PARAMS.iter() {
        params.push(Node::null(*p));
        call_args.push(Node::reference(*p, *p));
    }
    call_args.push(attrs_call(config, forwarding_args));

    Node::large_function(
        config.names().constructor.as_str(),
        params,
        Node::call(
            "",
            BlockKind::Provider.core_fn().unwrap_or_default(),
            call_args,
        ),
    )
}

/// Rejects kinds that have no constructor of their own.
pub(crate) fn ensure_root_kind(kind: BlockKind, operation: &'static str) -> Result<()> {
    match kind {
        BlockKind::Resource | BlockKind::DataSource => Ok(()),
        _ => Err(Error::UnsupportedBlockKind { kind, operation }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::required_then_name;
    use crate::test_utils::{call_function, load_fixture_block};
    use serde_json::json;

    fn config() -> GeneratorConfig {
        GeneratorConfig::new("test".to_string())
    }

    fn arg_names(func: &Node) -> Vec<String> {
        match func {
            Node::Function { args, .. } => args.iter().map(|a| a.name().to_string()).collect(),
            _ => panic!("not a function"),
        }
    }

    #[test]
    fn test_attrs_constructor_params() {
        let block = load_fixture_block("resource", "test_resource_a");
        let func = attrs_constructor(&config(), "newAttrs", &block, required_then_name);
        assert_eq!(func.name(), "newAttrs");
        assert_eq!(
            arg_names(&func),
            vec![
                "name",
                "description",
                "local_",
                "rule",
                "rule_attr",
                "tags",
                "timeouts",
                "users"
            ]
        );
    }

    #[test]
    fn test_attrs_constructor_prunes_unset_fields() {
        let block = load_fixture_block("resource", "test_resource_a");
        let func = attrs_constructor(&config(), "newAttrs", &block, required_then_name);
        let root = Node::object("", vec![Node::hidden(func)]);

        let out = call_function(&root, &["newAttrs"], &[("name", json!("x"))]).unwrap();
        assert_eq!(out.to_json(), json!({"name": "x"}));

        let out = call_function(
            &root,
            &["newAttrs"],
            &[("name", json!(null)), ("local_", json!("l"))],
        )
        .unwrap();
        assert_eq!(out.to_json(), json!({"local": "l"}));
    }

    #[test]
    fn test_attrs_constructor_all_optional_unset_is_empty() {
        let block = load_fixture_block("data", "test_data_source_b");
        let func = attrs_constructor(&config(), "newAttrs", &block, required_then_name);
        let root = Node::object("", vec![Node::hidden(func)]);
        let out = call_function(&root, &["newAttrs"], &[]).unwrap();
        assert_eq!(out.to_json(), json!({}));
    }

    #[test]
    fn test_resource_constructor() {
        let config = config();
        let block = load_fixture_block("resource", "test_resource_a");
        let func = constructor(
            &config,
            BlockKind::Resource,
            "test_resource_a",
            &block,
            required_then_name,
        )
        .unwrap();
        let names = arg_names(&func);
        assert_eq!(names.first().map(String::as_str), Some("resourceLabel"));
        assert_eq!(names.last().map(String::as_str), Some("_meta"));

        let attrs = attrs_constructor(&config, "newAttrs", &block, required_then_name);
        let root = Node::object("", vec![Node::hidden(func), Node::hidden(attrs)]);
        let out = call_function(
            &root,
            &["new"],
            &[
                ("resourceLabel", json!("foo")),
                ("name", json!("n")),
                ("tags", json!({"a": "b"})),
            ],
        )
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"resource": {"test_resource_a": {"foo": {"name": "n", "tags": {"a": "b"}}}}})
        );
    }

    #[test]
    fn test_data_source_constructor_injects_under_data() {
        let config = config();
        let block = load_fixture_block("data", "test_data_source_b");
        let func = constructor(
            &config,
            BlockKind::DataSource,
            "test_data_source_b",
            &block,
            required_then_name,
        )
        .unwrap();
        assert_eq!(arg_names(&func)[0], "dataSrcLabel");
        let attrs = attrs_constructor(&config, "newAttrs", &block, required_then_name);
        let root = Node::object("", vec![Node::hidden(func), Node::hidden(attrs)]);
        let out = call_function(
            &root,
            &["new"],
            &[
                ("dataSrcLabel", json!("bar")),
                ("_meta", json!({"count": 2})),
            ],
        )
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"data": {"test_data_source_b": {"bar": {"count": 2}}}})
        );
    }

    #[test]
    fn test_provider_constructor() {
        let config = config();
        let schema = crate::test_utils::load_fixture_provider();
        let block = &schema.provider.block;
        let func = constructor(&config, BlockKind::Provider, "test", block, required_then_name)
            .unwrap();
        let names = arg_names(&func);
        assert_eq!(names[0], "api_token");
        assert_eq!(&names[names.len() - 3..], &["alias", "src", "version"]);

        let attrs = attrs_constructor(&config, "newAttrs", block, required_then_name);
        let root = Node::object("", vec![Node::hidden(func), Node::hidden(attrs)]);
        let out = call_function(
            &root,
            &["new"],
            &[
                ("api_token", json!("t")),
                ("src", json!("acme/test")),
                ("version", json!("~> 1.0")),
            ],
        )
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({
                "provider": {"test": [{"api_token": "t"}]},
                "terraform": {"required_providers": {"test": {"source": "acme/test", "version": "~> 1.0"}}}
            })
        );
    }

    #[test]
    fn test_nested_block_constructor_is_attrs_only() {
        let config = config();
        let block = load_fixture_block("resource", "test_resource_a");
        let rule = &block.nested_blocks["rule"].block;
        let func = constructor(
            &config,
            BlockKind::NestedBlock,
            "rule",
            rule,
            required_then_name,
        )
        .unwrap();
        assert_eq!(func.name(), "new");
        assert_eq!(arg_names(&func), vec!["priority", "condition", "description"]);
    }

    #[test]
    fn test_ensure_root_kind() {
        assert!(ensure_root_kind(BlockKind::Resource, "x").is_ok());
        assert!(matches!(
            ensure_root_kind(BlockKind::NestedBlock, "x"),
            Err(Error::UnsupportedBlockKind { .. })
        ));
    }
}
