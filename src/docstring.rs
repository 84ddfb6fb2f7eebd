//! Help text attached to the generated functions as docsonnet annotations.

use crate::error::Result;
use crate::naming::BlockKind;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

/// The help texts a library needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocTemplate {
    Package,
    Constructor,
    AttrsConstructor,
    NestedConstructor,
    Mutator,
    Provider,
    ProviderConstructor,
    ProviderAttrsConstructor,
    Index,
}

const TEMPLATES: [(DocTemplate, &str, &str); 9] = [
    (
        DocTemplate::Package,
        "package",
        include_str!("templates/package.md.hbs"),
    ),
    (
        DocTemplate::Constructor,
        "constructor",
        include_str!("templates/constructor.md.hbs"),
    ),
    (
        DocTemplate::AttrsConstructor,
        "attrs_constructor",
        include_str!("templates/attrs_constructor.md.hbs"),
    ),
    (
        DocTemplate::NestedConstructor,
        "nested_constructor",
        include_str!("templates/nested_constructor.md.hbs"),
    ),
    (
        DocTemplate::Mutator,
        "mutator",
        include_str!("templates/mutator.md.hbs"),
    ),
    (
        DocTemplate::Provider,
        "provider",
        include_str!("templates/provider.md.hbs"),
    ),
    (
        DocTemplate::ProviderConstructor,
        "provider_constructor",
        include_str!("templates/provider_constructor.md.hbs"),
    ),
    (
        DocTemplate::ProviderAttrsConstructor,
        "provider_attrs_constructor",
        include_str!("templates/provider_attrs_constructor.md.hbs"),
    ),
    (
        DocTemplate::Index,
        "index",
        include_str!("templates/index.md.hbs"),
    ),
];

impl DocTemplate {
    pub fn name(self) -> &'static str {
        TEMPLATES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map(|(_, name, _)| *name)
            .unwrap_or_default()
    }
}

/// Renders help text from structured parameters.
///
/// Implementations must be shareable across threads since blocks may be
/// rendered in parallel.
pub trait DocRenderer: Sync {
    fn render_doc(&self, template: DocTemplate, params: &Value) -> Result<String>;
}

/// Doc renderer backed by the built-in Handlebars templates.
pub struct HandlebarsDocs {
    registry: Handlebars<'static>,
}

impl HandlebarsDocs {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        for (_, name, source) in TEMPLATES.iter() {
            registry
                .register_template_string(name, *source)
                .map_err(Box::new)?;
        }
        Ok(Self { registry })
    }

    /// Replaces the built-in template for `template`.
    pub fn with_template(mut self, template: DocTemplate, source: &str) -> Result<Self> {
        self.registry
            .register_template_string(template.name(), source)
            .map_err(Box::new)?;
        Ok(self)
    }
}

impl DocRenderer for HandlebarsDocs {
    fn render_doc(&self, template: DocTemplate, params: &Value) -> Result<String> {
        Ok(self.registry.render(template.name(), params)?)
    }
}

/// Markdown link to the tf-libsonnet core function used by `kind`.
pub fn core_fn_ref(kind: BlockKind) -> String {
    match kind.core_fn() {
        Some(f) => {
            let anchor = f.trim_start_matches("tf.").to_lowercase();
            format!(
                "[{}](https://github.com/tf-libsonnet/core/tree/main/docs#fn-{})",
                f, anchor
            )
        }
        None => String::new(),
    }
}

/// Anchor of a function in the generated markdown docs.
pub fn fn_anchor(prefix: &str, fn_name: &str) -> String {
    format!("#fn-{}{}", prefix.to_lowercase(), fn_name.to_lowercase())
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct ParamDoc {
    pub name: String,
    pub tf_name: String,
    pub description: String,
    pub typ: String,
    pub is_optional: bool,
    pub is_block: bool,
    /// Only set on blocks.
    pub constructor_ref: String,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct ConstructorDoc {
    pub provider_name: String,
    pub type_name: String,
    pub resource_or_data_source: String,
    pub label_param: String,
    pub core_fn: String,
    pub fn_name: String,
    pub fn_prefix: String,
    pub constructor_name: String,
    pub constructor_ref: String,
    pub attrs_fn_name: String,
    pub meta_param: String,
    pub params: Vec<ParamDoc>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct MutatorDoc {
    pub type_name: String,
    pub field_name: String,
    pub typ: String,
    pub fn_prefix: String,
    pub fn_name: String,
    pub bare_fn_name: String,
    pub bare_fn_anchor: String,
    pub mixin_fn_name: String,
    pub mixin_fn_anchor: String,
    pub resource_or_data_source: String,
    pub label_param: String,
    pub is_array: bool,
    pub is_map: bool,
    pub is_mixin: bool,
    pub has_mixin: bool,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct PackageDoc {
    pub provider_name: String,
    pub type_name: String,
    pub fn_prefix: String,
    pub resource_or_data_source: String,
    pub description: String,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct IndexDoc {
    pub provider_name: String,
    pub provider_doc_url: String,
}

/// Renders `template` with `data` serialized as the template context.
pub fn render<T: Serialize>(
    docs: &dyn DocRenderer,
    template: DocTemplate,
    data: &T,
) -> Result<String> {
    let params = serde_json::to_value(data)?;
    docs.render_doc(template, &params)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_builtin_templates_register() {
        assert!(HandlebarsDocs::new().is_ok());
    }

    #[test]
    fn test_render_index() {
        let docs = HandlebarsDocs::new().unwrap();
        let out = render(
            &docs,
            DocTemplate::Index,
            &IndexDoc {
                provider_name: "aws".to_string(),
                provider_doc_url: String::new(),
            },
        )
        .unwrap();
        assert!(out.starts_with("`aws` is a library"));
        assert!(!out.contains("documentation is available"));
    }

    #[test]
    fn test_render_mutator_does_not_escape() {
        let docs = HandlebarsDocs::new().unwrap();
        let out = render(
            &docs,
            DocTemplate::Mutator,
            &MutatorDoc {
                type_name: "test_resource_a".to_string(),
                field_name: "tags".to_string(),
                typ: "map[str, obj]".to_string(),
                fn_prefix: "test.resource_a".to_string(),
                fn_name: "withTagsMixin".to_string(),
                bare_fn_name: "withTags".to_string(),
                is_map: true,
                is_mixin: true,
                label_param: "resourceLabel".to_string(),
                resource_or_data_source: "resource".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(out.contains("`value` (`map[str, obj]`)"));
        assert!(out.contains("merge the passed in value"));
        assert!(out.contains("[test.resource_a.withTags]"));
    }

    #[test]
    fn test_render_constructor_params() {
        let docs = HandlebarsDocs::new().unwrap();
        let out = render(
            &docs,
            DocTemplate::Constructor,
            &ConstructorDoc {
                type_name: "test_resource_a".to_string(),
                fn_name: "new".to_string(),
                fn_prefix: "test.resource_a".to_string(),
                label_param: "resourceLabel".to_string(),
                params: vec![ParamDoc {
                    name: "local_".to_string(),
                    tf_name: "local".to_string(),
                    typ: "string".to_string(),
                    is_optional: true,
                    ..Default::default()
                }],
                ..Default::default()
            },
        )
        .unwrap();
        assert!(out.contains("`resourceLabel` (`string`)"));
        assert!(out.contains("`local_` (`string`): Set the `local` field"));
        assert!(out.contains("When `null`, the `local` field will be omitted"));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let docs = HandlebarsDocs::new().unwrap();
        let err = docs
            .render_doc(DocTemplate::Index, &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateRender(_)));
    }

    #[test]
    fn test_invalid_template_override() {
        let err = HandlebarsDocs::new()
            .unwrap()
            .with_template(DocTemplate::Index, "{{#if}}")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_core_fn_ref() {
        assert_eq!(
            core_fn_ref(BlockKind::DataSource),
            "[tf.withData](https://github.com/tf-libsonnet/core/tree/main/docs#fn-withdata)"
        );
        assert_eq!(core_fn_ref(BlockKind::NestedBlock), "");
    }

    #[test]
    fn test_template_names() {
        assert_eq!(DocTemplate::Package.name(), "package");
        assert_eq!(DocTemplate::Index.name(), "index");
    }
}
