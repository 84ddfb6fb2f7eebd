//! Naming conventions and schema classification shared by the renderers.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block, NestedBlock, NestingMode};
use convert_case::{Case, Casing};
use std::collections::BTreeMap;
use std::fmt;

/// Field that Terraform injects into every block and that is never an input.
pub const ID_ATTRIBUTE: &str = "id";

/// How values of a field combine when a mixin is merged into a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    ListOrSet,
    Map,
    Scalar,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CollectionKind::ListOrSet => "IsListOrSet",
            CollectionKind::Map => "IsMap",
            CollectionKind::Scalar => "IsNotCollection",
        })
    }
}

/// The kind of schema block being rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Provider,
    Resource,
    DataSource,
    NestedBlock,
}

struct BlockKindInfo {
    description: &'static str,
    label_arg: Option<&'static str>,
    inject_attr_name: Option<&'static str>,
    core_fn: Option<&'static str>,
}

// Indexed by `BlockKind` discriminant.
const BLOCK_KINDS: [BlockKindInfo; 4] = [
    BlockKindInfo {
        description: "provider",
        label_arg: None,
        inject_attr_name: None,
        core_fn: Some("tf.withProvider"),
    },
    BlockKindInfo {
        description: "resource",
        label_arg: Some("resourceLabel"),
        inject_attr_name: Some("resource"),
        core_fn: Some("tf.withResource"),
    },
    BlockKindInfo {
        description: "data source",
        label_arg: Some("dataSrcLabel"),
        inject_attr_name: Some("data"),
        core_fn: Some("tf.withData"),
    },
    BlockKindInfo {
        description: "sub block",
        label_arg: None,
        inject_attr_name: None,
        core_fn: None,
    },
];

impl BlockKind {
    fn info(self) -> &'static BlockKindInfo {
        &BLOCK_KINDS[self as usize]
    }

    /// Name of the parameter identifying an instance (e.g. `resourceLabel`).
    pub fn label_arg(self) -> Option<&'static str> {
        self.info().label_arg
    }

    /// Root document field instances are injected under (`resource` or `data`).
    pub fn inject_attr_name(self) -> Option<&'static str> {
        self.info().inject_attr_name
    }

    /// Core library function that injects an instance into the root document.
    pub fn core_fn(self) -> Option<&'static str> {
        self.info().core_fn
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().description)
    }
}

/// An input attribute keyed by its sanitized identifier.
#[derive(Clone, Copy, Debug)]
pub struct InputAttribute<'a> {
    pub tf_name: &'a str,
    pub attr: &'a Attribute,
}

/// A nested block keyed by its sanitized identifier.
#[derive(Clone, Copy, Debug)]
pub struct InputBlock<'a> {
    pub tf_name: &'a str,
    pub block: &'a NestedBlock,
}

/// Attributes that can be set by a caller, keyed by sanitized identifier.
///
/// Skips the `id` field and read-only (computed and not optional) attributes.
pub fn eligible_attributes<'a>(
    config: &GeneratorConfig,
    block: &'a Block,
) -> BTreeMap<String, InputAttribute<'a>> {
    block
        .attributes
        .iter()
        .filter(|(name, attr)| name.as_str() != ID_ATTRIBUTE && !(attr.computed && !attr.optional))
        .map(|(name, attr)| {
            (
                sanitize_identifier(config, name),
                InputAttribute {
                    tf_name: name.as_str(),
                    attr,
                },
            )
        })
        .collect()
}

pub fn nested_blocks<'a>(
    config: &GeneratorConfig,
    block: &'a Block,
) -> BTreeMap<String, InputBlock<'a>> {
    block
        .nested_blocks
        .iter()
        .map(|(name, nested)| {
            (
                sanitize_identifier(config, name),
                InputBlock {
                    tf_name: name.as_str(),
                    block: nested,
                },
            )
        })
        .collect()
}

pub fn classify_collection(nesting_mode: &NestingMode) -> Result<CollectionKind> {
    match nesting_mode {
        NestingMode::List | NestingMode::Set => Ok(CollectionKind::ListOrSet),
        NestingMode::Map | NestingMode::Single | NestingMode::Group => Ok(CollectionKind::Map),
        NestingMode::Unknown(mode) => Err(Error::UnsupportedNestingMode(mode.clone())),
    }
}

/// Collection kind of a plain attribute, used to decide whether it gets a mixin.
pub fn attribute_collection_kind(attr: &Attribute) -> Result<CollectionKind> {
    if let Some(nested) = &attr.nested_type {
        return classify_collection(&nested.nesting_mode);
    }
    Ok(match attr.r#type.kind() {
        Some("list") | Some("set") => CollectionKind::ListOrSet,
        Some("map") | Some("object") => CollectionKind::Map,
        _ => CollectionKind::Scalar,
    })
}

/// Appends `_` to names that collide with a reserved word.
pub fn sanitize_identifier(config: &GeneratorConfig, name: &str) -> String {
    if config.is_reserved(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Strips the `<provider>_` prefix from a resource or data source type.
pub fn name_without_provider<'a>(provider: &str, name: &'a str) -> &'a str {
    if provider.is_empty() {
        return name;
    }
    name.strip_prefix(provider)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(name)
}

pub fn provider_libsonnet_name(provider: &str) -> String {
    format!("provider_{}.libsonnet", provider)
}

pub fn resource_libsonnet_name(provider: &str, name: &str) -> String {
    format!("resource_{}.libsonnet", name_without_provider(provider, name))
}

pub fn data_source_libsonnet_name(provider: &str, name: &str) -> String {
    format!("data_{}.libsonnet", name_without_provider(provider, name))
}

/// `with<Field>` or `with<Field>Mixin`.
pub fn with_fn_name(config: &GeneratorConfig, field: &str, is_mixin: bool) -> String {
    let names = config.names();
    let mut fn_name = format!("{}{}", names.mutator_prefix, field.to_case(Case::Pascal));
    if is_mixin {
        fn_name.push_str(&names.mixin_suffix);
    }
    fn_name
}

/// Short type label shown in the generated docs.
pub fn attribute_doc_type(attr: &Attribute) -> &'static str {
    if let Some(nested) = &attr.nested_type {
        return block_doc_type(&nested.nesting_mode);
    }
    match attr.r#type.kind() {
        Some("object") | Some("map") => "obj",
        Some("list") | Some("set") | Some("tuple") => "list",
        Some("number") => "number",
        Some("string") => "string",
        Some("bool") => "bool",
        _ => "any",
    }
}

pub fn block_doc_type(nesting_mode: &NestingMode) -> &'static str {
    match nesting_mode {
        NestingMode::List | NestingMode::Set => "list[obj]",
        NestingMode::Map => "map[str, obj]",
        _ => "obj",
    }
}

/// Last segment of a provider source address (`hashicorp/aws` is `aws`).
pub fn provider_name_from_addr(addr: &str) -> Result<String> {
    crate::fetch::ProviderAddr::parse(addr).map(|a| a.provider_type)
}
