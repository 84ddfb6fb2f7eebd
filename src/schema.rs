//! In-memory model of the JSON document printed by `terraform providers schema -json`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TerraformSchemaExport {
    #[serde(default)]
    pub provider_schemas: BTreeMap<String, ProviderSchema>,
    #[serde(default)]
    pub format_version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProviderSchema {
    #[serde(default)]
    pub provider: SchemaItem,
    #[serde(default)]
    pub resource_schemas: BTreeMap<String, SchemaItem>,
    #[serde(default)]
    pub data_source_schemas: BTreeMap<String, SchemaItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SchemaItem {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub block: Block,
}

/// The attributes and nested blocks of one resource, data source, provider or
/// nested block.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Block {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_kind: Option<StringKind>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default, rename = "block_types", alias = "nested_blocks")]
    pub nested_blocks: BTreeMap<String, NestedBlock>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StringKind {
    Plain,
    Markdown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    #[serde(default, rename = "type")]
    pub r#type: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_type: Option<NestedAttributeType>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_kind: Option<StringKind>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub deprecated: bool,
}

/// Attribute whose value is a typed object (or a collection of them), as
/// introduced by protocol version 6 providers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NestedAttributeType {
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    pub nesting_mode: NestingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

impl NestedAttributeType {
    /// The nested attributes viewed as a block without nested blocks.
    pub fn as_block(&self) -> Block {
        Block {
            attributes: self.attributes.clone(),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NestedBlock {
    pub nesting_mode: NestingMode,
    #[serde(default)]
    pub block: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

/// How a nested block (or nested attribute type) repeats inside its parent.
///
/// Unknown modes are kept verbatim so that they can be reported when the block
/// is classified instead of failing the whole schema parse.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum NestingMode {
    Single,
    Group,
    List,
    Set,
    Map,
    Unknown(String),
}

impl From<String> for NestingMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "single" => NestingMode::Single,
            "group" => NestingMode::Group,
            "list" => NestingMode::List,
            "set" => NestingMode::Set,
            "map" => NestingMode::Map,
            _ => NestingMode::Unknown(mode),
        }
    }
}

impl From<NestingMode> for String {
    fn from(mode: NestingMode) -> Self {
        mode.as_str().to_owned()
    }
}

impl NestingMode {
    pub fn as_str(&self) -> &str {
        match self {
            NestingMode::Single => "single",
            NestingMode::Group => "group",
            NestingMode::List => "list",
            NestingMode::Set => "set",
            NestingMode::Map => "map",
            NestingMode::Unknown(mode) => mode,
        }
    }
}

impl std::fmt::Display for NestingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw cty type of an attribute, e.g. `"string"` or `["map", "string"]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AttributeType(pub Value);

impl AttributeType {
    /// Name of the outermost type constructor (`string`, `list`, `object`, ...).
    pub fn kind(&self) -> Option<&str> {
        match &self.0 {
            Value::String(t) => Some(t.as_str()),
            Value::Array(t) => t.first().and_then(Value::as_str),
            _ => None,
        }
    }
}

pub fn read_tf_schema_from_file<P: AsRef<Path>>(path: P) -> Result<TerraformSchemaExport> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

pub fn read_tf_schema_from_str(contents: &str) -> Result<TerraformSchemaExport> {
    Ok(serde_json::from_str(contents)?)
}
