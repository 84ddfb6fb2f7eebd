// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Words that can not be used as bare identifiers in Jsonnet.
pub const JSONNET_RESERVED_WORDS: [&str; 17] = [
    "assert",
    "else",
    "error",
    "false",
    "for",
    "function",
    "if",
    "import",
    "importstr",
    "in",
    "local",
    "null",
    "tailstrict",
    "then",
    "self",
    "super",
    "true",
];

pub const CORE_LIBRARY_PATH: &str = "github.com/tf-libsonnet/core/main.libsonnet";
pub const DOCSONNET_LIBRARY_PATH: &str = "github.com/jsonnet-libs/docsonnet/doc-util/main.libsonnet";

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Names of the generated functions. Consumers of a generated library depend on
/// these, so changing them is a breaking change for the library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionNames {
    pub constructor: String,
    pub attrs_constructor: String,
    pub mutator_prefix: String,
    pub mixin_suffix: String,
    pub meta_param: String,
}

impl Default for FunctionNames {
    fn default() -> Self {
        Self {
            constructor: "new".to_string(),
            attrs_constructor: "newAttrs".to_string(),
            mutator_prefix: "with".to_string(),
            mixin_suffix: "Mixin".to_string(),
            meta_param: "_meta".to_string(),
        }
    }
}

/// Code generation options shared by every block of a provider library.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub(crate) provider_name: String,
    pub(crate) reserved_words: Vec<String>,
    pub(crate) names: FunctionNames,
    pub(crate) core_import: String,
    pub(crate) docsonnet_import: String,
    pub(crate) provider_doc_url: String,
    pub(crate) max_nesting_depth: usize,
}

impl GeneratorConfig {
    /// Default config for the given provider name (e.g. `aws`).
    pub fn new(provider_name: String) -> Self {
        Self {
            provider_name,
            reserved_words: JSONNET_RESERVED_WORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            names: FunctionNames::default(),
            core_import: CORE_LIBRARY_PATH.to_string(),
            docsonnet_import: DOCSONNET_LIBRARY_PATH.to_string(),
            provider_doc_url: String::new(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    /// Identifiers that get an underscore suffix when used as parameter names.
    pub fn with_reserved_words(mut self, reserved_words: Vec<String>) -> Self {
        self.reserved_words = reserved_words;
        self
    }

    pub fn with_function_names(mut self, names: FunctionNames) -> Self {
        self.names = names;
        self
    }

    /// Import paths of the tf-libsonnet core library and of docsonnet.
    pub fn with_imports(mut self, core_import: String, docsonnet_import: String) -> Self {
        self.core_import = core_import;
        self.docsonnet_import = docsonnet_import;
        self
    }

    /// Link to the upstream provider documentation, shown in the index docs.
    pub fn with_provider_doc_url(mut self, url: String) -> Self {
        self.provider_doc_url = url;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn names(&self) -> &FunctionNames {
        &self.names
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_words.iter().any(|w| w == name)
    }
}

/// One library to render, as listed in a library config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    /// Subdirectory of the output directory the library is rendered to.
    pub repo: String,
    #[serde(default)]
    pub subdir: String,
    pub provider: ProviderEntry,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderEntry {
    pub src: String,
    pub version: String,
}

/// The list of libraries the `gen` command renders in one run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct LibraryConfig {
    pub entries: Vec<LibraryEntry>,
}

impl LibraryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_owned(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::new("test".to_string());
        assert_eq!(config.provider_name(), "test");
        assert!(config.is_reserved("local"));
        assert!(config.is_reserved("tailstrict"));
        assert!(!config.is_reserved("name"));
        assert_eq!(config.names().constructor, "new");
        assert_eq!(config.names().attrs_constructor, "newAttrs");
    }

    #[test]
    fn test_custom_reserved_words() {
        let config =
            GeneratorConfig::new("test".to_string()).with_reserved_words(vec!["name".to_string()]);
        assert!(config.is_reserved("name"));
        assert!(!config.is_reserved("local"));
    }

    #[test]
    fn test_library_config_from_file() {
        let config = LibraryConfig::from_file("./tests/fixtures/libraries.json").unwrap();
        assert_eq!(config.entries.len(), 2);
        assert_eq!(config.entries[0].repo, "aws");
        assert_eq!(config.entries[0].subdir, "");
        assert_eq!(config.entries[0].provider.src, "aws");
        assert_eq!(config.entries[1].subdir, "4.x");
        assert_eq!(config.entries[1].provider.version, "~> 4.0");
    }
}
