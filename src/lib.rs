//! This crate generates Jsonnet libraries from schemas exported by Terraform providers.
//!
//! ## Quick Start
//!
//! A Terraform schema is required for generating a library. It can either be exported from
//! Terraform or written by hand. We'll take the latter approach, defining a reference schema
//! with just one resource type having one attribute:
//!
//! ```json
//!{
//!    "provider_schemas": {
//!        "registry.terraform.io/acme/test": {
//!            "resource_schemas": {
//!                "test_user": {
//!                    "version": 0,
//!                    "block": {
//!                        "attributes": {
//!                            "name": {
//!                                "type": "string",
//!                                "description": "The user name.",
//!                                "required": true
//!                            }
//!                        }
//!                    }
//!                }
//!            }
//!        }
//!    },
//!    "format_version": "1.0"
//!}
//! ```
//!
//! In addition to a Rust library, this crate provides a binary tool `tflibgen`.
//! The following command renders the library of every provider found in the schema to a
//! subdirectory of `./out` named after the provider:
//!
//! ```bash
//! cargo run --bin tflibgen -- gen --schema test.json --out ./out
//! ```
//!
//! The generated `./out/test/_gen/resources/resource_user.libsonnet` exposes a constructor
//! and a mutator per attribute:
//!
//! ```jsonnet
//! local test = import './out/test/main.libsonnet';
//!
//! test.user.new('admin', name='root')
//! + test.user.withName('admin', 'toor')
//! ```
//!
//! which evaluates to the Terraform JSON configuration:
//!
//! ```json
//! {"resource": {"test_user": {"admin": {"name": "toor"}}}}
//! ```
//!
//! The same can be done from Rust:
//!
//! ```no_run
//! use tflibgen::config::GeneratorConfig;
//! use tflibgen::docstring::HandlebarsDocs;
//! use tflibgen::library::generate_library;
//! use tflibgen::schema::read_tf_schema_from_file;
//! use std::path::Path;
//!
//! fn main() -> tflibgen::Result<()> {
//!     let export = read_tf_schema_from_file("test.json")?;
//!     let schema = &export.provider_schemas["registry.terraform.io/acme/test"];
//!     let config = GeneratorConfig::new("test".to_string());
//!     let docs = HandlebarsDocs::new()?;
//!     generate_library(&config, &docs, Path::new("./out/test"), schema)
//! }
//! ```
//!
//! ## Consuming third-party Terraform providers
//!
//! `tflibgen` can also retrieve the schema itself using a `terraform` binary found on the `PATH`
//! (or given with `--terraform`). Providers are passed as `src` and `version` pairs:
//!
//! ```bash
//! cargo run --bin tflibgen -- gen --provider 'src=aws&version=~>4.0' --out ./out
//! ```
//!
//! Several libraries can be listed in a config file:
//!
//! ```json
//! [
//!   {"repo": "aws", "provider": {"src": "hashicorp/aws", "version": "~> 4.0"}},
//!   {"repo": "aws", "subdir": "3.x", "provider": {"src": "hashicorp/aws", "version": "~> 3.0"}}
//! ]
//! ```
//!
//! ```bash
//! cargo run --bin tflibgen -- gen --config libraries.json --out ./out
//! ```
//!
//! The raw schema can be saved with the `getschema` command:
//!
//! ```bash
//! cargo run --bin tflibgen -- getschema --provider 'src=aws&version=4.46.0' --out aws.json
//! ```
//!
//! Generated libraries import the [tf-libsonnet core](https://github.com/tf-libsonnet/core)
//! library and [docsonnet](https://github.com/jsonnet-libs/docsonnet), which must be available
//! on the Jsonnet search path (e.g. through jsonnet-bundler).
//!

// errors raised by generation and fetching
pub mod error;

// terraform schema model
pub mod schema;

// generator and library configuration
pub mod config;

pub mod naming;

// document model and its generators
pub mod constructor;
pub mod document;
pub mod mutator;
pub mod params;

pub mod docstring;

// block and index renderers
pub mod index;
pub mod render;

// jsonnet writer
pub mod emit;

pub mod fetch;
pub mod library;

pub use error::{Error, Result};

/// Utility functions to help testing code generators.
#[doc(hidden)]
pub mod test_utils;
