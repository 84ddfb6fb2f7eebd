use crate::naming::{BlockKind, CollectionKind};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while generating a libsonnet library.
///
/// Generation errors abort the whole block they occur in: a block is either
/// rendered completely or not at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported nesting mode: {0}")]
    UnsupportedNestingMode(String),

    #[error("mixin function for attribute {field} with collection type {kind} is not supported")]
    UnsupportedMixin { field: String, kind: CollectionKind },

    #[error("{operation} can not be generated for a {kind} block")]
    UnsupportedBlockKind {
        kind: BlockKind,
        operation: &'static str,
    },

    #[error("nested block {path} exceeds the maximum nesting depth of {limit}")]
    NestingTooDeep { path: String, limit: usize },

    #[error("{type_name} is imported as {field}, which is already a field of the index")]
    IndexFieldCollision { type_name: String, field: String },

    #[error("invalid doc template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("error rendering doc string: {0}")]
    TemplateRender(#[from] handlebars::RenderError),

    #[error("invalid provider source address {addr:?}: {reason}")]
    InvalidProviderAddr { addr: String, reason: &'static str },

    #[error("invalid provider request {input:?}: {reason}")]
    InvalidProviderRequest { input: String, reason: &'static str },

    #[error("schema for provider {0} is missing from the terraform output")]
    MissingProviderSchema(String),

    #[error("`terraform {command}` exited with {status}: {stderr}")]
    Terraform {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("error reading {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
