//! Index documents tying the generated files of a library together.

use crate::docstring::{render, DocTemplate, IndexDoc};
use crate::document::{docsonnet, Document, Node};
use crate::error::{Error, Result};
use crate::naming::{
    data_source_libsonnet_name, name_without_provider, provider_libsonnet_name,
    resource_libsonnet_name,
};
use crate::render::Generator;
use std::collections::BTreeSet;

pub const MAIN_FILE: &str = "main.libsonnet";
pub const GEN_DIR: &str = "_gen";
pub const RESOURCES_DIR: &str = "resources";
pub const DATA_DIR: &str = "data";

/// `_gen/main.libsonnet`: the provider, every resource and the data sources.
///
/// Resources are imported under their type name without the provider prefix,
/// in the order given.
pub fn render_index(gen: &Generator<'_>, resources: &[&str]) -> Result<Document> {
    let config = gen.config();
    let provider = config.provider_name();

    let mut fields = Vec::with_capacity(resources.len() + 3);
    let help = render(
        gen.docs(),
        DocTemplate::Index,
        &IndexDoc {
            provider_name: provider.to_string(),
            provider_doc_url: config.provider_doc_url.clone(),
        },
    )?;
    fields.push(docsonnet::pkg(provider, "", help));
    fields.push(Node::import(
        "provider",
        format!("./{}", provider_libsonnet_name(provider)),
    ));
    let mut taken: BTreeSet<&str> = ["#", "provider", "data"].iter().copied().collect();
    for resource in resources {
        let field = name_without_provider(provider, resource);
        if !taken.insert(field) {
            return Err(Error::IndexFieldCollision {
                type_name: resource.to_string(),
                field: field.to_string(),
            });
        }
        fields.push(Node::import(
            field,
            format!(
                "./{}/{}",
                RESOURCES_DIR,
                resource_libsonnet_name(provider, resource)
            ),
        ));
    }
    fields.push(Node::import(
        "data",
        format!("./{}/{}", DATA_DIR, MAIN_FILE),
    ));

    Ok(Document::new(
        vec![Node::local(Node::import(
            "d",
            config.docsonnet_import.as_str(),
        ))],
        Node::object("", fields),
    ))
}

/// `_gen/data/main.libsonnet`: one import per data source.
pub fn render_data_index(gen: &Generator<'_>, data_sources: &[&str]) -> Result<Document> {
    let config = gen.config();
    let provider = config.provider_name();

    let mut fields = vec![docsonnet::pkg("data", "", String::new())];
    let mut taken: BTreeSet<&str> = ["#"].iter().copied().collect();
    for name in data_sources {
        let field = name_without_provider(provider, name);
        if !taken.insert(field) {
            return Err(Error::IndexFieldCollision {
                type_name: name.to_string(),
                field: field.to_string(),
            });
        }
        fields.push(Node::import(
            field,
            format!("./{}", data_source_libsonnet_name(provider, name)),
        ));
    }
    Ok(Document::new(
        vec![Node::local(Node::import(
            "d",
            config.docsonnet_import.as_str(),
        ))],
        Node::object("", fields),
    ))
}

/// The library entrypoint, re-exporting the generated index.
pub fn render_main_index() -> Document {
    Document::new(
        vec![],
        Node::import("", format!("./{}/{}", GEN_DIR, MAIN_FILE)),
    )
}
