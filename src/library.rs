//! Rendering of a complete provider library to disk.

use crate::config::{GeneratorConfig, LibraryEntry};
use crate::docstring::DocRenderer;
use crate::document::Document;
use crate::emit;
use crate::error::{Error, Result};
use crate::fetch::{fetch_batches, get_schemas, ProviderAddr, SchemaRequest};
use crate::index::{
    render_data_index, render_index, render_main_index, DATA_DIR, GEN_DIR, MAIN_FILE,
    RESOURCES_DIR,
};
use crate::naming::{
    data_source_libsonnet_name, provider_libsonnet_name, resource_libsonnet_name, BlockKind,
};
use crate::render::Generator;
use crate::schema::{ProviderSchema, SchemaItem};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A rendered file, relative to the library root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl RenderedFile {
    fn new(path: PathBuf, doc: &Document) -> Result<Self> {
        Ok(Self {
            path,
            contents: emit::to_string(doc)?,
        })
    }
}

fn render_blocks(
    gen: &Generator<'_>,
    kind: BlockKind,
    dir: &Path,
    items: &BTreeMap<String, SchemaItem>,
) -> Result<Vec<RenderedFile>> {
    let provider = gen.config().provider_name();
    let items: Vec<(&String, &SchemaItem)> = items.iter().collect();
    items
        .par_iter()
        .map(|(name, item)| {
            let doc = gen.render_resource_or_data_source(kind, name, &item.block)?;
            let file_name = match kind {
                BlockKind::DataSource => data_source_libsonnet_name(provider, name),
                _ => resource_libsonnet_name(provider, name),
            };
            info!(%kind, name = name.as_str(), "rendered block");
            RenderedFile::new(dir.join(file_name), &doc)
        })
        .collect()
}

/// Renders every file of the library of one provider, without touching the
/// filesystem.
///
/// Files are returned sorted by path. The first block that fails to render
/// aborts the whole library.
pub fn render_library(gen: &Generator<'_>, schema: &ProviderSchema) -> Result<Vec<RenderedFile>> {
    let provider = gen.config().provider_name();
    let gen_dir = PathBuf::from(GEN_DIR);

    let mut files = render_blocks(
        gen,
        BlockKind::Resource,
        &gen_dir.join(RESOURCES_DIR),
        &schema.resource_schemas,
    )?;
    files.extend(render_blocks(
        gen,
        BlockKind::DataSource,
        &gen_dir.join(DATA_DIR),
        &schema.data_source_schemas,
    )?);

    let provider_doc = gen.render_provider(&schema.provider.block)?;
    info!(provider, "rendered provider block");
    files.push(RenderedFile::new(
        gen_dir.join(provider_libsonnet_name(provider)),
        &provider_doc,
    )?);

    let resources: Vec<&str> = schema.resource_schemas.keys().map(String::as_str).collect();
    let data_sources: Vec<&str> = schema
        .data_source_schemas
        .keys()
        .map(String::as_str)
        .collect();
    files.push(RenderedFile::new(
        gen_dir.join(MAIN_FILE),
        &render_index(gen, &resources)?,
    )?);
    files.push(RenderedFile::new(
        gen_dir.join(DATA_DIR).join(MAIN_FILE),
        &render_data_index(gen, &data_sources)?,
    )?);
    files.push(RenderedFile::new(PathBuf::from(MAIN_FILE), &render_main_index())?);

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Writes rendered files under `lib_root`, replacing any previously generated
/// `_gen` directory.
pub fn write_library(lib_root: &Path, files: &[RenderedFile]) -> Result<()> {
    let gen_dir = lib_root.join(GEN_DIR);
    if gen_dir.exists() {
        debug!(path = %gen_dir.display(), "removing previously generated files");
        fs::remove_dir_all(&gen_dir)?;
    }
    for file in files {
        let path = lib_root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "writing");
        fs::write(&path, &file.contents)?;
    }
    Ok(())
}

/// Renders the library of one provider into `lib_root`.
pub fn generate_library(
    config: &GeneratorConfig,
    docs: &dyn DocRenderer,
    lib_root: &Path,
    schema: &ProviderSchema,
) -> Result<()> {
    let gen = Generator::new(config, docs);
    let files = render_library(&gen, schema)?;
    info!(
        provider = config.provider_name(),
        path = %lib_root.display(),
        files = files.len(),
        "writing library"
    );
    write_library(lib_root, &files)
}

/// Fetches the schemas of every entry and renders each library into
/// `<out_dir>/<repo>/<subdir>`.
///
/// Providers are downloaded with one terraform run per group of requests
/// whose local names do not clash, so several versions of one provider can be
/// rendered side by side.
pub fn generate_libraries(
    terraform: &Path,
    docs: &dyn DocRenderer,
    out_dir: &Path,
    entries: &[LibraryEntry],
) -> Result<()> {
    let requests = entries
        .iter()
        .map(|e| SchemaRequest::new(&e.provider.src, &e.provider.version))
        .collect::<Result<Vec<_>>>()?;

    let mut schemas: BTreeMap<(ProviderAddr, String), ProviderSchema> = BTreeMap::new();
    for batch in fetch_batches(&requests) {
        for (addr, schema) in get_schemas(terraform, &batch)? {
            let version = batch
                .iter()
                .find(|r| r.addr == addr)
                .map(|r| r.version.clone())
                .unwrap_or_default();
            schemas.insert((addr, version), schema);
        }
    }

    for (entry, req) in entries.iter().zip(&requests) {
        let lib_root = out_dir.join(&entry.repo).join(&entry.subdir);
        info!(
            provider = %req.addr,
            version = req.version.as_str(),
            path = %lib_root.display(),
            "rendering library"
        );
        let config = GeneratorConfig::new(req.name.clone());
        let schema = schemas
            .get(&(req.addr.clone(), req.version.clone()))
            .ok_or_else(|| Error::MissingProviderSchema(req.addr.to_string()))?;
        generate_library(&config, docs, &lib_root, schema)?;
    }
    Ok(())
}
