//! # Terraform provider schema to Jsonnet library generator
//!
//! '''bash
//! cargo run --bin tflibgen -- --help
//! '''

use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tflibgen::config::{GeneratorConfig, LibraryConfig, LibraryEntry, ProviderEntry};
use tflibgen::docstring::HandlebarsDocs;
use tflibgen::fetch::{get_schema_export, SchemaRequest};
use tflibgen::library::{generate_libraries, generate_library};
use tflibgen::naming::provider_name_from_addr;
use tflibgen::schema::read_tf_schema_from_file;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "tflibgen",
    about = "Generate Jsonnet libraries from Terraform provider schemas"
)]
struct Options {
    /// Log filter, e.g. `debug` or `tflibgen=debug`.
    #[structopt(long, default_value = "info", global = true)]
    log_level: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Generate libsonnet libraries for Terraform providers.
    Gen {
        /// Path to a schema exported with `terraform providers schema -json`.
        #[structopt(long, parse(from_os_str), conflicts_with_all = &["providers", "config"])]
        schema: Option<PathBuf>,

        /// Provider to generate, as `src=<source>&version=<constraint>`. May be repeated.
        #[structopt(long = "provider", number_of_values = 1)]
        providers: Vec<String>,

        /// Path to a JSON file listing the libraries to render.
        #[structopt(long, parse(from_os_str), conflicts_with = "providers")]
        config: Option<PathBuf>,

        /// Output directory. Each library is rendered to a subdirectory.
        #[structopt(long, parse(from_os_str), default_value = "./out")]
        out: PathBuf,

        /// Terraform binary used to download providers.
        #[structopt(long, parse(from_os_str), default_value = "terraform")]
        terraform: PathBuf,
    },
    /// Print the schemas of Terraform providers as JSON.
    Getschema {
        /// Provider to retrieve, as `src=<source>&version=<constraint>`. May be repeated.
        #[structopt(long = "provider", number_of_values = 1, required = true)]
        providers: Vec<String>,

        /// Write the schema to this file instead of stdout.
        #[structopt(long, parse(from_os_str))]
        out: Option<PathBuf>,

        #[structopt(long, parse(from_os_str), default_value = "terraform")]
        terraform: PathBuf,
    },
}

fn parse_requests(providers: &[String]) -> tflibgen::Result<Vec<SchemaRequest>> {
    providers.iter().map(|p| SchemaRequest::parse(p)).collect()
}

fn gen_from_schema_file(
    docs: &HandlebarsDocs,
    schema: &Path,
    out: &Path,
) -> Result<(), Box<dyn Error>> {
    let export = read_tf_schema_from_file(schema)?;
    for (addr, provider_schema) in &export.provider_schemas {
        let name = provider_name_from_addr(addr)?;
        let lib_root = out.join(&name);
        info!(provider = addr.as_str(), path = %lib_root.display(), "rendering library");
        generate_library(&GeneratorConfig::new(name), docs, &lib_root, provider_schema)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let options = Options::from_args();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&options.log_level)?)
        .with_writer(io::stderr)
        .init();

    match options.cmd {
        Command::Gen {
            schema,
            providers,
            config,
            out,
            terraform,
        } => {
            let docs = HandlebarsDocs::new()?;
            if let Some(schema) = schema {
                return gen_from_schema_file(&docs, &schema, &out);
            }
            let entries = match config {
                Some(path) => LibraryConfig::from_file(path)?.entries,
                None if !providers.is_empty() => parse_requests(&providers)?
                    .into_iter()
                    .map(|req| LibraryEntry {
                        repo: req.name.clone(),
                        subdir: String::new(),
                        provider: ProviderEntry {
                            src: req.addr.to_string(),
                            version: req.version,
                        },
                    })
                    .collect(),
                None => return Err("one of --schema, --provider or --config is required".into()),
            };
            generate_libraries(&terraform, &docs, &out, &entries)?;
        }
        Command::Getschema {
            providers,
            out,
            terraform,
        } => {
            let requests = parse_requests(&providers)?;
            let export = get_schema_export(&terraform, &requests)?;
            let mut writer: Box<dyn Write> = match out {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(io::stdout()),
            };
            serde_json::to_writer_pretty(&mut writer, &export)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
