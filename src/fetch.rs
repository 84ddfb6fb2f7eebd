//! Retrieval of provider schemas through the `terraform` binary.

use crate::error::{Error, Result};
use crate::schema::{ProviderSchema, TerraformSchemaExport};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub const DEFAULT_HOSTNAME: &str = "registry.terraform.io";
pub const DEFAULT_NAMESPACE: &str = "hashicorp";
pub const PROVIDERS_FILE: &str = "providers.tf.json";

/// Fully qualified provider source address, e.g. `registry.terraform.io/hashicorp/aws`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProviderAddr {
    pub hostname: String,
    pub namespace: String,
    pub provider_type: String,
}

impl ProviderAddr {
    /// Parses `[<hostname>/]<namespace>/<type>` or a bare `<type>`.
    ///
    /// A bare type lives in the `hashicorp` namespace. Addresses are case
    /// insensitive and normalized to lowercase.
    pub fn parse(addr: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidProviderAddr {
            addr: addr.to_string(),
            reason,
        };
        let parts: Vec<String> = addr.split('/').map(str::to_lowercase).collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("empty address segment"));
        }
        let (hostname, namespace, provider_type) = match parts.as_slice() {
            [t] => (DEFAULT_HOSTNAME.to_string(), DEFAULT_NAMESPACE.to_string(), t.clone()),
            [ns, t] => (DEFAULT_HOSTNAME.to_string(), ns.clone(), t.clone()),
            [host, ns, t] => (host.clone(), ns.clone(), t.clone()),
            _ => return Err(invalid("expected at most three segments")),
        };
        Ok(Self {
            hostname,
            namespace,
            provider_type,
        })
    }
}

impl fmt::Display for ProviderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.hostname, self.namespace, self.provider_type
        )
    }
}

/// One provider to retrieve the schema of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaRequest {
    /// Local provider name, the last segment of the address.
    pub name: String,
    pub addr: ProviderAddr,
    /// Version constraint, e.g. `~> 4.0`.
    pub version: String,
}

impl SchemaRequest {
    pub fn new(src: &str, version: &str) -> Result<Self> {
        let addr = ProviderAddr::parse(src)?;
        Ok(Self {
            name: addr.provider_type.clone(),
            addr,
            version: version.to_string(),
        })
    }

    /// Parses the `src=<addr>&version=<constraint>` form of the command line.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidProviderRequest {
            input: input.to_string(),
            reason,
        };
        let mut src = None;
        let mut version = None;
        for (key, value) in url::form_urlencoded::parse(input.as_bytes()) {
            match key.as_ref() {
                "src" => src = Some(value.into_owned()),
                "version" => version = Some(value.into_owned()),
                _ => return Err(invalid("only the src and version keys are supported")),
            }
        }
        let src = src
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("src key is required"))?;
        let version = version
            .filter(|v| !v.is_empty())
            .ok_or_else(|| invalid("version key is required"))?;
        Self::new(&src, &version)
    }
}

/// The Terraform module declaring every requested provider.
///
/// A module can only declare one source and version per local name, so two
/// requests sharing a name must be identical.
pub fn providers_tf_json(requests: &[SchemaRequest]) -> Result<Value> {
    let mut providers = Map::new();
    for req in requests {
        let mut entry = Map::new();
        entry.insert("source".to_string(), json!(req.addr.to_string()));
        if !req.version.is_empty() {
            entry.insert("version".to_string(), json!(req.version));
        }
        let entry = Value::Object(entry);
        match providers.get(&req.name) {
            Some(existing) if *existing != entry => {
                return Err(Error::InvalidProviderRequest {
                    input: format!("src={}&version={}", req.addr, req.version),
                    reason: "conflicts with another request for the same provider name",
                });
            }
            _ => {
                providers.insert(req.name.clone(), entry);
            }
        }
    }
    Ok(json!({ "terraform": { "required_providers": providers } }))
}

/// Splits requests into groups that can each be fetched with one terraform
/// run: within a group every local provider name is requested once.
///
/// Identical requests are fetched once.
pub fn fetch_batches(requests: &[SchemaRequest]) -> Vec<Vec<SchemaRequest>> {
    let mut batches: Vec<Vec<SchemaRequest>> = Vec::new();
    for req in requests {
        if batches.iter().flatten().any(|r| r == req) {
            continue;
        }
        match batches
            .iter_mut()
            .find(|batch| batch.iter().all(|r| r.name != req.name))
        {
            Some(batch) => batch.push(req.clone()),
            None => batches.push(vec![req.clone()]),
        }
    }
    batches
}

fn run_terraform(terraform: &Path, work_dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
    debug!(terraform = %terraform.display(), ?args, "running terraform");
    let output = Command::new(terraform)
        .args(args)
        .current_dir(work_dir)
        .env("TF_IN_AUTOMATION", "1")
        .output()?;
    if !output.status.success() {
        return Err(Error::Terraform {
            command: args.join(" "),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Downloads the requested providers in a scratch module and returns the
/// schema export of `terraform providers schema -json`.
pub fn get_schema_export(
    terraform: &Path,
    requests: &[SchemaRequest],
) -> Result<TerraformSchemaExport> {
    let work_dir = tempfile::Builder::new().prefix("tflibgen-").tempdir()?;
    let providers_path = work_dir.path().join(PROVIDERS_FILE);
    let providers = serde_json::to_string_pretty(&providers_tf_json(requests)?)?;
    fs::write(&providers_path, &providers)?;
    debug!(path = %providers_path.display(), contents = %providers, "rendered providers module");

    info!(count = requests.len(), "downloading providers");
    run_terraform(terraform, work_dir.path(), &["init", "-input=false", "-no-color"])?;
    info!("retrieving provider schemas");
    let stdout = run_terraform(terraform, work_dir.path(), &["providers", "schema", "-json"])?;
    Ok(serde_json::from_slice(&stdout)?)
}

/// Schemas of the requested providers keyed by their full source address.
pub fn get_schemas(
    terraform: &Path,
    requests: &[SchemaRequest],
) -> Result<BTreeMap<ProviderAddr, ProviderSchema>> {
    let mut export = get_schema_export(terraform, requests)?;
    let mut schemas = BTreeMap::new();
    for req in requests {
        if schemas.contains_key(&req.addr) {
            continue;
        }
        let key = req.addr.to_string();
        let schema = export
            .provider_schemas
            .remove(&key)
            .ok_or(Error::MissingProviderSchema(key))?;
        schemas.insert(req.addr.clone(), schema);
    }
    Ok(schemas)
}
