//! Manifest parsing and validation

use anyhow::{Context, Result};
use grpc_contract_core::{
    ContractModel, GenerateResult, GeneratorConfig, GoMethod, Message, RpcMethod, ServiceModel,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Manifest looked up when `--manifest` is not given.
pub const DEFAULT_MANIFEST: &str = "grpc-contract.toml";

/// grpc-contract.toml manifest structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default, rename = "contract")]
    pub contracts: Vec<ContractSpec>,
}

/// One `[[contract]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractSpec {
    pub name: String,
    pub package: String,

    #[serde(default)]
    pub sources: Vec<String>,

    /// Verbatim Go method implementations
    #[serde(default)]
    pub methods: Vec<GoMethod>,

    #[serde(default)]
    pub transact_opts_fn: Option<String>,

    #[serde(default)]
    pub service: Option<ServiceSpec>,
}

/// `[contract.service]`: the proto3 side of a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpec {
    pub name: String,

    /// Defaults to the contract's package
    #[serde(default)]
    pub package: Option<String>,

    #[serde(default)]
    pub methods: Vec<RpcMethod>,

    #[serde(default)]
    pub events: Vec<RpcMethod>,

    #[serde(default, rename = "message")]
    pub messages: Vec<Message>,
}

impl ContractSpec {
    pub fn to_model(&self) -> GenerateResult<ContractModel> {
        let mut model = ContractModel::new(&self.package, &self.name, &self.sources)?
            .with_methods(self.methods.iter().cloned());
        if let Some(resolver) = &self.transact_opts_fn {
            model = model.with_transact_opts_fn(resolver)?;
        }
        Ok(model)
    }

    /// Service model for this contract, if it declares one.
    pub fn service_model(&self) -> GenerateResult<Option<ServiceModel>> {
        self.service
            .as_ref()
            .map(|service| service.to_model(&self.package))
            .transpose()
    }
}

impl ServiceSpec {
    pub fn to_model(&self, default_package: &str) -> GenerateResult<ServiceModel> {
        let package = self.package.as_deref().unwrap_or(default_package);
        let mut model = ServiceModel::new(package, &self.name)?;
        for method in &self.methods {
            model.push_method(method.clone());
        }
        for event in &self.events {
            model.push_event(event.clone());
        }
        for message in &self.messages {
            model.add_message(message.clone());
        }
        Ok(model)
    }
}

impl Manifest {
    /// Load manifest from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read manifest: {:?}", path.as_ref()))?;

        Self::from_str(&content)
    }

    /// Parse manifest from string
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse manifest")
    }

    /// Validate the manifest by building every model it describes
    pub fn validate(&self) -> Result<()> {
        self.generator
            .validate()
            .context("Invalid [generator] section")?;

        if self.contracts.is_empty() {
            anyhow::bail!("Manifest declares no [[contract]] tables");
        }

        // Output files are named after the struct name, not the contract name
        let mut stems: HashMap<String, &str> = HashMap::new();
        for spec in &self.contracts {
            let model = spec
                .to_model()
                .with_context(|| format!("Invalid contract '{}'", spec.name))?;
            if let Some(previous) = stems.insert(model.struct_name().to_string(), &spec.name) {
                if previous == spec.name {
                    anyhow::bail!("Duplicate contract name: {}", spec.name);
                }
                anyhow::bail!(
                    "Contracts '{previous}' and '{}' would both write {}.go",
                    spec.name,
                    model.struct_name()
                );
            }

            spec.service_model()
                .with_context(|| format!("Invalid service for contract '{}'", spec.name))?;
            if let Some(service) = &spec.service {
                validate_messages(&spec.name, &service.messages)?;
            }
        }

        Ok(())
    }
}

/// Proto3 field numbers: 1 through 2^29 - 1, minus the range reserved for
/// the protobuf implementation.
const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

fn validate_messages(contract: &str, messages: &[Message]) -> Result<()> {
    let mut names = HashSet::new();
    for message in messages {
        if !names.insert(message.name.as_str()) {
            anyhow::bail!(
                "Duplicate message '{}' in contract '{contract}'",
                message.name
            );
        }

        let mut numbers = HashSet::new();
        for field in &message.fields {
            let number = field.number;
            if number == 0 || number > MAX_FIELD_NUMBER || RESERVED_FIELD_NUMBERS.contains(&number) {
                anyhow::bail!(
                    "Message '{}' in contract '{contract}' uses invalid field number {number}",
                    message.name
                );
            }
            if !numbers.insert(number) {
                anyhow::bail!(
                    "Message '{}' in contract '{contract}' reuses field number {number}",
                    message.name
                );
            }
        }
    }
    Ok(())
}

/// Check command implementation
pub fn check(manifest_path: &Path, log_level: Option<&str>) -> Result<()> {
    println!("Checking manifest: {}", manifest_path.display());

    let manifest = Manifest::from_file(manifest_path)?;
    crate::logging::init(log_level.unwrap_or(&manifest.generator.log_level));
    manifest.validate()?;

    let services = manifest
        .contracts
        .iter()
        .filter(|spec| spec.service.is_some())
        .count();
    let methods: usize = manifest.contracts.iter().map(|spec| spec.methods.len()).sum();

    println!("✓ Contracts: {}", manifest.contracts.len());
    println!("✓ Services: {services}");
    println!("✓ Methods: {methods}");
    println!("✓ Output: {}", manifest.generator.output_dir.display());
    println!("\nManifest is valid!");

    Ok(())
}
