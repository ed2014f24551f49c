//! Generator configuration

use crate::error::{GenerateError, GenerateResult};
use crate::model::DEFAULT_TRANSACT_OPTS_FN;
use crate::naming::require_identifier;
use crate::postprocess::ImportTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Settings shared by every contract in a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Resolver the generated constructor falls back to when it receives a
    /// nil `TransactOptsFn` and the model sets none
    #[serde(default = "default_transact_opts_fn")]
    pub default_transact_opts_fn: String,

    /// Directory generated files are written under
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Extra qualifier → import path entries, merged over the built-in table
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
}

fn default_transact_opts_fn() -> String {
    DEFAULT_TRANSACT_OPTS_FN.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_transact_opts_fn: default_transact_opts_fn(),
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            imports: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> GenerateResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot: the resolver must be a Go identifier and
    /// import entries must name a qualifier and a path.
    pub fn validate(&self) -> GenerateResult<()> {
        require_identifier("default_transact_opts_fn", &self.default_transact_opts_fn)
            .map_err(into_config_error)?;

        for (qualifier, path) in &self.imports {
            require_identifier("import qualifier", qualifier).map_err(into_config_error)?;
            if path.trim().is_empty() {
                return Err(GenerateError::ConfigError(format!(
                    "import path for '{qualifier}' must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// The built-in import table with this configuration's entries applied.
    pub fn import_table(&self) -> ImportTable {
        let mut table = ImportTable::standard();
        table.extend(self.imports.iter().map(|(q, p)| (q.as_str(), p.as_str())));
        table
    }
}

fn into_config_error(err: GenerateError) -> GenerateError {
    match err {
        GenerateError::InvalidName(message) => GenerateError::ConfigError(message),
        other => other,
    }
}
