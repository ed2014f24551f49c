//! Generate command implementation

use crate::logging;
use crate::manifest::{ContractSpec, Manifest};
use crate::sink::FsSink;
use anyhow::{Context, Result};
use grpc_contract_core::{EmissionSink, Generator};
use std::path::{Path, PathBuf};

/// Outcome of one batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Contracts whose files were all emitted
    pub generated: Vec<String>,

    /// Contracts that failed, with the rendered error chain
    pub failed: Vec<(String, String)>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the generate command
pub fn run(
    manifest_path: &Path,
    output: Option<PathBuf>,
    keep_going: bool,
    log_level: Option<&str>,
) -> Result<()> {
    let manifest = Manifest::from_file(manifest_path)?;
    logging::init(log_level.unwrap_or(&manifest.generator.log_level));
    manifest.validate()?;

    let output_dir = output.unwrap_or_else(|| resolve_output_dir(manifest_path, &manifest));
    tracing::info!(
        manifest = %manifest_path.display(),
        output = %output_dir.display(),
        contracts = manifest.contracts.len(),
        "generating"
    );

    let generator = Generator::with_config(&manifest.generator)?;
    let mut sink = FsSink::new(&output_dir);
    let summary = generate_all(&generator, &manifest.contracts, keep_going, &mut sink)?;

    println!(
        "Generated {} file(s) for {} contract(s) in {}",
        sink.written().len(),
        summary.generated.len(),
        output_dir.display()
    );

    if !summary.is_success() {
        for (name, error) in &summary.failed {
            eprintln!("✗ {name}: {error}");
        }
        anyhow::bail!("{} contract(s) failed to generate", summary.failed.len());
    }

    Ok(())
}

/// `[generator].output_dir` is relative to the manifest's directory.
fn resolve_output_dir(manifest_path: &Path, manifest: &Manifest) -> PathBuf {
    manifest_path
        .parent()
        .unwrap_or(Path::new(""))
        .join(&manifest.generator.output_dir)
}

/// Generate every contract into `sink`.
///
/// Without `keep_going` the first failure is returned as an error. With it,
/// failures are logged and collected into the summary.
pub fn generate_all<S: EmissionSink>(
    generator: &Generator,
    contracts: &[ContractSpec],
    keep_going: bool,
    sink: &mut S,
) -> Result<Summary> {
    let mut summary = Summary::default();

    for spec in contracts {
        match generate_one(generator, spec, sink) {
            Ok(()) => summary.generated.push(spec.name.clone()),
            Err(err) if keep_going => {
                tracing::error!(contract = %spec.name, error = %format!("{err:#}"), "generation failed");
                summary.failed.push((spec.name.clone(), format!("{err:#}")));
            }
            Err(err) => {
                return Err(err.context(format!("Failed to generate contract '{}'", spec.name)));
            }
        }
    }

    Ok(summary)
}

/// Render every file of one contract, then emit them together. Nothing is
/// emitted unless all of them rendered.
fn generate_one<S: EmissionSink>(
    generator: &Generator,
    spec: &ContractSpec,
    sink: &mut S,
) -> Result<()> {
    let model = spec.to_model()?;
    let service = spec.service_model()?;
    let base = model.struct_name().to_string();

    let mut files = vec![
        generator
            .generate_contract(model, ".", format!("{base}.go"))
            .context("Failed to render Go server")?,
    ];
    if let Some(service) = service {
        files.push(
            generator
                .generate_schema(&service, ".", format!("{base}.proto"))
                .context("Failed to render proto schema")?,
        );
    }

    sink.emit_all(files)?;
    tracing::debug!(contract = %spec.name, "generated");
    Ok(())
}
