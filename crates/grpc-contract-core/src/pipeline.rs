//! The generation pipeline.
//!
//! [`Generator`] owns both parsed templates and the post-processor. Each
//! call takes one model through ordering, rendering and (for Go output)
//! post-processing, and either returns the finished file or hands it to an
//! [`EmissionSink`]. Nothing reaches the sink unless every stage succeeded.

use crate::config::GeneratorConfig;
use crate::error::GenerateResult;
use crate::model::{ContractModel, ServiceModel};
use crate::postprocess::PostProcessor;
use crate::render::TemplateRenderer;
use crate::sink::{EmissionSink, GeneratedFile};
use std::path::PathBuf;

/// Parsed templates plus post-processing, shareable across threads.
#[derive(Debug, Clone)]
pub struct Generator {
    contract: TemplateRenderer,
    schema: TemplateRenderer,
    post: PostProcessor,
    default_transact_opts_fn: String,
}

impl Generator {
    /// Generator with the built-in templates and default configuration.
    pub fn new() -> GenerateResult<Self> {
        Self::with_config(&GeneratorConfig::default())
    }

    /// Generator using `config`'s resolver literal and import entries.
    pub fn with_config(config: &GeneratorConfig) -> GenerateResult<Self> {
        config.validate()?;
        Ok(Self {
            contract: TemplateRenderer::contract()?,
            schema: TemplateRenderer::schema()?,
            post: PostProcessor::with_imports(config.import_table()),
            default_transact_opts_fn: config.default_transact_opts_fn.clone(),
        })
    }

    /// Replace the contract template, e.g. with a project-specific variant.
    pub fn with_contract_template(mut self, renderer: TemplateRenderer) -> Self {
        self.contract = renderer;
        self
    }

    /// Replace the schema template.
    pub fn with_schema_template(mut self, renderer: TemplateRenderer) -> Self {
        self.schema = renderer;
        self
    }

    /// Resolver literal used for models that set none.
    pub fn default_transact_opts_fn(&self) -> &str {
        &self.default_transact_opts_fn
    }

    pub fn post_processor(&self) -> &PostProcessor {
        &self.post
    }

    /// Sort, render and post-process a contract into canonical Go source.
    pub fn render_contract(&self, model: &mut ContractModel) -> GenerateResult<Vec<u8>> {
        model.sort();
        debug_assert!(model.is_sorted());

        let raw = self
            .contract
            .render(&model.view(&self.default_transact_opts_fn))?;
        tracing::debug!(
            contract = model.name(),
            methods = model.methods().len(),
            bytes = raw.len(),
            "rendered contract"
        );

        let source = self.post.process(&raw)?;
        tracing::debug!(contract = model.name(), bytes = source.len(), "post-processed contract");
        Ok(source)
    }

    /// Render a service definition. Schema output is not post-processed.
    pub fn render_schema(&self, model: &ServiceModel) -> GenerateResult<Vec<u8>> {
        let schema = self.schema.render(&model.view())?;
        tracing::debug!(
            service = model.name(),
            methods = model.methods().len(),
            events = model.events().len(),
            bytes = schema.len(),
            "rendered schema"
        );
        Ok(schema)
    }

    /// Consume `model` and produce its Go server file.
    pub fn generate_contract(
        &self,
        mut model: ContractModel,
        dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> GenerateResult<GeneratedFile> {
        let contents = self.render_contract(&mut model)?;
        Ok(GeneratedFile::new(dir, file_name, contents))
    }

    /// Produce the proto3 file for `model`.
    pub fn generate_schema(
        &self,
        model: &ServiceModel,
        dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> GenerateResult<GeneratedFile> {
        let contents = self.render_schema(model)?;
        Ok(GeneratedFile::new(dir, file_name, contents))
    }

    /// [`generate_contract`](Self::generate_contract), then hand the file to `sink`.
    pub fn emit_contract<S: EmissionSink + ?Sized>(
        &self,
        model: ContractModel,
        dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        sink: &mut S,
    ) -> GenerateResult<()> {
        let file = self.generate_contract(model, dir, file_name)?;
        sink.emit(file)
    }

    /// [`generate_schema`](Self::generate_schema), then hand the file to `sink`.
    pub fn emit_schema<S: EmissionSink + ?Sized>(
        &self,
        model: &ServiceModel,
        dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        sink: &mut S,
    ) -> GenerateResult<()> {
        let file = self.generate_schema(model, dir, file_name)?;
        sink.emit(file)
    }
}

#[cfg(test)]
#[path = "pipeline/pipeline_tests.rs"]
mod pipeline_tests;
