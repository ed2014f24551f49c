//! Template rendering.
//!
//! Templates are parsed once into a [`TemplateRenderer`] and executed against
//! serializable views. Both built-in templates are compiled into the binary,
//! so a parse or execution failure is a generator defect rather than bad
//! input, and is reported as such.

use crate::error::{GenerateError, GenerateResult, describe_chain};
use serde::Serialize;
use tera::{Context, Tera};

/// Registered name of the Go server template.
pub const CONTRACT_TEMPLATE_NAME: &str = "contract.go";

/// Registered name of the proto3 schema template.
pub const SCHEMA_TEMPLATE_NAME: &str = "service.proto";

/// Go server implementation template.
pub const CONTRACT_TEMPLATE: &str = include_str!("../templates/contract.go.tera");

/// proto3 service definition template.
pub const SCHEMA_TEMPLATE: &str = include_str!("../templates/service.proto.tera");

/// A single parsed template, ready to render any number of views.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    name: String,
    tera: Tera,
}

impl TemplateRenderer {
    /// Parse `text` and register it under `name`.
    pub fn new(name: &str, text: &str) -> GenerateResult<Self> {
        let mut tera = Tera::default();
        // Generated Go and proto text must never be HTML-escaped
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(name, text)
            .map_err(|e| GenerateError::TemplateDefect {
                template: name.to_string(),
                message: describe_chain(&e),
            })?;

        Ok(Self {
            name: name.to_string(),
            tera,
        })
    }

    /// The built-in Go server template.
    pub fn contract() -> GenerateResult<Self> {
        Self::new(CONTRACT_TEMPLATE_NAME, CONTRACT_TEMPLATE)
    }

    /// The built-in proto3 schema template.
    pub fn schema() -> GenerateResult<Self> {
        Self::new(SCHEMA_TEMPLATE_NAME, SCHEMA_TEMPLATE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render `view` into a fresh byte buffer.
    ///
    /// Any missing field or engine failure is a [`GenerateError::RenderDefect`].
    pub fn render<V: Serialize>(&self, view: &V) -> GenerateResult<Vec<u8>> {
        let context = Context::from_serialize(view).map_err(|e| self.render_defect(&e))?;
        let mut buffer = Vec::new();
        self.tera
            .render_to(&self.name, &context, &mut buffer)
            .map_err(|e| self.render_defect(&e))?;

        tracing::trace!(template = %self.name, bytes = buffer.len(), "rendered template");
        Ok(buffer)
    }

    fn render_defect(&self, err: &tera::Error) -> GenerateError {
        GenerateError::RenderDefect {
            template: self.name.clone(),
            message: describe_chain(err),
        }
    }
}
