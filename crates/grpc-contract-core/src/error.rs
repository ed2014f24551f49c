//! Error types for contract generation

use thiserror::Error;

/// Result type alias for generation operations
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Error type for generation operations
#[derive(Error, Debug)]
pub enum GenerateError {
    /// A built-in or configured template failed to parse
    #[error("template defect in '{template}': {message}")]
    TemplateDefect { template: String, message: String },

    /// A parsed template failed to execute against its model
    #[error("render defect in '{template}': {message}")]
    RenderDefect { template: String, message: String },

    /// Rendered Go source is not valid enough to post-process
    #[error("malformed source at line {line}: {reason}: `{excerpt}`")]
    MalformedSource {
        reason: String,
        line: usize,
        excerpt: String,
    },

    /// A contract, service, or identifier name violates naming rules
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The emission sink could not persist a generated file
    #[error("failed to emit {path}: {message}")]
    Emit { path: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GenerateError {
    /// Returns a stable numeric code suitable for process exit statuses
    pub fn error_code(&self) -> u32 {
        match self {
            GenerateError::TemplateDefect { .. } => 1,
            GenerateError::RenderDefect { .. } => 2,
            GenerateError::MalformedSource { .. } => 3,
            GenerateError::InvalidName(_) => 4,
            GenerateError::Emit { .. } => 5,
            GenerateError::ConfigError(_) => 6,
        }
    }

    /// True for errors that indicate a bug in the generator itself rather
    /// than in its input.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            GenerateError::TemplateDefect { .. } | GenerateError::RenderDefect { .. }
        )
    }
}

impl From<toml::de::Error> for GenerateError {
    fn from(err: toml::de::Error) -> Self {
        GenerateError::ConfigError(err.to_string())
    }
}

/// Flatten an error and its `source()` chain into one line.
///
/// Tera reports the interesting part (missing variable, bad tag) in the
/// nested sources, not in the top-level message.
pub(crate) fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
