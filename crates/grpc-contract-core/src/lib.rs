//! grpc-contract-core - Contract models, templates, and Go post-processing
//!
//! This crate turns an in-memory description of a contract into two artifacts:
//! - a Go gRPC server implementation (rendered, then normalized by [`PostProcessor`])
//! - a proto3 service definition (rendered as-is)
//!
//! # Pipeline
//!
//! ```text
//! ContractModel / ServiceModel
//!     ↓
//!  [ordering]     stable byte-wise sort of sources and methods
//!     ↓
//!  [render]       Tera template → raw bytes
//!     ↓
//!  [postprocess]  Go source only: validate, fix imports, format
//!     ↓
//!  EmissionSink
//! ```
//!
//! # Example
//!
//! ```
//! use grpc_contract_core::{ContractModel, Generator};
//!
//! let generator = Generator::new()?;
//! let model = ContractModel::new("mypkg", "Token", ["/a/b/Token.sol"])?;
//! let file = generator.generate_contract(model, "out", "token.go")?;
//!
//! let text = String::from_utf8(file.contents).unwrap();
//! assert!(text.contains("func NewTokenServer("));
//! # Ok::<(), grpc_contract_core::GenerateError>(())
//! ```

pub mod config;
pub mod descriptor;
mod error;
pub mod model;
pub mod naming;
pub mod ordering;
pub mod pipeline;
pub mod postprocess;
pub mod render;
pub mod sink;

pub use config::GeneratorConfig;
pub use descriptor::{Descriptor, GoMethod, Message, MessageField, Renderable, RpcMethod};
pub use error::{GenerateError, GenerateResult};
pub use model::{ContractModel, DEFAULT_TRANSACT_OPTS_FN, ServiceModel};
pub use pipeline::Generator;
pub use postprocess::{ImportTable, PostProcessor, postprocess};
pub use render::TemplateRenderer;
pub use sink::{EmissionSink, GeneratedFile, MemorySink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ContractModel, EmissionSink, GenerateError, GenerateResult, GeneratedFile, Generator,
        GeneratorConfig, Message, MessageField, Renderable, RpcMethod, ServiceModel,
    };
}
