//! Renderable descriptors for methods and messages.
//!
//! The pipeline never looks inside a method or message: it only needs the
//! text that ends up in the generated file. [`Renderable`] is that
//! capability, and the same text is the sort key used by [`crate::ordering`].
//!
//! Upstream extractors can hand in anything that implements the trait. This
//! module ships the descriptors the CLI builds from its manifest:
//!
//! - [`GoMethod`]: a verbatim Go method implementation
//! - [`RpcMethod`]: a proto3 `rpc` line
//! - [`Message`] / [`MessageField`]: a proto3 `message` block

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Anything that can be rendered into generated text.
pub trait Renderable: fmt::Debug + Send + Sync {
    /// The exact text emitted for this item.
    fn rendered_form(&self) -> Cow<'_, str>;
}

/// Owned, type-erased descriptor as stored in the models.
pub type Descriptor = Box<dyn Renderable>;

impl Renderable for str {
    fn rendered_form(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Renderable for String {
    fn rendered_form(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<T: Renderable + ?Sized> Renderable for Box<T> {
    fn rendered_form(&self) -> Cow<'_, str> {
        (**self).rendered_form()
    }
}

impl<T: Renderable + ?Sized> Renderable for &T {
    fn rendered_form(&self) -> Cow<'_, str> {
        (**self).rendered_form()
    }
}

/// A Go method implementation produced by an upstream extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoMethod {
    pub source: String,
}

impl GoMethod {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Renderable for GoMethod {
    fn rendered_form(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.source.trim())
    }
}

/// A request/response method of a proto3 service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcMethod {
    /// Method name, e.g. `BalanceOf`.
    pub name: String,

    /// Request message type.
    pub request: String,

    /// Response message type.
    pub response: String,
}

impl RpcMethod {
    pub fn new(
        name: impl Into<String>,
        request: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            request: request.into(),
            response: response.into(),
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rpc {}({}) returns ({}) {{}}",
            self.name, self.request, self.response
        )
    }
}

impl Renderable for RpcMethod {
    fn rendered_form(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// A single field of a proto3 message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageField {
    pub name: String,

    /// Proto scalar or message type, e.g. `string`, `uint64`, `Transaction`.
    #[serde(rename = "type")]
    pub ty: String,

    /// Field number; must be unique within the message.
    pub number: u32,

    #[serde(default)]
    pub repeated: bool,
}

impl MessageField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            number,
            repeated: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// A proto3 message definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<MessageField>,
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: MessageField) -> Self {
        self.fields.push(field);
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} {{", self.name)?;
        for field in &self.fields {
            let label = if field.repeated { "repeated " } else { "" };
            writeln!(
                f,
                "    {label}{} {} = {};",
                field.ty, field.name, field.number
            )?;
        }
        write!(f, "}}")
    }
}

impl Renderable for Message {
    fn rendered_form(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}
