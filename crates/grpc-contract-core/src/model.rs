//! Contract and service models.
//!
//! Both models are built once per contract, sorted (contracts only) right
//! before rendering, and dropped after the render call. They are siblings:
//! [`ContractModel`] feeds the Go server template and [`ServiceModel`] feeds
//! the proto3 schema template.

use crate::descriptor::{Descriptor, Message, Renderable};
use crate::error::{GenerateError, GenerateResult};
use crate::naming::{self, require_identifier};
use crate::ordering::{is_sorted_rendered, sort_rendered};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Resolver literal used by the generated constructor when the caller passes
/// a nil `TransactOptsFn`.
pub const DEFAULT_TRANSACT_OPTS_FN: &str = "DefaultTransactOptsFn";

/// The in-memory model of one contract's generated Go server.
#[derive(Debug)]
pub struct ContractModel {
    package: String,
    name: String,
    struct_name: String,
    methods: Vec<Descriptor>,
    sources: Vec<String>,
    transact_opts_fn: Option<String>,
}

impl ContractModel {
    /// Build a model from a package, a contract name, and raw source paths.
    ///
    /// Only the final segment of each path is kept. Paths are never rejected;
    /// a path without separators is stored as-is.
    pub fn new<I, P>(
        package: impl Into<String>,
        name: impl Into<String>,
        source_paths: I,
    ) -> GenerateResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let package = package.into();
        let name = name.into();
        require_identifier("package name", &package)?;
        require_identifier("contract name", &name)?;
        let struct_name = naming::derive_instance_name(&name)?;
        let sources = source_paths
            .into_iter()
            .map(|path| source_file_name(path.as_ref()).to_string())
            .collect();

        Ok(Self {
            package,
            name,
            struct_name,
            methods: Vec::new(),
            sources,
            transact_opts_fn: None,
        })
    }

    /// Append one method descriptor.
    pub fn push_method(&mut self, method: impl Renderable + 'static) {
        self.methods.push(Box::new(method));
    }

    /// Append method descriptors, builder style.
    pub fn with_methods<I, M>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Renderable + 'static,
    {
        self.methods
            .extend(methods.into_iter().map(|m| Box::new(m) as Descriptor));
        self
    }

    /// Override the resolver used when the generated constructor receives nil.
    pub fn with_transact_opts_fn(mut self, resolver: impl Into<String>) -> GenerateResult<Self> {
        let resolver = resolver.into();
        require_identifier("transact options resolver", &resolver)?;
        self.transact_opts_fn = Some(resolver);
        Ok(self)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unexported Go type implementing the server, e.g. `token` for `Token`.
    pub fn struct_name(&self) -> &str {
        &self.struct_name
    }

    /// Generated interface name, e.g. `TokenServer`.
    pub fn server_type_name(&self) -> String {
        naming::server_type_name(&self.name)
    }

    pub fn methods(&self) -> &[Descriptor] {
        &self.methods
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// The resolver configured on this model, if any.
    pub fn transact_opts_fn(&self) -> Option<&str> {
        self.transact_opts_fn.as_deref()
    }

    /// Whether `name` is this contract's generated server interface.
    ///
    /// Exact, case-sensitive comparison against `<Name>Server`.
    pub fn is_server_interface(&self, name: &str) -> bool {
        name.strip_suffix(naming::SERVER_SUFFIX) == Some(self.name.as_str())
    }

    /// Sort sources and methods by their rendered text.
    pub fn sort(&mut self) {
        sort_rendered(&mut self.sources);
        sort_rendered(&mut self.methods);
    }

    pub fn is_sorted(&self) -> bool {
        is_sorted_rendered(&self.sources) && is_sorted_rendered(&self.methods)
    }

    /// Template view of this model. `default_resolver` fills in when no
    /// resolver was set on the model.
    pub(crate) fn view<'a>(&'a self, default_resolver: &'a str) -> ContractView<'a> {
        ContractView {
            package: &self.package,
            name: &self.name,
            struct_name: &self.struct_name,
            sources: &self.sources,
            methods: self.methods.iter().map(|m| m.rendered_form()).collect(),
            default_transact_opts_fn: self.transact_opts_fn.as_deref().unwrap_or(default_resolver),
        }
    }
}

/// The in-memory model of one proto3 service definition.
#[derive(Debug)]
pub struct ServiceModel {
    package: String,
    name: String,
    methods: Vec<Descriptor>,
    events: Vec<Descriptor>,
    messages: BTreeMap<String, Descriptor>,
}

impl ServiceModel {
    /// `package` may be dotted (`acme.token`); each segment must be an identifier.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> GenerateResult<Self> {
        let package = package.into();
        let name = name.into();
        if package.is_empty() {
            return Err(GenerateError::InvalidName(
                "package name must not be empty".to_string(),
            ));
        }
        for segment in package.split('.') {
            require_identifier("package segment", segment)?;
        }
        require_identifier("service name", &name)?;

        Ok(Self {
            package,
            name,
            methods: Vec::new(),
            events: Vec::new(),
            messages: BTreeMap::new(),
        })
    }

    /// Append a request/response method, rendered as an active RPC.
    pub fn push_method(&mut self, method: impl Renderable + 'static) {
        self.methods.push(Box::new(method));
    }

    /// Append an event. Events are rendered commented out.
    pub fn push_event(&mut self, event: impl Renderable + 'static) {
        self.events.push(Box::new(event));
    }

    /// Insert a message definition under `name`, returning any definition it replaces.
    pub fn insert_message(
        &mut self,
        name: impl Into<String>,
        definition: impl Renderable + 'static,
    ) -> Option<Descriptor> {
        self.messages.insert(name.into(), Box::new(definition))
    }

    /// Insert a [`Message`] keyed by its own name.
    pub fn add_message(&mut self, message: Message) -> Option<Descriptor> {
        let name = message.name.clone();
        self.insert_message(name, message)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[Descriptor] {
        &self.methods
    }

    pub fn events(&self) -> &[Descriptor] {
        &self.events
    }

    /// Message definitions in ascending name order.
    pub fn messages(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.messages.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Sort methods and events by their rendered text.
    pub fn sort(&mut self) {
        sort_rendered(&mut self.methods);
        sort_rendered(&mut self.events);
    }

    pub fn is_sorted(&self) -> bool {
        is_sorted_rendered(&self.methods) && is_sorted_rendered(&self.events)
    }

    /// Template view of this model. Methods and events appear in rendered
    /// order whether or not the model was sorted.
    pub(crate) fn view(&self) -> ServiceView<'_> {
        ServiceView {
            package: &self.package,
            name: &self.name,
            methods: rendered_in_order(&self.methods),
            events: rendered_in_order(&self.events),
            messages: self.messages.values().map(|m| m.rendered_form()).collect(),
        }
    }
}

/// Rendered forms of `items`, ordered by rendered text.
fn rendered_in_order(items: &[Descriptor]) -> Vec<Cow<'_, str>> {
    let mut ordered: Vec<&Descriptor> = items.iter().collect();
    sort_rendered(&mut ordered);
    ordered.into_iter().map(|item| item.rendered_form()).collect()
}

/// Serializable view handed to the contract template.
#[derive(Debug, Serialize)]
pub(crate) struct ContractView<'a> {
    pub package: &'a str,
    pub name: &'a str,
    pub struct_name: &'a str,
    pub sources: &'a [String],
    pub methods: Vec<Cow<'a, str>>,
    pub default_transact_opts_fn: &'a str,
}

/// Serializable view handed to the schema template.
#[derive(Debug, Serialize)]
pub(crate) struct ServiceView<'a> {
    pub package: &'a str,
    pub name: &'a str,
    pub methods: Vec<Cow<'a, str>>,
    pub events: Vec<Cow<'a, str>>,
    pub messages: Vec<Cow<'a, str>>,
}

/// Final path segment of `path`, splitting on both `/` and `\`.
fn source_file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(index) => &path[index + 1..],
        None => path,
    }
}
