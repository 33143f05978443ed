//! Namespaces and the catalog of registered controllers.
//!
//! A namespace groups controllers under a module-path-like identifier,
//! usually `module_path!()` of the module declaring them. The catalog is the
//! explicit table scanned at startup in place of runtime introspection.

use std::fmt;
use std::sync::Arc;

use crate::discovery::scanner::NamespaceId;
use crate::endpoint::{Controller, Endpoint, EndpointDescriptor, Signature, Verb};
use crate::error::Error;
use crate::http::adapter::{self, Handler};
use crate::routing::path;

type Binder = Arc<dyn Fn(&str) -> Result<Handler, Error> + Send + Sync>;

/// An endpoint method found in a namespace, not yet bound to an instance.
#[derive(Clone)]
pub struct DiscoveredEndpoint {
    controller: &'static str,
    namespace: String,
    type_descriptor: Option<EndpointDescriptor>,
    descriptor: EndpointDescriptor,
    signature: Signature,
    binder: Binder,
}

impl DiscoveredEndpoint {
    fn new<T: Controller>(namespace: &str, type_descriptor: Option<EndpointDescriptor>, endpoint: Endpoint<T>) -> Self {
        let descriptor = endpoint.descriptor().clone();
        let signature = endpoint.signature().clone();
        let binder: Binder = Arc::new(move |path: &str| adapter::adapt(&endpoint, path));

        Self {
            controller: std::any::type_name::<T>(),
            namespace: namespace.to_string(),
            type_descriptor,
            descriptor,
            signature,
            binder,
        }
    }

    /// Type name of the declaring controller.
    pub fn controller(&self) -> &'static str {
        self.controller
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    pub fn type_descriptor(&self) -> Option<&EndpointDescriptor> {
        self.type_descriptor.as_ref()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn verb(&self) -> Verb {
        self.descriptor.verb
    }

    /// Route path: type prefix joined with the method path.
    pub fn resolved_path(&self) -> String {
        path::resolve(self.type_descriptor.as_ref(), &self.descriptor)
    }

    /// Validate, instantiate the controller and wrap the method.
    pub fn bind(&self, path: &str) -> Result<Handler, Error> {
        (self.binder)(path)
    }
}

impl fmt::Debug for DiscoveredEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredEndpoint")
            .field("controller", &self.controller)
            .field("namespace", &self.namespace)
            .field("verb", &self.descriptor.verb)
            .field("path", &self.resolved_path())
            .finish()
    }
}

/// Controllers declared under one identifier.
#[derive(Debug, Clone)]
pub struct Namespace {
    id: String,
    endpoints: Vec<DiscoveredEndpoint>,
}

impl Namespace {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoints: Vec::new(),
        }
    }

    /// Add every endpoint method of `T`.
    pub fn controller<T: Controller>(mut self) -> Self {
        let type_descriptor = T::descriptor();
        for endpoint in T::endpoints() {
            self.endpoints
                .push(DiscoveredEndpoint::new(&self.id, type_descriptor.clone(), endpoint));
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn endpoints(&self) -> &[DiscoveredEndpoint] {
        &self.endpoints
    }
}

/// Every namespace the application declares.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    namespaces: Vec<Namespace>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Namespaces equal to or nested under `id`.
    pub(crate) fn within<'a>(&'a self, id: &'a NamespaceId) -> impl Iterator<Item = &'a Namespace> + 'a {
        self.namespaces.iter().filter(move |ns| match NamespaceId::parse(&ns.id) {
            Ok(ns_id) => ns_id.is_within(id),
            Err(_) => false,
        })
    }
}
