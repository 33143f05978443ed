//! Controllers and their endpoint methods.
//!
//! A [`Controller`] is the unit of discovery: a type with an optional
//! type-level descriptor (used as path prefix), a fallible no-argument
//! constructor, and a table of [`Endpoint`]s. Each method pairs a descriptor
//! with a closure over `&Self` and a [`Signature`] describing its shape.
//!
//! The typed constructors derive the signature from the closure they are
//! given, so they can only produce shapes the adapter accepts.
//! [`Endpoint::described`] carries an explicit signature for methods whose shape
//! is only known at runtime; those are validated at registration.

use std::fmt;
use std::sync::Arc;

use crate::endpoint::{EndpointDescriptor, IntoReply, Reply};
use crate::error::{BoxError, InvocationError};
use crate::http::RequestContext;

/// A type whose methods are exposed as endpoints.
///
/// One instance is constructed per registered method and shared by every
/// request routed to it, hence `Send + Sync`: any mutable state must be
/// synchronized explicitly.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Type-level descriptor. Its path prefixes every method path.
    fn descriptor() -> Option<EndpointDescriptor> {
        None
    }

    /// No-argument constructor.
    fn construct() -> Result<Self, BoxError>;

    /// Endpoint methods declared by this type.
    fn endpoints() -> Vec<Endpoint<Self>>;
}

/// Declared parameter type of an endpoint method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// The request context.
    Context,
    /// Anything else, by type name.
    Other(&'static str),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Context => f.write_str(std::any::type_name::<RequestContext>()),
            ParamType::Other(name) => f.write_str(name),
        }
    }
}

/// Declared return kind of an endpoint method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// No value; output goes through the context.
    Unit,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamType>,
    pub returns: ReturnKind,
}

impl Signature {
    pub fn new(params: Vec<ParamType>, returns: ReturnKind) -> Self {
        Self { params, returns }
    }

    /// `fn(&self, &mut RequestContext)`
    pub fn void() -> Self {
        Self::new(vec![ParamType::Context], ReturnKind::Unit)
    }

    /// `fn(&self) -> R`
    pub fn value() -> Self {
        Self::new(Vec::new(), ReturnKind::Value)
    }

    /// `fn(&self, &mut RequestContext) -> R`
    pub fn value_with_context() -> Self {
        Self::new(vec![ParamType::Context], ReturnKind::Value)
    }
}

pub(crate) type VoidFn<T> =
    Arc<dyn Fn(&T, &mut RequestContext) -> Result<(), BoxError> + Send + Sync>;

pub(crate) type ValueFn<T> =
    Arc<dyn Fn(&T, &mut RequestContext) -> Result<Option<Reply>, InvocationError> + Send + Sync>;

/// The callable part of an endpoint method.
pub enum Invoker<T> {
    Void(VoidFn<T>),
    Value(ValueFn<T>),
}

impl<T> Invoker<T> {
    pub fn void<F>(f: F) -> Self
    where
        F: Fn(&T, &mut RequestContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Invoker::Void(Arc::new(f))
    }

    pub fn value<F, R>(f: F) -> Self
    where
        F: Fn(&T, &mut RequestContext) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Invoker::Value(Arc::new(move |this, ctx| f(this, ctx).into_reply()))
    }

    pub(crate) fn returns(&self) -> ReturnKind {
        match self {
            Invoker::Void(_) => ReturnKind::Unit,
            Invoker::Value(_) => ReturnKind::Value,
        }
    }
}

impl<T> Clone for Invoker<T> {
    fn clone(&self) -> Self {
        match self {
            Invoker::Void(f) => Invoker::Void(f.clone()),
            Invoker::Value(f) => Invoker::Value(f.clone()),
        }
    }
}

/// One endpoint method of controller `T`.
pub struct Endpoint<T> {
    pub(crate) descriptor: EndpointDescriptor,
    pub(crate) signature: Signature,
    pub(crate) invoker: Invoker<T>,
}

impl<T: 'static> Endpoint<T> {
    /// Method writing its output through the context.
    pub fn void<F>(descriptor: EndpointDescriptor, f: F) -> Self
    where
        F: Fn(&T, &mut RequestContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            signature: Signature::void(),
            invoker: Invoker::void(f),
        }
    }

    /// Method producing a value without looking at the request.
    pub fn value<F, R>(descriptor: EndpointDescriptor, f: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Self {
            descriptor,
            signature: Signature::value(),
            invoker: Invoker::value(move |this: &T, _: &mut RequestContext| f(this)),
        }
    }

    /// Method producing a value from the request.
    pub fn value_with_context<F, R>(descriptor: EndpointDescriptor, f: F) -> Self
    where
        F: Fn(&T, &mut RequestContext) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Self {
            descriptor,
            signature: Signature::value_with_context(),
            invoker: Invoker::value(f),
        }
    }

    /// Method with an explicitly declared signature, checked at registration.
    pub fn described(descriptor: EndpointDescriptor, signature: Signature, invoker: Invoker<T>) -> Self {
        Self {
            descriptor,
            signature,
            invoker,
        }
    }

    pub fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            signature: self.signature.clone(),
            invoker: self.invoker.clone(),
        }
    }
}

impl<T> fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("descriptor", &self.descriptor)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
