//! Handler adapter.
//!
//! # Responsibilities
//! - Validate an endpoint method's declared signature
//! - Construct the declaring controller (one instance per method)
//! - Wrap the method as a route handler
//! - Execute handlers: void methods inline on the request task, value
//!   methods on the dispatch pool, results stored on the context
//!
//! # Design Decisions
//! - A bad signature or a failed constructor skips that endpoint only
//! - A value method that fails or yields nothing answers with the empty
//!   placeholder; the client cannot tell it apart from an empty success
//! - A void method that fails answers 500
//! - Panics in endpoint methods are caught and treated as failures
//! - A pending result is awaited under the same deadline as the dispatched
//!   call that produced it

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::dispatch::{DispatchError, DispatchPool};
use crate::endpoint::{Controller, Endpoint, Invoker, ParamType, Reply, ReturnKind, Signature, Verb};
use crate::error::{BoxError, Error, InvocationError};
use crate::http::RequestContext;
use crate::observability::metrics;

type VoidHandler = Arc<dyn Fn(&mut RequestContext) -> Result<(), BoxError> + Send + Sync>;
type ValueHandler =
    Arc<dyn Fn(&mut RequestContext) -> Result<Option<Reply>, InvocationError> + Send + Sync>;

/// An endpoint method bound to its controller instance.
#[derive(Clone)]
pub enum Handler {
    Void(VoidHandler),
    Value(ValueHandler),
}

impl Handler {
    pub fn void<F>(f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Handler::Void(Arc::new(f))
    }

    pub fn value<F>(f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> Result<Option<Reply>, InvocationError> + Send + Sync + 'static,
    {
        Handler::Value(Arc::new(f))
    }

    pub fn kind(&self) -> ReturnKind {
        match self {
            Handler::Void(_) => ReturnKind::Unit,
            Handler::Value(_) => ReturnKind::Value,
        }
    }
}

/// Check the declared shape of a method registered at `path`.
pub fn validate(signature: &Signature, path: &str, verb: Verb) -> Result<(), Error> {
    let count = signature.params.len();
    if count > 1 {
        return Err(Error::configuration(
            path,
            verb,
            format!("method declares more parameters than allowed. Was: {}, expected at most 1", count),
        ));
    }

    if let Some(param) = signature.params.first() {
        if *param != ParamType::Context {
            let kind = match signature.returns {
                ReturnKind::Unit => "void",
                ReturnKind::Value => "non-void",
            };
            return Err(Error::configuration(
                path,
                verb,
                format!(
                    "first argument of {} method was not of type {} (found {})",
                    kind,
                    ParamType::Context,
                    param
                ),
            ));
        }
    }

    Ok(())
}

/// Validate `endpoint`, construct its controller, and wrap it.
pub fn adapt<T: Controller>(endpoint: &Endpoint<T>, path: &str) -> Result<Handler, Error> {
    let verb = endpoint.descriptor.verb;
    validate(&endpoint.signature, path, verb)?;

    if endpoint.signature.returns != endpoint.invoker.returns() {
        return Err(Error::configuration(
            path,
            verb,
            format!(
                "declared return kind {:?} does not match the invoker ({:?})",
                endpoint.signature.returns,
                endpoint.invoker.returns()
            ),
        ));
    }

    let instance = Arc::new(T::construct().map_err(|source| Error::Instantiation {
        path: path.to_string(),
        verb,
        source,
    })?);

    Ok(match endpoint.invoker.clone() {
        Invoker::Void(f) => Handler::void(move |ctx| f(&instance, ctx)),
        Invoker::Value(f) => Handler::value(move |ctx| f(&instance, ctx)),
    })
}

/// A request ended by the adapter instead of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: &'static str,
}

impl Rejection {
    const INTERNAL: Rejection = Rejection {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Internal server error",
    };
}

impl From<DispatchError> for Rejection {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Rejected { .. } | DispatchError::Closed => Rejection {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "Dispatch queue full",
            },
            DispatchError::TimedOut(_) => Rejection {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: "Request timed out",
            },
            DispatchError::Panicked => Rejection::INTERNAL,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Run `handler` against `ctx`.
///
/// Void handlers run inline; value handlers run on `pool` and their reply
/// (or the empty placeholder) becomes the context's result.
pub async fn execute(
    handler: &Handler,
    mut ctx: RequestContext,
    pool: &DispatchPool,
) -> Result<RequestContext, Rejection> {
    match handler {
        Handler::Void(f) => {
            let outcome = catch_unwind(AssertUnwindSafe(|| f(&mut ctx)))
                .unwrap_or_else(|_| Err(InvocationError::Panicked.into()));
            match outcome {
                Ok(()) => Ok(ctx),
                Err(e) => {
                    tracing::error!(
                        method = %ctx.method(),
                        path = %ctx.path(),
                        error = %e,
                        "Endpoint method failed"
                    );
                    Err(Rejection::INTERNAL)
                }
            }
        }
        Handler::Value(f) => {
            let f = f.clone();
            let cancellation = ctx.cancellation();
            let (mut ctx, outcome) = pool
                .run(cancellation, move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| f(&mut ctx)))
                        .unwrap_or(Err(InvocationError::Panicked));
                    (ctx, outcome)
                })
                .await?;

            let reply = match outcome {
                Ok(Some(reply)) => reply,
                Ok(None) => Reply::empty(),
                Err(e) => {
                    tracing::error!(
                        method = %ctx.method(),
                        path = %ctx.path(),
                        error = %e,
                        "Endpoint method failed, answering with empty response"
                    );
                    Reply::empty()
                }
            };
            ctx.set_result(Some(reply));
            Ok(ctx)
        }
    }
}

/// Resolve a pending result on `ctx` within the pool's deadline.
///
/// On expiry the context is flagged cancelled and the request gets 504.
pub async fn settle(ctx: &mut RequestContext, pool: &DispatchPool) -> Result<(), Rejection> {
    let reply = match ctx.take_result() {
        Some(reply @ Reply::Pending(_)) => reply,
        other => {
            ctx.set_result(other);
            return Ok(());
        }
    };

    let resolved = match pool.timeout() {
        Some(limit) => match tokio::time::timeout(limit, reply.resolve()).await {
            Ok(resolved) => resolved,
            Err(_) => {
                ctx.cancellation().cancel();
                metrics::record_dispatch_timeout();
                tracing::warn!(
                    method = %ctx.method(),
                    path = %ctx.path(),
                    timeout = ?limit,
                    "Pending result timed out"
                );
                return Err(DispatchError::TimedOut(limit).into());
            }
        },
        None => reply.resolve().await,
    };

    ctx.set_result(Some(resolved));
    Ok(())
}
