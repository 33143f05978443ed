//! Access control middleware.
//!
//! The binder does not decide who may call what. It consults an
//! [`AccessPolicy`] supplied at initialization before any hook or endpoint
//! runs, and a denial ends the request with the policy's status and message.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Verdict of an access policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny(StatusCode, String),
}

impl Access {
    pub fn deny(status: StatusCode, message: impl Into<String>) -> Self {
        Access::Deny(status, message.into())
    }
}

/// Decides whether a request may proceed.
///
/// Policies may attach typed values to the request extensions; endpoint
/// methods read them back with `RequestContext::attribute`.
pub trait AccessPolicy: Send + Sync + 'static {
    fn check(&self, request: &mut Request<Body>) -> Access;
}

impl<F> AccessPolicy for F
where
    F: Fn(&mut Request<Body>) -> Access + Send + Sync + 'static,
{
    fn check(&self, request: &mut Request<Body>) -> Access {
        self(request)
    }
}

/// Identity attached by [`RequireHeader`] to accepted requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal(pub String);

/// Admits requests carrying one of a fixed set of header values.
#[derive(Debug, Clone)]
pub struct RequireHeader {
    name: HeaderName,
    allowed: HashSet<String>,
}

impl RequireHeader {
    pub fn new<I, S>(name: HeaderName, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl AccessPolicy for RequireHeader {
    fn check(&self, request: &mut Request<Body>) -> Access {
        let value = match request.headers().get(&self.name) {
            Some(value) => value.to_str().unwrap_or_default().to_string(),
            None => {
                return Access::deny(StatusCode::UNAUTHORIZED, format!("Missing {} header", self.name));
            }
        };

        if self.allowed.contains(&value) {
            request.extensions_mut().insert(Principal(value));
            Access::Allow
        } else {
            Access::deny(StatusCode::FORBIDDEN, "Access denied")
        }
    }
}

pub async fn access_control_middleware(
    State(policy): State<Arc<dyn AccessPolicy>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match policy.check(&mut req) {
        Access::Allow => next.run(req).await,
        Access::Deny(status, message) => {
            tracing::debug!(
                method = %req.method(),
                path = %req.uri().path(),
                status = status.as_u16(),
                "Request denied by access policy"
            );
            (status, message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    fn app(policy: Arc<dyn AccessPolicy>) -> Router {
        Router::new()
            .route(
                "/",
                get(|req: Request<Body>| async move {
                    req.extensions()
                        .get::<Principal>()
                        .map(|p| p.0.clone())
                        .unwrap_or_default()
                }),
            )
            .layer(axum::middleware::from_fn_with_state(policy, access_control_middleware))
    }

    fn request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_require_header() {
        let policy: Arc<dyn AccessPolicy> =
            Arc::new(RequireHeader::new(HeaderName::from_static("x-api-key"), ["secret"]));

        let missing = app(policy.clone()).oneshot(request(None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app(policy.clone()).oneshot(request(Some("guess"))).await.unwrap();
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

        let ok = app(policy).oneshot(request(Some("secret"))).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = axum::body::to_bytes(ok.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "secret");
    }

    #[tokio::test]
    async fn test_closure_policy() {
        let policy: Arc<dyn AccessPolicy> = Arc::new(|req: &mut Request<Body>| {
            if req.uri().path() == "/" {
                Access::deny(StatusCode::IM_A_TEAPOT, "no")
            } else {
                Access::Allow
            }
        });
        let response = app(policy).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
