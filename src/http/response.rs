//! Response rendering.
//!
//! # Responsibilities
//! - Turn a finished request context into an HTTP response
//! - Resolve pending results left on the context before writing
//! - Stream byte-stream results without buffering
//!
//! # Design Decisions
//! - Text, JSON and binary bodies are written as-is
//! - The default content type is applied by a layer, not here, so an
//!   explicit `content-type` set by a method always wins
//! - The dispatch deadline for pending results is enforced upstream by
//!   `adapter::settle`; resolution here has no deadline of its own

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::endpoint::Reply;
use crate::http::RequestContext;

/// Body written when no endpoint matched the request.
pub const NOT_FOUND: &str = "Not found";

pub async fn render(ctx: RequestContext) -> Response {
    let (status, headers, reply) = ctx.into_response_parts();

    let body = match reply {
        Some(reply) => into_body(reply.resolve().await),
        None => Body::empty(),
    };

    let mut response = (status, body).into_response();
    response.headers_mut().extend(headers);
    response
}

fn into_body(reply: Reply) -> Body {
    match reply {
        Reply::Text(text) | Reply::Json(text) => Body::from(text),
        Reply::Binary(bytes) => Body::from(bytes),
        Reply::Stream(stream) => Body::from_stream(stream),
        // resolve() never returns a pending reply
        Reply::Pending(_) => Body::empty(),
    }
}

/// Mark `ctx` as unmatched: 404 with a plain message.
pub fn not_found(ctx: &mut RequestContext) {
    ctx.set_status(StatusCode::NOT_FOUND);
    ctx.set_result(Some(Reply::Text(NOT_FOUND.to_string())));
}
