//! Per-request context handed to endpoint methods.
//!
//! Holds a read-only view of the request (method, URI, headers, buffered
//! body, path parameters) and the response being built (status, headers,
//! result). Void endpoint methods produce their output exclusively through
//! this object. Typed attributes ride along in the request extensions, so
//! values inserted by middleware (e.g. the access policy) are visible here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;

use crate::endpoint::{IntoReply, Reply};
use crate::error::InvocationError;

/// Shared flag telling a dispatched method its request is gone.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
    path_params: HashMap<String, String>,
    matched_path: Option<String>,
    status: StatusCode,
    response_headers: HeaderMap,
    result: Option<Reply>,
    cancellation: Cancellation,
}

impl RequestContext {
    /// Build a context from request parts and an already-buffered body.
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            extensions: parts.extensions,
            body,
            path_params: HashMap::new(),
            matched_path: None,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            result: None,
            cancellation: Cancellation::default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request header as text; `None` if absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Value of a `{name}` / `:name` segment of the matched pattern.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Pattern of the route or hook currently handling the request.
    pub fn matched_path(&self) -> Option<&str> {
        self.matched_path.as_deref()
    }

    /// Decoded query string parameters. Repeated keys keep the last value.
    pub fn query_params(&self) -> HashMap<String, String> {
        Query::<HashMap<String, String>>::try_from_uri(&self.uri)
            .map(|Query(params)| params)
            .unwrap_or_default()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_params().remove(name)
    }

    pub fn attribute<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn set_attribute<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.extensions.insert(value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.response_headers.insert(name, value);
        self
    }

    /// Set the response body. Replaces any earlier result.
    pub fn result(&mut self, value: impl IntoReply) -> Result<&mut Self, InvocationError> {
        self.result = value.into_reply()?;
        Ok(self)
    }

    /// Set the response body to the JSON serialization of `value`.
    pub fn json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, InvocationError> {
        self.result = Some(Reply::json(value)?);
        Ok(self)
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// True once the request timed out or the client went away.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn set_result(&mut self, reply: Option<Reply>) {
        self.result = reply;
    }

    pub(crate) fn take_result(&mut self) -> Option<Reply> {
        self.result.take()
    }

    pub(crate) fn cancellation(&self) -> Cancellation {
        self.cancellation.clone()
    }

    pub(crate) fn bind_match(&mut self, pattern: &str, params: HashMap<String, String>) {
        self.matched_path = Some(pattern.to_string());
        self.path_params = params;
    }

    pub(crate) fn into_response_parts(self) -> (StatusCode, HeaderMap, Option<Reply>) {
        (self.status, self.response_headers, self.result)
    }
}

#[cfg(test)]
pub(crate) fn test_context(method: Method, uri: &str, body: &'static [u8]) -> RequestContext {
    let (parts, _) = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(())
        .unwrap()
        .into_parts();
    RequestContext::new(parts, Bytes::from_static(body))
}
