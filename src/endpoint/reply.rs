//! Endpoint results.
//!
//! A value-returning endpoint method produces something implementing
//! [`IntoReply`]. Text, binary blobs, byte streams and pending results are
//! raw replies and reach the client untouched. Everything else is serialized
//! to JSON. A method that produces nothing gets the [`EmptyResponse`]
//! placeholder.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::FutureExt;
use serde::Serialize;

use crate::error::{BoxError, InvocationError};

/// Stream of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// What ends up in the response body.
pub enum Reply {
    Text(String),
    Binary(Bytes),
    Stream(ByteStream),
    /// Resolved on the request task once the wrapped future completes.
    Pending(Pending),
    /// Already-serialized structured data.
    Json(String),
}

impl Reply {
    /// Serialize `value` into a JSON reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Reply, InvocationError> {
        Ok(Reply::Json(serde_json::to_string(value)?))
    }

    /// The placeholder used when a method produced no value.
    pub fn empty() -> Reply {
        Reply::Json(serde_json::json!({ "response": "" }).to_string())
    }

    /// Resolve pending replies until a concrete one is left.
    ///
    /// A pending result that fails, panics or yields nothing resolves to
    /// [`Reply::empty`].
    pub async fn resolve(self) -> Reply {
        let mut reply = self;
        loop {
            match reply {
                Reply::Pending(pending) => {
                    reply = match AssertUnwindSafe(pending.0).catch_unwind().await {
                        Ok(Ok(Some(next))) => next,
                        Ok(Ok(None)) => Reply::empty(),
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, "Pending result failed");
                            Reply::empty()
                        }
                        Err(_) => {
                            tracing::error!("Pending result panicked");
                            Reply::empty()
                        }
                    };
                }
                other => return other,
            }
        }
    }

    /// True for the kinds written without serialization.
    pub fn is_raw(&self) -> bool {
        !matches!(self, Reply::Json(_))
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Reply::Binary(b) => f.debug_tuple("Binary").field(&b.len()).finish(),
            Reply::Stream(_) => f.write_str("Stream(..)"),
            Reply::Pending(_) => f.write_str("Pending(..)"),
            Reply::Json(s) => f.debug_tuple("Json").field(s).finish(),
        }
    }
}

/// Handle to a result that is not computed yet.
pub struct Pending(BoxFuture<'static, Result<Option<Reply>, InvocationError>>);

impl Pending {
    pub fn new<F>(future: F) -> Self
    where
        F: Future + Send + 'static,
        F::Output: IntoReply,
    {
        Self(future.map(|output| output.into_reply()).boxed())
    }
}

/// Placeholder body for methods that produced no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmptyResponse {
    pub response: String,
}

/// Serialize the wrapped value as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

/// Conversion from an endpoint method's return value into a reply.
///
/// `Ok(None)` means the method produced no value.
pub trait IntoReply {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(self))
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(Reply::Text(self)))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(Reply::Text(self.to_owned())))
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(Reply::Binary(Bytes::from(self))))
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(Reply::Binary(self)))
    }
}

impl IntoReply for ByteStream {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(Reply::Stream(self)))
    }
}

impl IntoReply for Pending {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Ok(Some(Reply::Pending(self)))
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Reply::json(&self.0).map(Some)
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Reply::json(&self).map(Some)
    }
}

impl IntoReply for EmptyResponse {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        Reply::json(&self).map(Some)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(None),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
        match self {
            Ok(value) => value.into_reply(),
            Err(e) => Err(InvocationError::Failed(e.into())),
        }
    }
}

macro_rules! json_scalar_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Result<Option<Reply>, InvocationError> {
                    Reply::json(&self).map(Some)
                }
            }
        )*
    };
}

json_scalar_reply!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body_of(reply: Option<Reply>) -> String {
        match reply {
            Some(Reply::Text(s)) | Some(Reply::Json(s)) => s,
            Some(Reply::Binary(b)) => String::from_utf8(b.to_vec()).unwrap(),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[test]
    fn test_text_is_not_quoted() {
        let reply = "ok".into_reply().unwrap();
        assert!(reply.as_ref().unwrap().is_raw());
        assert_eq!(body_of(reply), "ok");
    }

    #[test]
    fn test_structured_values_are_serialized() {
        let reply = Json(Item { id: 7, name: "seven" }).into_reply().unwrap();
        assert_eq!(body_of(reply), r#"{"id":7,"name":"seven"}"#);

        assert_eq!(body_of(42u32.into_reply().unwrap()), "42");
        assert_eq!(body_of(true.into_reply().unwrap()), "true");
    }

    #[test]
    fn test_binary_passes_through() {
        let reply = vec![0x68u8, 0x69].into_reply().unwrap();
        assert!(matches!(reply, Some(Reply::Binary(ref b)) if b.as_ref() == b"hi"));
    }

    #[test]
    fn test_none_and_errors() {
        let none: Option<String> = None;
        assert!(none.into_reply().unwrap().is_none());

        let failed: Result<String, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(matches!(failed.into_reply(), Err(InvocationError::Failed(_))));
    }

    #[test]
    fn test_empty_placeholder_shape() {
        let expected = serde_json::to_string(&EmptyResponse::default()).unwrap();
        assert_eq!(expected, r#"{"response":""}"#);
        assert_eq!(body_of(Some(Reply::empty())), expected);
    }

    #[tokio::test]
    async fn test_pending_resolves() {
        let pending = Pending::new(async { Json(Item { id: 1, name: "a" }) });
        let resolved = Reply::Pending(pending).resolve().await;
        assert_eq!(body_of(Some(resolved)), r#"{"id":1,"name":"a"}"#);

        let nested = Pending::new(async { Pending::new(async { "inner" }) });
        assert_eq!(body_of(Some(Reply::Pending(nested).resolve().await)), "inner");

        let nothing = Pending::new(async { None::<String> });
        assert_eq!(
            body_of(Some(Reply::Pending(nothing).resolve().await)),
            r#"{"response":""}"#
        );
    }

    #[tokio::test]
    async fn test_panicking_pending_resolves_to_placeholder() {
        let exploding = Pending::new(async {
            if true {
                panic!("boom");
            }
            "unreachable"
        });
        assert_eq!(
            body_of(Some(Reply::Pending(exploding).resolve().await)),
            r#"{"response":""}"#
        );
    }

    #[test]
    fn test_stream_is_raw() {
        let s: ByteStream = Box::pin(stream::iter(vec![Ok(Bytes::from_static(b"a"))]));
        let reply = s.into_reply().unwrap().unwrap();
        assert!(matches!(reply, Reply::Stream(_)));
        assert!(reply.is_raw());
    }
}
