//! End-to-end tests: endpoints bound from a catalog, served over TCP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde::{Deserialize, Serialize};

use routebind::config::{OverflowPolicy, ServerConfig};
use routebind::endpoint::{Invoker, ParamType, ReturnKind, Signature};
use routebind::{
    Access, AccessPolicy, BoxError, Catalog, Controller, Endpoint, EndpointDescriptor, Error, Json,
    Namespace, Pending, Source,
};

mod common;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Item {
    id: u32,
    name: String,
}

struct Items;

impl Controller for Items {
    fn descriptor() -> Option<EndpointDescriptor> {
        Some(EndpointDescriptor::new("/api/"))
    }

    fn construct() -> Result<Self, BoxError> {
        Ok(Items)
    }

    fn endpoints() -> Vec<Endpoint<Self>> {
        vec![
            Endpoint::value(EndpointDescriptor::get("/items"), |_| {
                Json(vec![Item {
                    id: 1,
                    name: "widget".to_string(),
                }])
            }),
            Endpoint::value(EndpointDescriptor::post("/items"), |_| "ok"),
            Endpoint::value(EndpointDescriptor::get("/empty"), |_| None::<Json<Item>>),
            Endpoint::value(EndpointDescriptor::get("/failing"), |_| {
                Err::<Json<Item>, BoxError>("storage offline".into())
            }),
            Endpoint::value(EndpointDescriptor::get("/later"), |_| {
                Pending::new(async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    "eventually"
                })
            }),
            Endpoint::void(EndpointDescriptor::put("/items/{id}"), |_, ctx| {
                let mut item: Item = ctx.body_json()?;
                item.id = ctx.path_param("id").ok_or("missing id")?.parse()?;
                ctx.json(&item)?;
                Ok(())
            }),
            Endpoint::void(EndpointDescriptor::patch("/explode"), |_, _| Err("kaboom".into())),
            Endpoint::described(
                EndpointDescriptor::get("/greedy"),
                Signature::new(vec![ParamType::Context, ParamType::Other("String")], ReturnKind::Value),
                Invoker::value(|_, _| "unreachable"),
            ),
        ]
    }
}

static BROKEN_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

struct Broken;

impl Controller for Broken {
    fn construct() -> Result<Self, BoxError> {
        BROKEN_ATTEMPTS.fetch_add(1, Ordering::SeqCst);
        Err("connection refused".into())
    }

    fn endpoints() -> Vec<Endpoint<Self>> {
        vec![Endpoint::value(EndpointDescriptor::get("/broken"), |_| "never")]
    }
}

mod v1 {
    use super::*;

    pub struct Old;

    impl Controller for Old {
        fn construct() -> Result<Self, BoxError> {
            Ok(Old)
        }

        fn endpoints() -> Vec<Endpoint<Self>> {
            vec![Endpoint::value(EndpointDescriptor::get("/x"), |_| "old")]
        }
    }
}

mod v2 {
    use super::*;

    pub struct New;

    impl Controller for New {
        fn construct() -> Result<Self, BoxError> {
            Ok(New)
        }

        fn endpoints() -> Vec<Endpoint<Self>> {
            vec![Endpoint::value(EndpointDescriptor::get("/x"), |_| "new")]
        }
    }
}

fn catalog() -> Catalog {
    Catalog::new()
        .namespace(Namespace::new("shop::api").controller::<Items>())
        .namespace(Namespace::new("shop::broken").controller::<Broken>())
        .namespace(Namespace::new("shop::versions::v1").controller::<v1::Old>())
        .namespace(Namespace::new("shop::versions::v2").controller::<v2::New>())
}

async fn serve(sources: Vec<&str>) -> common::TestServer {
    common::start_server(ServerConfig::default(), None, &catalog(), sources).await
}

#[tokio::test]
async fn test_prefixed_route_serializes_json() {
    let server = serve(vec!["shop::api"]).await;

    let res = common::client().get(server.url("/api/items")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    let items: Vec<Item> = res.json().await.unwrap();
    assert_eq!(items[0].name, "widget");
}

#[tokio::test]
async fn test_raw_text_is_not_json_quoted() {
    let server = serve(vec!["shop::api"]).await;

    let res = common::client().post(server.url("/api/items")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_missing_value_and_failure_use_placeholder() {
    let server = serve(vec!["shop::api"]).await;
    let client = common::client();

    for path in ["/api/empty", "/api/failing"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), r#"{"response":""}"#);
    }
}

#[tokio::test]
async fn test_pending_result_is_awaited() {
    let server = serve(vec!["shop::api"]).await;

    let res = common::client().get(server.url("/api/later")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "eventually");
}

#[tokio::test]
async fn test_void_method_reads_and_writes_context() {
    let server = serve(vec!["shop::api"]).await;

    let res = common::client()
        .put(server.url("/api/items/7"))
        .json(&serde_json::json!({ "id": 0, "name": "gadget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Item = res.json().await.unwrap();
    assert_eq!(
        item,
        Item {
            id: 7,
            name: "gadget".to_string()
        }
    );
}

#[tokio::test]
async fn test_failing_void_method_is_server_error() {
    let server = serve(vec!["shop::api"]).await;

    let res = common::client().patch(server.url("/api/explode")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_bad_signature_is_skipped() {
    let server = serve(vec!["shop::api"]).await;

    let skipped = &server.report.skipped;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].key.to_string(), "GET /api/greedy");
    assert!(matches!(skipped[0].error, Error::Configuration { .. }));

    let res = common::client().get(server.url("/api/greedy")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_instantiation_failure_skips_only_that_endpoint() {
    let server = serve(vec!["shop"]).await;
    assert!(BROKEN_ATTEMPTS.load(Ordering::SeqCst) >= 1);

    let broken = server
        .report
        .skipped
        .iter()
        .find(|s| s.key.path == "/broken")
        .unwrap();
    assert!(broken.error.to_string().contains("Could not prepare endpoint '/broken' with method 'GET'"));

    let client = common::client();
    let res = client.get(server.url("/broken")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(server.url("/api/items")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_last_registration_wins() {
    let server = serve(vec!["shop::versions"]).await;
    assert_eq!(server.report.replaced.len(), 1);

    let res = common::client().get(server.url("/x")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "new");
}

#[tokio::test]
async fn test_unknown_and_malformed_sources_register_nothing() {
    let server = serve(vec!["warehouse", "shop::", "shop..api"]).await;
    assert!(server.report.registered.is_empty());
    assert!(server.report.skipped.is_empty());
}

#[tokio::test]
async fn test_source_from_representative_value() {
    let catalog = Catalog::new().namespace(Namespace::new(module_path!()).controller::<v1::Old>());
    let server = common::start_server(
        ServerConfig::default(),
        None,
        &catalog,
        vec![Source::of(&Items)],
    )
    .await;

    let res = common::client().get(server.url("/x")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "old");
}

#[tokio::test]
async fn test_cors_and_request_id_headers() {
    let server = serve(vec!["shop::api"]).await;

    let res = common::client()
        .get(server.url("/api/items"))
        .header(header::ORIGIN, "http://elsewhere.example")
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_access_policy_denies_before_endpoint() {
    let policy: Arc<dyn AccessPolicy> = Arc::new(|req: &mut Request<Body>| {
        match req.headers().get("x-role").and_then(|v| v.to_str().ok()) {
            Some("admin") => Access::Allow,
            _ => Access::deny(StatusCode::FORBIDDEN, "Admins only"),
        }
    });
    let server = common::start_server(ServerConfig::default(), Some(policy), &catalog(), vec!["shop::api"]).await;
    let client = common::client();

    let res = client.get(server.url("/api/items")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.text().await.unwrap(), "Admins only");

    let res = client
        .get(server.url("/api/items"))
        .header("x-role", "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

struct Sleepy;

impl Controller for Sleepy {
    fn construct() -> Result<Self, BoxError> {
        Ok(Sleepy)
    }

    fn endpoints() -> Vec<Endpoint<Self>> {
        vec![Endpoint::value_with_context(EndpointDescriptor::get("/sleep"), |_, ctx| {
            for _ in 0..20 {
                if ctx.is_cancelled() {
                    return "cancelled";
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            "rested"
        })]
    }
}

#[tokio::test]
async fn test_dispatch_backpressure() {
    let mut config = ServerConfig::default();
    config.dispatch.max_workers = 1;
    config.dispatch.queue_depth = 0;
    config.dispatch.overflow = OverflowPolicy::Reject;
    config.dispatch.timeout_ms = 150;

    let catalog = Catalog::new().namespace(Namespace::new("rest").controller::<Sleepy>());
    let server = common::start_server(config, None, &catalog, vec!["rest"]).await;
    let client = common::client();

    let first = tokio::spawn(client.get(server.url("/sleep")).send());
    tokio::time::sleep(Duration::from_millis(50)).await;

    let res = client.get(server.url("/sleep")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "Dispatch queue full");

    let res = first.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
}
