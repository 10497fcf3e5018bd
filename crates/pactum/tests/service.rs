//! A small service assembled from configuration, typed contracts and docs.

use std::sync::Arc;

use pactum::core::fixtures::RecordingWriter;
use pactum::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Notify;

#[derive(Debug, Deserialize)]
struct OrderParams {
    order: i64,
}

#[derive(Debug, Deserialize)]
struct NewLine {
    sku: String,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct Line {
    order: i64,
    sku: String,
    quantity: i64,
}

fn line_schema() -> Schema {
    Schema::object(vec![
        ("order", Schema::integer().required()),
        ("sku", Schema::string().min_length(1).required()),
        ("quantity", Schema::integer().minimum_int(1).required()),
    ])
}

fn add_line() -> HandlerContract {
    HandlerContract::register(
        Method::POST,
        "/orders/:order/lines",
        HandlerSchemas::new(typed::<Line>(line_schema()))
            .params(typed::<OrderParams>(Schema::object(vec![(
                "order",
                Schema::integer().from_string().minimum_int(1).required(),
            )])))
            .body(typed::<NewLine>(Schema::object(vec![
                ("sku", Schema::string().min_length(1).required()),
                ("quantity", Schema::integer().minimum_int(1).required()),
            ]))),
        |input| async move {
            if input.body.sku == "discontinued" {
                return Err(ApiError::server("sku is discontinued"));
            }
            Ok(Line {
                order: input.params.order,
                sku: input.body.sku,
                quantity: input.body.quantity,
            })
        },
    )
    .unwrap()
}

fn slow_report(started: Arc<Notify>) -> HandlerContract {
    HandlerContract::register(
        Method::GET,
        "/reports",
        HandlerSchemas::new(checked(Schema::object(vec![]))),
        move |_input: Input| {
            let started = Arc::clone(&started);
            async move {
                started.notify_one();
                std::future::pending::<()>().await;
                Ok::<_, ApiError>(json!({}))
            }
        },
    )
    .unwrap()
}

fn service(started: Arc<Notify>) -> (PactumConfig, Api) {
    let config = ConfigLoader::new()
        .with_string(
            r#"
            [api]
            title = "Orders"
            version = "1.4.0"

            [[api.servers]]
            url = "https://orders.example.com"

            [telemetry.logging]
            enabled = false
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let api = config
        .api
        .api_builder()
        .route(add_line())
        .unwrap()
        .route(slow_report(started))
        .unwrap()
        .build();
    (config, api)
}

#[tokio::test]
async fn test_valid_request_writes_typed_response() {
    let (_, api) = service(Arc::new(Notify::new()));
    let mut writer = RecordingWriter::new();

    let request = RawRequest::new(Method::POST, "/orders/{order}/lines")
        .with_params(json!({ "order": "12" }))
        .with_body(json!({ "sku": "bolt-m8", "quantity": 3 }));
    api.dispatch(request, &mut writer).await.unwrap();

    assert_eq!(
        writer.responses(),
        [json!({ "order": 12, "sku": "bolt-m8", "quantity": 3 })]
    );
}

#[tokio::test]
async fn test_rejections_map_to_envelopes() {
    let (_, api) = service(Arc::new(Notify::new()));
    let mut writer = RecordingWriter::new();

    let bad_body = RawRequest::new(Method::POST, "/orders/:order/lines")
        .with_params(json!({ "order": "12" }))
        .with_body(json!({ "sku": "bolt-m8", "quantity": 0 }));
    let err = api.dispatch(bad_body, &mut writer).await.unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidBody);
    let envelope = err.to_envelope(None);
    assert_eq!(envelope.status_code(), http::StatusCode::BAD_REQUEST);
    let details = serde_json::to_value(&envelope).unwrap();
    assert_eq!(details["error"]["_tag"], "InvalidBodyError");

    let discontinued = RawRequest::new(Method::POST, "/orders/:order/lines")
        .with_params(json!({ "order": "12" }))
        .with_body(json!({ "sku": "discontinued", "quantity": 1 }));
    let err = api.dispatch(discontinued, &mut writer).await.unwrap_err();
    assert_eq!(err.tag(), ErrorTag::Server);
    let body: Value = serde_json::to_value(err.to_envelope(Some(RequestId::new()))).unwrap();
    assert!(!body.to_string().contains("discontinued"));

    assert!(writer.is_empty());
}

#[tokio::test]
async fn test_cancelled_dispatch_writes_nothing() {
    let started = Arc::new(Notify::new());
    let (_, api) = service(Arc::clone(&started));
    let cancel = CancellationToken::new();

    let trigger = {
        let cancel = cancel.clone();
        let started = Arc::clone(&started);
        tokio::spawn(async move {
            started.notified().await;
            cancel.cancel();
        })
    };

    let mut writer = RecordingWriter::new();
    let outcome = api
        .dispatch_with_cancel(RawRequest::new(Method::GET, "/reports"), &mut writer, &cancel)
        .await;
    trigger.await.unwrap();

    assert!(outcome.is_cancelled());
    assert!(outcome.error().is_none());
    assert!(writer.is_empty());
}

#[test]
fn test_openapi_uses_configured_metadata() {
    let (config, api) = service(Arc::new(Notify::new()));
    let doc = config
        .api
        .openapi_generator()
        .generate(&api.specification())
        .unwrap();

    assert_eq!(doc.info.title, "Orders");
    assert_eq!(doc.info.version, "1.4.0");
    assert_eq!(doc.servers[0].url, "https://orders.example.com");

    let post = doc.paths["/orders/{order}/lines"].post.as_ref().unwrap();
    assert!(post.request_body.is_some());
    assert!(post.responses.contains_key("400"));
    assert_eq!(post.parameters[0].name, "order");
}
