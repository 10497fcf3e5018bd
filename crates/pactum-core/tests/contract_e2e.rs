//! End-to-end handler contract tests.
//!
//! These tests drive registered contracts the way a router would:
//!
//! 1. Absent slots pass raw input through; present slots reject what their
//!    validator rejects
//! 2. Inputs are validated query first, then params, then body
//! 3. Responses are always validated and never written when invalid
//! 4. Cancellation drops the execution without writing or failing

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use pactum_core::fixtures::{items_api, RecordingWriter};
use pactum_core::schema::Schema;
use pactum_core::slot::{checked, typed, HandlerSchemas};
use pactum_core::{
    ApiError, CancellationToken, ErrorTag, HandlerContract, Outcome, RawRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Notify;

#[derive(Debug, Deserialize)]
struct ItemParams {
    id: i64,
}

#[derive(Debug, Serialize)]
struct Widget {
    name: String,
}

fn widget_contract() -> HandlerContract {
    HandlerContract::register(
        Method::GET,
        "/items/:id",
        HandlerSchemas::new(typed::<Widget>(Schema::object(vec![(
            "name",
            Schema::string().required(),
        )])))
        .params(typed::<ItemParams>(Schema::object(vec![(
            "id",
            Schema::integer().from_string().required(),
        )]))),
        |input| async move {
            assert!(input.params.id > 0);
            Ok(Widget {
                name: "widget".into(),
            })
        },
    )
    .unwrap()
}

fn item_request(id: &str) -> RawRequest {
    RawRequest::new(Method::GET, "/items/{id}").with_params(json!({ "id": id }))
}

/// Contract whose every input slot rejects `{}` and whose body echoes input.
fn strict_contract(called: Arc<AtomicBool>) -> HandlerContract {
    let required = |field: &str| Schema::object(vec![(field, Schema::string().required())]);
    HandlerContract::register(
        Method::POST,
        "/strict/:key",
        HandlerSchemas::new(checked(Schema::any()))
            .query(checked(required("q")))
            .params(checked(required("key")))
            .body(checked(required("b"))),
        move |input| {
            called.store(true, Ordering::SeqCst);
            async move { Ok(json!([input.query, input.params, input.body])) }
        },
    )
    .unwrap()
}

fn strict_request(query: Value, params: Value, body: Value) -> RawRequest {
    RawRequest::new(Method::POST, "/strict/{key}")
        .with_query(query)
        .with_params(params)
        .with_body(body)
}

// ============================================================================
// Item scenario
// ============================================================================

#[tokio::test]
async fn test_numeric_param_is_decoded_and_response_written() {
    let contract = widget_contract();
    let mut writer = RecordingWriter::new();
    contract.execute(item_request("7"), &mut writer).await.unwrap();
    assert_eq!(writer.responses(), &[json!({ "name": "widget" })]);
}

#[tokio::test]
async fn test_non_numeric_param_is_invalid_params() {
    let contract = widget_contract();
    let mut writer = RecordingWriter::new();
    let err = contract
        .execute(item_request("abc"), &mut writer)
        .await
        .unwrap_err();

    assert_eq!(err.tag(), ErrorTag::InvalidParams);
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(writer.is_empty());

    let envelope = serde_json::to_value(err.to_envelope(None)).unwrap();
    assert_eq!(envelope["error"]["_tag"], "InvalidParamsError");
    assert_eq!(envelope["error"]["details"]["issues"][0]["path"], "$.id");
}

#[tokio::test]
async fn test_non_conforming_response_is_invalid_response() {
    let contract = HandlerContract::register(
        Method::GET,
        "/items/:id",
        HandlerSchemas::new(checked(Schema::object(vec![(
            "name",
            Schema::string().required(),
        )]))),
        |_input| async { Ok(json!({ "name": 42 })) },
    )
    .unwrap();

    let mut writer = RecordingWriter::new();
    let err = contract
        .execute(item_request("7"), &mut writer)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidResponse);
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(writer.is_empty());
}

#[tokio::test]
async fn test_null_response_against_object_schema_is_invalid_response() {
    let contract = HandlerContract::register(
        Method::GET,
        "/items/:id",
        HandlerSchemas::new(checked(Schema::object(vec![(
            "name",
            Schema::string().required(),
        )]))),
        |_input| async { Ok(Value::Null) },
    )
    .unwrap();

    let mut writer = RecordingWriter::new();
    let err = contract
        .execute(item_request("7"), &mut writer)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidResponse);
    assert!(writer.is_empty());
}

#[tokio::test]
async fn test_missing_body_against_object_schema_is_invalid_body() {
    let called = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&called);
    let contract = HandlerContract::register(
        Method::POST,
        "/items",
        HandlerSchemas::new(checked(Schema::any())).body(checked(Schema::object(vec![(
            "name",
            Schema::string().required(),
        )]))),
        move |input| {
            seen.store(true, Ordering::SeqCst);
            async move { Ok(json!({ "got": input.body })) }
        },
    )
    .unwrap();

    let mut writer = RecordingWriter::new();
    let err = contract
        .execute(RawRequest::new(Method::POST, "/items"), &mut writer)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidBody);
    assert!(!called.load(Ordering::SeqCst));
    assert!(writer.is_empty());

    let envelope = serde_json::to_value(err.to_envelope(None)).unwrap();
    assert_eq!(envelope["error"]["details"]["issues"][0]["path"], "$");
}

// ============================================================================
// Slot / runtime agreement
// ============================================================================

#[tokio::test]
async fn test_absent_slots_accept_anything() {
    let contract = HandlerContract::register(
        Method::POST,
        "/echo",
        HandlerSchemas::new(checked(Schema::any())),
        |input| async move { Ok(json!([input.query, input.params, input.body])) },
    )
    .unwrap();

    let inputs = [
        json!(null),
        json!(17),
        json!("text"),
        json!({ "deep": { "nested": [1, 2, 3] } }),
    ];
    for raw in inputs {
        let mut writer = RecordingWriter::new();
        contract
            .execute(
                RawRequest::new(Method::POST, "/echo")
                    .with_query(raw.clone())
                    .with_params(raw.clone())
                    .with_body(raw.clone()),
                &mut writer,
            )
            .await
            .unwrap();
        assert_eq!(writer.responses(), &[json!([raw, raw, raw])]);
    }
}

#[tokio::test]
async fn test_present_slot_rejects_what_validator_rejects() {
    let api = items_api();
    let create = api.contract(&Method::POST, "/items").unwrap();

    let mut writer = RecordingWriter::new();
    let err = create
        .execute(
            RawRequest::new(Method::POST, "/items").with_body(json!({ "name": "" })),
            &mut writer,
        )
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidBody);

    let mut writer = RecordingWriter::new();
    create
        .execute(
            RawRequest::new(Method::POST, "/items").with_body(json!({ "name": "spring" })),
            &mut writer,
        )
        .await
        .unwrap();
    assert_eq!(writer.responses(), &[json!({ "name": "spring" })]);
}

// ============================================================================
// Validation order
// ============================================================================

#[tokio::test]
async fn test_all_invalid_reports_query() {
    let called = Arc::new(AtomicBool::new(false));
    let contract = strict_contract(Arc::clone(&called));
    let mut writer = RecordingWriter::new();

    let err = contract
        .execute(strict_request(json!({}), json!({}), json!({})), &mut writer)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidQuery);
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_valid_query_invalid_params_and_body_reports_params() {
    let called = Arc::new(AtomicBool::new(false));
    let contract = strict_contract(Arc::clone(&called));
    let mut writer = RecordingWriter::new();

    let err = contract
        .execute(
            strict_request(json!({ "q": "x" }), json!({}), json!({})),
            &mut writer,
        )
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidParams);
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_only_body_invalid_reports_body() {
    let called = Arc::new(AtomicBool::new(false));
    let contract = strict_contract(Arc::clone(&called));
    let mut writer = RecordingWriter::new();

    let err = contract
        .execute(
            strict_request(json!({ "q": "x" }), json!({ "key": "k" }), json!([])),
            &mut writer,
        )
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::InvalidBody);
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_all_valid_reaches_body() {
    let called = Arc::new(AtomicBool::new(false));
    let contract = strict_contract(Arc::clone(&called));
    let mut writer = RecordingWriter::new();

    contract
        .execute(
            strict_request(json!({ "q": "x" }), json!({ "key": "k" }), json!({ "b": "y" })),
            &mut writer,
        )
        .await
        .unwrap();
    assert!(called.load(Ordering::SeqCst));
    assert_eq!(
        writer.responses(),
        &[json!([{ "q": "x" }, { "key": "k" }, { "b": "y" }])]
    );
}

// ============================================================================
// Error propagation
// ============================================================================

#[tokio::test]
async fn test_handler_server_error_is_not_reclassified() {
    let contract = HandlerContract::register(
        Method::PUT,
        "/ledger",
        HandlerSchemas::new(checked(Schema::any())),
        |_input| async { Err::<Value, _>(ApiError::server("ledger locked")) },
    )
    .unwrap();

    let mut writer = RecordingWriter::new();
    let err = contract
        .execute(RawRequest::new(Method::PUT, "/ledger"), &mut writer)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::Server);

    let envelope = serde_json::to_string(&err.to_envelope(None)).unwrap();
    assert!(!envelope.contains("ledger locked"));
}

#[tokio::test]
async fn test_anyhow_failure_in_handler_is_unexpected() {
    let contract = HandlerContract::register(
        Method::GET,
        "/config",
        HandlerSchemas::new(checked(Schema::any())),
        |_input| async {
            let parsed: Value = serde_json::from_str("{not json").map_err(anyhow::Error::from)?;
            Ok::<_, ApiError>(parsed)
        },
    )
    .unwrap();

    let mut writer = RecordingWriter::new();
    let err = contract
        .execute(RawRequest::new(Method::GET, "/config"), &mut writer)
        .await
        .unwrap_err();
    assert_eq!(err.tag(), ErrorTag::UnexpectedServer);
}

// ============================================================================
// Cancellation
// ============================================================================

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_cancel_while_handler_suspended() {
    let entered = Arc::new(Notify::new());
    let released = Arc::new(AtomicBool::new(false));

    let entered_signal = Arc::clone(&entered);
    let released_flag = Arc::clone(&released);
    let contract = HandlerContract::register(
        Method::GET,
        "/slow",
        HandlerSchemas::new(checked(Schema::any())),
        move |_input| {
            let entered = Arc::clone(&entered_signal);
            let guard = DropFlag(Arc::clone(&released_flag));
            async move {
                let _guard = guard;
                entered.notify_one();
                std::future::pending::<()>().await;
                Ok(json!("unreachable"))
            }
        },
    )
    .unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    let waiter = Arc::clone(&entered);
    tokio::spawn(async move {
        waiter.notified().await;
        canceller.cancel();
    });

    let mut writer = RecordingWriter::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        contract.execute_with_cancel(RawRequest::new(Method::GET, "/slow"), &mut writer, &token),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Outcome::Cancelled));
    assert!(writer.is_empty());
    assert!(released.load(Ordering::SeqCst), "handler state was not dropped");
}

#[tokio::test]
async fn test_concurrent_executions_share_one_contract() {
    let contract = Arc::new(widget_contract());
    let mut tasks = Vec::new();
    for id in 1..=16 {
        let contract = Arc::clone(&contract);
        tasks.push(tokio::spawn(async move {
            let mut writer = RecordingWriter::new();
            contract
                .execute(item_request(&id.to_string()), &mut writer)
                .await
                .map(|()| writer.len())
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }
}
