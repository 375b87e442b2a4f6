//! Handler tests for the events domain
//!
//! These drive the event receiver routes end to end through `oneshot()`
//! against an in-memory document store:
//! - binary-mode ingest (headers → event → document)
//! - plain-text listing and purge
//! - status codes for degraded stores

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use database::{
    DatabaseError, DatabaseResult, DeleteTally, Document, DocumentMeta, DocumentStore,
    InMemoryDocumentStore,
};
use domain_events::*;
use http_body_util::BodyExt;
use mockall::mock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

mock! {
    pub Documents {}

    #[async_trait]
    impl DocumentStore for Documents {
        fn database_name(&self) -> &str;
        async fn list_all(&self) -> Vec<Document>;
        async fn count(&self) -> i64;
        async fn insert(&self, document: Document) -> DatabaseResult<DocumentMeta>;
        async fn delete_all(&self) -> DatabaseResult<DeleteTally>;
        async fn list_databases(&self) -> DatabaseResult<Vec<String>>;
    }
}

fn app<D: DocumentStore + 'static>(documents: D) -> Router {
    let environment = BTreeMap::from([
        ("K_SERVICE".to_string(), "events".to_string()),
        ("COUCHDB_PASSWORD".to_string(), "secret".to_string()),
    ]);
    events_router::<D>().with_state(Arc::new(EventService::new(documents, environment)))
}

// Helper to read a response body as text
async fn text_body(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn event_request(content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("ce-id", "A234-1234-1234")
        .header("ce-source", "https://example.org/test")
        .header("ce-type", "knative.eventing.test")
        .header("ce-specversion", "0.2")
        .header("traceparent", "0")
        .header("tracestate", "congo=4");
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_posted_event_is_listed() {
    let store = InMemoryDocumentStore::new("events");
    let app = app(store.clone());

    let response = app
        .clone()
        .oneshot(event_request(Some("application/json"), r#"{"test":"value"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app.oneshot(get("/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = text_body(response.into_body()).await;
    let blocks: Vec<&str> = body.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks[0], "NUMBER OF EVENTS (MAX 100 DISPLAYED): 1");
    assert_eq!(blocks.len(), 2);

    let event: Event = serde_json::from_str(blocks[1]).unwrap();
    assert_eq!(event.id, "A234-1234-1234");
    assert_eq!(event.event_type, "knative.eventing.test");
    assert_eq!(event.source, "https://example.org/test");
    assert_eq!(event.data.unwrap()["test"], "value");
    assert_eq!(event.extensions["traceparent"], "0");
    assert_eq!(event.extensions["tracestate"], "congo=4");
}

#[tokio::test]
async fn test_empty_store_message() {
    let app = app(InMemoryDocumentStore::new("events"));

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/v1/events")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            text_body(response.into_body()).await,
            "No events found in the database!"
        );
    }
}

#[tokio::test]
async fn test_delete_all_clears_store() {
    let store = InMemoryDocumentStore::new("events");
    let app = app(store.clone());

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(event_request(None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    assert_eq!(store.count().await, 3);

    let response = app
        .clone()
        .oneshot(get("/v1/events?deleteAll=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        text_body(response.into_body()).await,
        "All cloud events deleted. Remove the deleteAll parameter and reload the page."
    );

    let response = app.oneshot(get("/v1/events")).await.unwrap();
    assert_eq!(
        text_body(response.into_body()).await,
        "No events found in the database!"
    );
    assert!(store.list_all().await.is_empty());
}

#[tokio::test]
async fn test_status_marker() {
    let response = app(InMemoryDocumentStore::default())
        .oneshot(get("/v1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(text_body(response.into_body()).await, "{\"status\": \"UP\"}");
}

#[tokio::test]
async fn test_unsupported_content_type_is_not_stored() {
    let store = InMemoryDocumentStore::new("events");

    let response = app(store.clone())
        .oneshot(event_request(Some("text/plain"), "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(store.count().await, 0);
}

#[tokio::test]
async fn test_invalid_event_returns_500() {
    let store = InMemoryDocumentStore::new("events");

    let response = app(store.clone())
        .oneshot(event_request(Some("application/json"), "[1, 2, 3]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value =
        serde_json::from_str(&text_body(response.into_body()).await).unwrap();
    assert_eq!(body["message"], "ERROR: Exception processing received event");
    assert_eq!(store.count().await, 0);
}

#[tokio::test]
async fn test_unreachable_store_count_returns_500() {
    let store = InMemoryDocumentStore::new("events");
    store.set_available(false);

    let response = app(store).oneshot(get("/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        text_body(response.into_body()).await,
        "ERROR: Unable to retrieve number of events due to an unexpected error. See the application logs for details."
    );
}

#[tokio::test]
async fn test_partial_delete_is_reported() {
    let mut documents = MockDocuments::new();
    documents.expect_delete_all().returning(|| {
        Ok(DeleteTally {
            succeeded: 4,
            failed: 1,
        })
    });

    let response = app(documents)
        .oneshot(get("/v1/events?deleteAll=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        text_body(response.into_body())
            .await
            .ends_with("\n1 of 5 events could not be deleted. See the application logs for details.")
    );
}

#[tokio::test]
async fn test_failed_delete_returns_500() {
    let mut documents = MockDocuments::new();
    documents.expect_delete_all().returning(|| {
        Err(DatabaseError::BulkDeleteFailed(
            "connection refused".to_string(),
        ))
    });

    let response = app(documents)
        .oneshot(get("/v1/events?deleteAll=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value =
        serde_json::from_str(&text_body(response.into_body()).await).unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("ERROR: Exception while retrieving events: "));
    assert!(message.contains("connection refused"));
}

#[tokio::test]
async fn test_invalid_delete_all_value_is_rejected() {
    let response = app(InMemoryDocumentStore::default())
        .oneshot(get("/v1/events?deleteAll=maybe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_all_accepts_lenient_booleans() {
    for value in ["TRUE", "1", "on", "Yes"] {
        let store = InMemoryDocumentStore::new("events");
        let app = app(store.clone());

        let response = app
            .clone()
            .oneshot(event_request(None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = app
            .oneshot(get(&format!("/v1/events?deleteAll={}", value)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "deleteAll={}", value);
        assert_eq!(
            text_body(response.into_body()).await,
            "All cloud events deleted. Remove the deleteAll parameter and reload the page."
        );
        assert_eq!(store.count().await, 0, "deleteAll={}", value);
    }
}

#[tokio::test]
async fn test_delete_all_false_lists_events() {
    let store = InMemoryDocumentStore::new("events");
    let app = app(store.clone());
    app.clone()
        .oneshot(event_request(None, ""))
        .await
        .unwrap();

    let response = app.oneshot(get("/v1/events?deleteAll=OFF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        text_body(response.into_body())
            .await
            .starts_with("NUMBER OF EVENTS (MAX 100 DISPLAYED): 1\n\n")
    );
    assert_eq!(store.count().await, 1);
}

#[tokio::test]
async fn test_store_write_rejection_returns_500() {
    let mut documents = MockDocuments::new();
    documents.expect_insert().times(1).returning(|_| {
        Err(DatabaseError::WriteRejected(
            "Document update conflict.".to_string(),
        ))
    });

    let response = app(documents)
        .oneshot(event_request(Some("application/json"), r#"{"test":"value"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value =
        serde_json::from_str(&text_body(response.into_body()).await).unwrap();
    assert_eq!(body["message"], "ERROR: Exception processing received event");
}

#[tokio::test]
async fn test_extension_shadowing_an_attribute_is_not_stored() {
    let store = InMemoryDocumentStore::new("events");
    let mut request = event_request(Some("application/json"), r#"{"test":"value"}"#);
    request
        .headers_mut()
        .insert("ce-contenttype", "text/xml".parse().unwrap());
    request.headers_mut().insert("ce-data", "x".parse().unwrap());

    let response = app(store.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.count().await, 0);
}

#[tokio::test]
async fn test_listing_is_capped() {
    let store = InMemoryDocumentStore::new("events");
    for i in 0..(MAX_EVENTS + 5) {
        let document = codec::to_document(&Event::new(i.to_string(), "src", "t")).unwrap();
        store.insert(document).await.unwrap();
    }

    let response = app(store).oneshot(get("/v1/events")).await.unwrap();
    let body = text_body(response.into_body()).await;

    assert!(body.starts_with("NUMBER OF EVENTS (MAX 100 DISPLAYED): 105\n\n"));
    assert_eq!(body.matches("\"specversion\"").count(), MAX_EVENTS);
}

#[tokio::test]
async fn test_environment_report() {
    let response = app(InMemoryDocumentStore::new("events"))
        .oneshot(get("/v1/env"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        text_body(response.into_body()).await,
        "Available databases: events\nEnvironment:\nCOUCHDB_PASSWORD=********\nK_SERVICE=events"
    );
}
