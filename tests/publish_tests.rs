use axum::http::{Method, StatusCode};
use books_api::{CRUDResource, broker::PUBLISH_BOOK, models::Book};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;

mod common;
use common::{FailingProducer, send, setup_test_app, setup_test_app_with_producer, setup_test_db};

#[tokio::test]
async fn test_create_publishes_book_json() {
    let app = setup_test_app().await;

    let response = send(
        &app.router,
        Method::POST,
        "/api/books",
        Some(json!({"title": "Dune", "price": 10.0})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let (topic, payload) = timeout(Duration::from_secs(2), async {
        app.messages.lock().await.recv().await
    })
    .await
    .expect("message published in time")
    .expect("channel open");

    assert_eq!(topic, PUBLISH_BOOK);
    let published: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(published, response.body);
}

#[tokio::test]
async fn test_rejected_create_publishes_nothing() {
    let app = setup_test_app().await;

    let response = send(&app.router, Method::POST, "/api/books", Some(json!({"price": 1.0}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let with_id = send(
        &app.router,
        Method::POST,
        "/api/books",
        Some(json!({"id": 7, "title": "Dune", "price": 1.0})),
    )
    .await;
    assert_eq!(with_id.status, StatusCode::BAD_REQUEST);

    let received = timeout(Duration::from_millis(200), async {
        app.messages.lock().await.recv().await
    })
    .await;
    assert!(received.is_err(), "nothing should be published");
}

#[tokio::test]
async fn test_updates_and_deletes_are_not_published() {
    let app = setup_test_app().await;
    let book = common::insert_book(&app.db, "Emma", 7.25, None).await;
    let uri = format!("/api/books/{}", book.id);

    send(
        &app.router,
        Method::PUT,
        &uri,
        Some(json!({"id": book.id, "title": "Persuasion", "price": 8.0})),
    )
    .await;
    send(&app.router, Method::DELETE, &uri, None).await;

    let received = timeout(Duration::from_millis(200), async {
        app.messages.lock().await.recv().await
    })
    .await;
    assert!(received.is_err(), "nothing should be published");
}

#[tokio::test]
async fn test_broker_failure_does_not_fail_create() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let router = setup_test_app_with_producer(db.clone(), Arc::new(FailingProducer));

    let response = send(
        &router,
        Method::POST,
        "/api/books",
        Some(json!({"title": "Dune", "price": 10.0})),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.body["id"].as_i64().unwrap();
    assert!(Book::exists(&db, id).await.unwrap());
}
