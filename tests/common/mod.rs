#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use books_api::{
    broker::{BrokerError, MessageProducer},
    config::Config,
    entities::{author, book},
    migration::Migrator,
    routes::{self, AppState},
    service::BooksService,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tower::ServiceExt;

pub const APP_NAME: &str = "booksApp";

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Captures every published message on a channel.
pub struct RecordingProducer {
    sender: mpsc::UnboundedSender<(String, Vec<u8>)>,
}

impl RecordingProducer {
    pub fn new() -> (Self, Arc<Mutex<mpsc::UnboundedReceiver<(String, Vec<u8>)>>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, Arc::new(Mutex::new(receiver)))
    }
}

#[async_trait]
impl MessageProducer for RecordingProducer {
    async fn send_message(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.sender
            .send((topic.to_string(), payload))
            .map_err(|e| BrokerError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })
    }
}

/// Rejects every message, like a broker that went away.
pub struct FailingProducer;

#[async_trait]
impl MessageProducer for FailingProducer {
    async fn send_message(&self, topic: &str, _payload: Vec<u8>) -> Result<(), BrokerError> {
        Err(BrokerError::Publish {
            topic: topic.to_string(),
            message: "broker unavailable".to_string(),
        })
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.app_name = APP_NAME.to_string();
    config
}

pub fn setup_test_app_with_producer(
    db: DatabaseConnection,
    producer: Arc<dyn MessageProducer>,
) -> Router {
    let service = BooksService::new(db, producer);
    routes::router(AppState::new(service, test_config()))
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub messages: Arc<Mutex<mpsc::UnboundedReceiver<(String, Vec<u8>)>>>,
}

pub async fn setup_test_app() -> TestApp {
    let db = setup_test_db()
        .await
        .expect("Failed to setup test database");
    let (producer, messages) = RecordingProducer::new();
    let router = setup_test_app_with_producer(db.clone(), Arc::new(producer));
    TestApp {
        router,
        db,
        messages,
    }
}

pub async fn insert_author(db: &DatabaseConnection, name: &str) -> author::Model {
    author::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to insert author")
}

pub async fn insert_book(
    db: &DatabaseConnection,
    title: &str,
    price: f64,
    author_id: Option<i64>,
) -> book::Model {
    book::ActiveModel {
        id: NotSet,
        title: Set(title.to_string()),
        price: Set(price),
        author_id: Set(author_id),
    }
    .insert(db)
    .await
    .expect("Failed to insert book")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    send_with_content_type(router, method, uri, body, "application/json").await
}

pub async fn send_with_content_type(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    content_type: &str,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", content_type);
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri, None).await
}

/// Ids returned by `GET /api/books?{query}` (one large page, sorted by id).
pub async fn listed_ids(router: &Router, query: &str) -> Vec<i64> {
    let separator = if query.is_empty() { "" } else { "&" };
    let response = get(
        router,
        &format!("/api/books?{query}{separator}sort=id,asc&size=1000"),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "GET ?{query}: {}", response.body);
    response
        .body
        .as_array()
        .expect("list body is an array")
        .iter()
        .map(|book| book["id"].as_i64().expect("book id"))
        .collect()
}

/// `GET /api/books/count?{query}`.
pub async fn counted(router: &Router, query: &str) -> u64 {
    let response = get(router, &format!("/api/books/count?{query}")).await;
    assert_eq!(response.status, StatusCode::OK, "count ?{query}: {}", response.body);
    response.body.as_u64().expect("count body is a number")
}

/// Asserts that list and count agree and that `expected` is exactly the
/// result of the filter.
pub async fn assert_books_found(router: &Router, query: &str, expected: &[i64]) {
    let ids = listed_ids(router, query).await;
    assert_eq!(ids, expected, "list for ?{query}");
    assert_eq!(counted(router, query).await, ids.len() as u64, "count for ?{query}");
}

pub async fn assert_books_not_found(router: &Router, query: &str) {
    assert_books_found(router, query, &[]).await;
}

pub fn escape(value: &str) -> String {
    url_escape::encode_component(value).into_owned()
}
