//! Best-effort outbound messaging.
//!
//! A created book is announced on [`PUBLISH_BOOK`]. Publishing is detached
//! from the request: failures are logged and dropped, never retried.

use async_trait::async_trait;
use std::{fmt, sync::Arc};
use tokio::task::JoinHandle;

/// Topic that receives the JSON of every created book.
pub const PUBLISH_BOOK: &str = "publish_book";

#[derive(Debug)]
pub enum BrokerError {
    Connect(String),
    Publish { topic: String, message: String },
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(message) => write!(f, "Failed to connect to message broker: {message}"),
            Self::Publish { topic, message } => {
                write!(f, "Failed to publish to {topic}: {message}")
            }
        }
    }
}

impl std::error::Error for BrokerError {}

#[async_trait]
pub trait MessageProducer: Send + Sync {
    async fn send_message(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}

/// Publishes to a NATS server, one subject per topic.
#[derive(Clone)]
pub struct NatsProducer {
    client: async_nats::Client,
}

impl NatsProducer {
    /// # Errors
    ///
    /// Returns [`BrokerError::Connect`] when the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = async_nats::ConnectOptions::new()
            .name("books-api")
            .connect(url)
            .await
            .map_err(|e| BrokerError::Connect(format!("{url}: {e}")))?;
        tracing::info!(url, "Connected to message broker");
        Ok(Self { client })
    }
}

#[async_trait]
impl MessageProducer for NatsProducer {
    async fn send_message(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.client
            .publish(topic.to_string(), payload.into())
            .await
            .map_err(|e| BrokerError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })
    }
}

/// Stand-in used when no broker is configured: messages are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProducer;

#[async_trait]
impl MessageProducer for LogProducer {
    async fn send_message(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        tracing::info!(
            topic,
            payload = %String::from_utf8_lossy(&payload),
            "No broker configured, message not sent"
        );
        Ok(())
    }
}

/// Sends `payload` on a spawned task. Errors are logged and discarded.
pub fn publish_detached(
    producer: Arc<dyn MessageProducer>,
    topic: impl Into<String>,
    payload: Vec<u8>,
) -> JoinHandle<()> {
    let topic = topic.into();
    tokio::spawn(async move {
        match producer.send_message(&topic, payload).await {
            Ok(()) => tracing::debug!(topic = %topic, "Message published"),
            Err(err) => tracing::warn!(topic = %topic, error = %err, "Dropping message"),
        }
    })
}
