use books_api::{
    broker::{LogProducer, MessageProducer, NatsProducer},
    config::Config,
    migration::Migrator,
    routes::{self, AppState},
    service::BooksService,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("books_api=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    let db = Database::connect(config.database.url.as_str()).await?;
    Migrator::up(&db, None).await?;

    let producer = connect_broker(&config).await;
    let service = BooksService::with_topic(db, producer, config.broker.topic.clone());

    let addr = config.server.addr();
    let app = routes::router(AppState::new(service, config)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Falls back to logging messages when no broker is configured or reachable.
async fn connect_broker(config: &Config) -> Arc<dyn MessageProducer> {
    let Some(url) = &config.broker.url else {
        tracing::info!("No broker configured, created books will only be logged");
        return Arc::new(LogProducer);
    };

    match NatsProducer::connect(url).await {
        Ok(producer) => Arc::new(producer),
        Err(err) => {
            tracing::warn!(error = %err, "Broker unavailable, created books will only be logged");
            Arc::new(LogProducer)
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
