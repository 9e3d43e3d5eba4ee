mod config;
mod metrics;
mod routes;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use events::{EventSink, KafkaPublisher};
use extract::Gazetteer;
use graph::{GraphRetriever, Neo4jStore};
use query::{AnswerGenerator, GeminiClient, QueryPipeline};

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::routes::AppState;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so it can feed LOG_LEVEL
    let env_file = dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    init_tracing(&config.log_level);

    match env_file {
        Some(path) => tracing::info!(path = %path.display(), ".env loaded"),
        None => tracing::info!("No .env file found, using system environment variables"),
    }

    tracing::info!(
        service = %config.service_name,
        port = config.port,
        neo4j = %config.neo4j.uri,
        "Starting gateway"
    );

    // Graph store is mandatory
    let store = Neo4jStore::connect(&config.neo4j_config())
        .await
        .context("Failed to connect to Neo4j")?;

    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    let generator: Option<Arc<dyn AnswerGenerator>> = if config.llm_enabled() {
        let client = GeminiClient::new(config.llm.api_key.clone())
            .with_base_url(config.llm.base_url.clone())
            .with_model(config.llm.model.clone())
            .with_timeout(request_timeout);
        tracing::info!(model = %client.model(), "Gemini client initialized");
        Some(Arc::new(client))
    } else {
        tracing::warn!("GEMINI_API_KEY not set, LLM features will be disabled");
        None
    };

    let events = if config.events_enabled() {
        let publisher = KafkaPublisher::new(config.kafka.brokers.clone());
        tracing::info!(brokers = ?publisher.brokers(), "Kafka producer initialized");
        Some(EventSink::new(Arc::new(publisher), config.event_topics()))
    } else {
        tracing::warn!("Kafka not configured, events will not be published");
        None
    };

    let gazetteer = Gazetteer::new(&config.gazetteer);
    tracing::info!(entities = gazetteer.len(), "Gazetteer loaded");

    let retriever = GraphRetriever::new(gazetteer, Arc::new(store));
    let state = Arc::new(AppState {
        pipeline: QueryPipeline::new(retriever, generator, events),
        metrics: Metrics::new(),
        service_name: config.service_name.clone(),
    });

    let llm_enabled = state.pipeline.generation_enabled();
    let app = routes::router(state, request_timeout);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(
        address = %listener.local_addr()?,
        llm_enabled,
        "Server listening"
    );

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!("Shutting down server...");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(result) => {
            result??;
            tracing::info!("Server stopped gracefully");
        }
        Err(_) => tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Server forced to shutdown"
        ),
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
