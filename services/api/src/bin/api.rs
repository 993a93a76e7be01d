//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, InMemoryDb, OpenAiRecommendationAdapter, OpenAiTutorAdapter,
        ResilientRecommender, ResilientTutor,
    },
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use study_tracker_core::{
    ports::{DatabaseService, RecommendationService, TutorService},
    StudyTracker, SystemClock,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart.");
            Arc::new(InMemoryDb::new())
        }
    };

    // --- 3. Initialize the AI Gateways ---
    let (primary, tutor): (
        Option<Arc<dyn RecommendationService>>,
        Option<Arc<dyn TutorService>>,
    ) = match &config.openai_api_key {
        Some(api_key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            info!(model = %config.recommendation_model, "Recommendation gateway enabled");
            info!(model = %config.tutor_model, "AI tutor enabled for doubts");
            let tutor: Arc<dyn TutorService> = Arc::new(ResilientTutor::new(
                Arc::new(OpenAiTutorAdapter::new(
                    openai_client.clone(),
                    config.tutor_model.clone(),
                )),
                config.tutor_timeout,
            ));
            let primary: Arc<dyn RecommendationService> = Arc::new(
                OpenAiRecommendationAdapter::new(openai_client, config.recommendation_model.clone()),
            );
            (Some(primary), Some(tutor))
        }
        None => {
            info!("OPENAI_API_KEY not set; recommendations use the static fallback, doubts get no AI answer.");
            (None, None)
        }
    };
    let recommender = Arc::new(ResilientRecommender::new(
        primary,
        config.recommendation_timeout,
    ));

    // --- 4. Build the Shared AppState ---
    let tracker = Arc::new(StudyTracker::new(db, Arc::new(SystemClock), config.scoring));
    let app_state = Arc::new(AppState {
        tracker,
        recommender,
        tutor,
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    let app = build_router(app_state)?;

    // --- 6. Start the Server ---
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for the shutdown signal: {}", e);
                return;
            }
            info!("Shutdown signal received, draining connections...");
            shutdown.cancel();
        }
    });

    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped.");
    Ok(())
}
