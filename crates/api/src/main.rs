use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_api::auth::firebase::FirebaseVerifier;
use studio_api::auth::verifier::{DynTokenVerifier, StaticVerifier};
use studio_api::background::training::TrainingScheduler;
use studio_api::config::{BlobBackend, ServerConfig, StoreBackend};
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_blobs::sign::HmacKey;
use studio_blobs::{DynBlobStore, GcsStore, MemoryBlobStore};
use studio_gcp::{ServiceAccountKey, TokenProvider, SCOPE_CLOUD_PLATFORM};
use studio_inference::{DynInferenceClient, GeminiClient, GeminiConfig};
use studio_store::{DynCharacterStore, FirestoreStore, MemoryStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studio_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, env = %config.app_env, "Loaded server configuration");

    let http = reqwest::Client::new();

    // --- Google token provider (shared by Firestore and GCS clients) ---
    let needs_google = config.store_backend == StoreBackend::Firestore
        || config.blob_backend == BlobBackend::Gcs;
    let tokens = if needs_google {
        let key = ServiceAccountKey::from_env().expect("Failed to load service account key");
        Some(Arc::new(TokenProvider::new(
            http.clone(),
            key,
            SCOPE_CLOUD_PLATFORM,
        )))
    } else {
        None
    };

    // --- Document store ---
    let store: DynCharacterStore = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreStore::new(
            http.clone(),
            Arc::clone(tokens.as_ref().expect("token provider required")),
            config.project_id.clone(),
            config.collection.clone(),
        )),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Blob store ---
    let blobs: DynBlobStore = match config.blob_backend {
        BlobBackend::Gcs => {
            let hmac_key = match (
                std::env::var("GCS_HMAC_ACCESS_ID"),
                std::env::var("GCS_HMAC_SECRET"),
            ) {
                (Ok(access_id), Ok(secret)) => Some(HmacKey { access_id, secret }),
                _ => {
                    tracing::warn!("GCS HMAC key not configured; signed uploads disabled");
                    None
                }
            };
            Arc::new(GcsStore::new(
                http.clone(),
                Arc::clone(tokens.as_ref().expect("token provider required")),
                config.bucket.clone(),
                hmac_key,
            ))
        }
        BlobBackend::Memory => {
            tracing::warn!("Using in-memory blob store; data will not survive restarts");
            Arc::new(MemoryBlobStore::new())
        }
    };

    // --- Inference client ---
    let inference: DynInferenceClient =
        Arc::new(GeminiClient::new(http.clone(), GeminiConfig::from_env()));

    // --- Token verifier ---
    let verifier: DynTokenVerifier = if config.auth_bypass {
        tracing::warn!(uid = %config.auth_bypass_uid, "AUTH BYPASS ENABLED; all requests use the fixed test identity");
        Arc::new(StaticVerifier::allow_all(config.auth_bypass_uid.clone()))
    } else {
        Arc::new(FirebaseVerifier::new(
            http.clone(),
            config.project_id.clone(),
        ))
    };

    // --- Training scheduler ---
    let trainer = Arc::new(TrainingScheduler::new(
        store.clone(),
        Duration::from_secs(config.training_delay_secs),
        config.project_id.clone(),
    ));

    // --- App state / router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        blobs,
        inference,
        verifier,
        trainer: Arc::clone(&trainer),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    trainer.shutdown();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
