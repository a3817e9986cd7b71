use std::sync::Arc;

use studio_blobs::DynBlobStore;
use studio_inference::DynInferenceClient;
use studio_store::DynCharacterStore;

use crate::auth::verifier::DynTokenVerifier;
use crate::background::training::TrainingScheduler;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Every service is an explicitly constructed, injected object so tests can
/// substitute in-memory fakes. Cheaply cloneable (inner data is behind
/// `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Character document store.
    pub store: DynCharacterStore,
    /// Image blob store.
    pub blobs: DynBlobStore,
    /// Generative-model client.
    pub inference: DynInferenceClient,
    /// Bearer-token verifier.
    pub verifier: DynTokenVerifier,
    /// Simulated-training scheduler.
    pub trainer: Arc<TrainingScheduler>,
}
