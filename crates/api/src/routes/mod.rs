pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{characters, training, visualizations};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy (all require a Bearer token):
///
/// ```text
/// GET  /characters                                 library, newest first
/// POST /characters/pair                            paired creation
/// POST /characters/training                        batch-training begin
/// POST /characters/training/{id}/complete          uploads-complete notification
/// GET  /characters/{id}                            get by id
/// POST /characters/{id}/visualizations             save a visualization
/// POST /characters/{id}/visualizations/generate    generate (not persisted)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/characters", get(characters::list))
        .route("/characters/pair", post(characters::create_pair))
        .route("/characters/training", post(training::begin))
        .route(
            "/characters/training/{id}/complete",
            post(training::complete),
        )
        .route("/characters/{id}", get(characters::get_by_id))
        .route(
            "/characters/{id}/visualizations",
            post(visualizations::save),
        )
        .route(
            "/characters/{id}/visualizations/generate",
            post(visualizations::generate),
        )
}
