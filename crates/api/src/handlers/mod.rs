pub mod characters;
pub mod training;
pub mod visualizations;

use studio_core::character::Character;
use studio_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Fetch a character and enforce the ownership invariant.
///
/// Missing records are 404; records owned by someone else are 403. The
/// foreign record is never returned.
pub(crate) async fn owned_character(
    state: &AppState,
    uid: &str,
    id: &str,
) -> AppResult<Character> {
    let character = state
        .store
        .get(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id: id.to_string(),
        }))?;

    if character.user_id != uid {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this character".into(),
        )));
    }
    Ok(character)
}

/// Run a saga's compensations after a failed multi-step flow.
///
/// Compensation failures cannot be retried automatically; they are logged
/// with the failed step names so the inconsistency is visible for manual
/// remediation. The caller still returns the original error.
pub(crate) async fn unwind(saga: studio_core::saga::Saga, flow: &'static str) {
    if saga.is_empty() {
        return;
    }
    tracing::warn!(flow, steps = saga.len(), "Unwinding partial flow");
    if let Err(compensation) = saga.compensate().await {
        tracing::error!(
            flow,
            error = %compensation,
            "Compensation failed; manual remediation required"
        );
    }
}
