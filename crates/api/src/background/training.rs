//! Simulated training jobs.
//!
//! There is no real model training: completing a batch upload schedules a
//! fixed-duration delay, after which the record flips `training -> ready`
//! and gains a synthetic model endpoint. The delay runs on tokio's clock,
//! so tests under a paused runtime advance it deterministically instead of
//! waiting wall-clock time. All jobs stop at shutdown via a shared
//! cancellation token.

use std::time::Duration;

use studio_core::character::CharacterStatus;
use studio_core::types::CharacterId;
use studio_store::DynCharacterStore;
use tokio_util::sync::CancellationToken;

pub struct TrainingScheduler {
    store: DynCharacterStore,
    delay: Duration,
    project_id: String,
    cancel: CancellationToken,
}

impl TrainingScheduler {
    pub fn new(store: DynCharacterStore, delay: Duration, project_id: impl Into<String>) -> Self {
        Self {
            store,
            delay,
            project_id: project_id.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Schedule completion of a record currently in `training` status.
    pub fn schedule(&self, character_id: CharacterId) {
        let store = self.store.clone();
        let delay = self.delay;
        let cancel = self.cancel.clone();
        let endpoint = format!(
            "projects/{}/models/{}",
            self.project_id,
            uuid::Uuid::new_v4()
        );

        tracing::info!(
            character_id = %character_id,
            delay_secs = delay.as_secs(),
            "Training job scheduled"
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(character_id = %character_id, "Training job cancelled at shutdown");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match store
                .update_status(&character_id, CharacterStatus::Ready, Some(endpoint))
                .await
            {
                Ok(()) => {
                    tracing::info!(character_id = %character_id, "Training complete");
                }
                Err(e) => {
                    tracing::error!(
                        character_id = %character_id,
                        error = %e,
                        "Failed to complete training; marking record failed"
                    );
                    // Best effort -- the record may already be gone.
                    if let Err(e) = store
                        .update_status(&character_id, CharacterStatus::Failed, None)
                        .await
                    {
                        tracing::error!(
                            character_id = %character_id,
                            error = %e,
                            "Failed to mark record failed; manual remediation required"
                        );
                    }
                }
            }
        });
    }

    /// Stop all pending jobs. Called during graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
