//! Compensation step log for multi-resource request flows.
//!
//! Handlers that touch several external resources in sequence (inference,
//! blob writes, document writes) record an undo step after each committed
//! side effect. On failure the handler runs [`Saga::compensate`], which
//! replays the recorded steps in reverse order. Compensation failures are
//! collected into a [`CompensationError`] so callers can report them as a
//! distinct error kind instead of a lost log line.

use std::future::Future;
use std::pin::Pin;

type StepFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

struct Step {
    name: String,
    run: Box<dyn FnOnce() -> StepFuture + Send>,
}

/// One or more compensation steps failed while unwinding a request.
///
/// `failed` holds the names of the steps whose undo action returned an
/// error, in the order they were attempted. The affected resources require
/// manual remediation.
#[derive(Debug, thiserror::Error)]
#[error("compensation failed for steps: {:?}", .failed)]
pub struct CompensationError {
    pub failed: Vec<String>,
}

/// An in-memory log of undo steps for one request.
#[derive(Default)]
pub struct Saga {
    steps: Vec<Step>,
}

impl Saga {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an undo step for a side effect that just committed.
    ///
    /// The closure is only invoked if the saga is later compensated.
    pub fn record<F, Fut>(&mut self, name: impl Into<String>, run: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.steps.push(Step {
            name: name.into(),
            run: Box::new(move || Box::pin(run())),
        });
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Discard the step log after the request committed fully.
    pub fn commit(mut self) {
        self.steps.clear();
    }

    /// Run every recorded step in reverse order.
    ///
    /// All steps are attempted even if an earlier one fails; failures are
    /// collected into the returned [`CompensationError`].
    pub async fn compensate(self) -> Result<(), CompensationError> {
        let mut failed = Vec::new();
        for step in self.steps.into_iter().rev() {
            if let Err(reason) = (step.run)().await {
                failed.push(format!("{} ({reason})", step.name));
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(CompensationError { failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn tracking_saga(log: &Arc<Mutex<Vec<&'static str>>>) -> Saga {
        let mut saga = Saga::new();
        for name in ["first", "second", "third"] {
            let log = Arc::clone(log);
            saga.record(name, move || async move {
                log.lock().unwrap().push(name);
                Ok(())
            });
        }
        saga
    }

    #[tokio::test]
    async fn compensates_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let saga = tracking_saga(&log);

        saga.compensate().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn commit_discards_steps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let saga = tracking_saga(&log);

        saga.commit();

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_steps_are_collected_not_dropped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new();

        {
            let log = Arc::clone(&log);
            saga.record("delete-blob", move || async move {
                log.lock().unwrap().push("delete-blob");
                Ok(())
            });
        }
        saga.record("delete-document", || async {
            Err("store unavailable".to_string())
        });

        let err = saga.compensate().await.unwrap_err();

        // The failing step is reported by name with its reason.
        assert_eq!(err.failed.len(), 1);
        assert!(err.failed[0].contains("delete-document"));
        assert!(err.failed[0].contains("store unavailable"));

        // Later steps still ran despite the earlier failure.
        assert_eq!(*log.lock().unwrap(), vec!["delete-blob"]);
    }

    #[tokio::test]
    async fn empty_saga_compensates_cleanly() {
        assert!(Saga::new().compensate().await.is_ok());
    }
}
