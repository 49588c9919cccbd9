//! Compensating-action sequences.
//!
//! A [`Saga`] records, for every step that has already succeeded, the action
//! that undoes it. If a later step fails the caller calls [`Saga::abort`],
//! which runs the compensations newest first. A failing compensation is
//! logged and collected; the remaining ones still run.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, error};

type Compensation<'a> = Box<dyn FnOnce() -> BoxFuture<'a, anyhow::Result<()>> + Send + 'a>;

#[derive(Debug)]
pub struct CompensationFailure {
    pub step: &'static str,
    pub error: anyhow::Error,
}

pub struct Saga<'a> {
    name: &'static str,
    compensations: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            compensations: Vec::new(),
        }
    }

    /// Register the undo action for a step that just succeeded.
    pub fn on_rollback<F, Fut>(&mut self, step: &'static str, undo: F)
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'a,
    {
        self.compensations.push((
            step,
            Box::new(move || -> BoxFuture<'a, anyhow::Result<()>> { Box::pin(undo()) }),
        ));
    }

    /// Every step succeeded; drop the compensations.
    pub fn commit(self) {
        debug!(saga = self.name, steps = self.compensations.len(), "saga committed");
    }

    /// Undo completed steps in reverse order.
    pub async fn abort(self) -> Vec<CompensationFailure> {
        let Saga {
            name,
            compensations,
        } = self;
        let mut failures = Vec::new();
        for (step, undo) in compensations.into_iter().rev() {
            match undo().await {
                Ok(()) => debug!(saga = name, step, "compensation applied"),
                Err(error) => {
                    error!(saga = name, step, error = %error, "compensation failed");
                    failures.push(CompensationFailure { step, error });
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use tracing_test::traced_test;

    fn recorder() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn abort_runs_compensations_newest_first() {
        let log = recorder();
        let mut saga = Saga::new("test");
        for step in ["first", "second", "third"] {
            let log = log.clone();
            saga.on_rollback(step, move || async move {
                log.lock().unwrap().push(step);
                Ok(())
            });
        }

        let failures = saga.abort().await;
        assert!(failures.is_empty());
        assert_eq!(*log.lock().unwrap(), ["third", "second", "first"]);
    }

    #[tokio::test]
    #[traced_test]
    async fn failing_compensation_is_logged_and_the_rest_still_run() {
        let log = recorder();
        let mut saga = Saga::new("test");
        {
            let log = log.clone();
            saga.on_rollback("delete row", move || async move {
                log.lock().unwrap().push("delete row");
                Ok(())
            });
        }
        saga.on_rollback("release lease", || async { Err(anyhow::anyhow!("lease server gone")) });

        let failures = saga.abort().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step, "release lease");
        assert_eq!(*log.lock().unwrap(), ["delete row"]);
        assert!(logs_contain("compensation failed"));
        assert!(logs_contain("lease server gone"));
    }

    #[tokio::test]
    async fn commit_discards_compensations() {
        let log = recorder();
        let mut saga = Saga::new("test");
        {
            let log = log.clone();
            saga.on_rollback("step", move || async move {
                log.lock().unwrap().push("ran");
                Ok(())
            });
        }
        saga.commit();
        assert!(log.lock().unwrap().is_empty());
    }
}
