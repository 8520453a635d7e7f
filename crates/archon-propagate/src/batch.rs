// batch.rs — The asynchronous batch that applies a policy to a target set.
//
// State machine: Pending -> Running -> Completed | PartiallyFailed.
// Targets are enumerated lazily from the object store and written one at a
// time. A failed target is recorded and the batch moves on; there is no
// rollback of targets already written. The invoker polls progress through
// the handle or awaits the final report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use archon_repo::{ObjectId, ObjectStore};

use crate::error::{BatchError, PropagationError};
use crate::selector::QueryChoice;

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Pending,
    Running,
    Completed,
    PartiallyFailed,
}

/// A propagation request: the finalized policy, the object it was edited on,
/// and the chosen scope.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub job_id: Uuid,
    pub serialized_policy: Vec<u8>,
    pub root: ObjectId,
    pub choice: QueryChoice,
    pub started_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn new(serialized_policy: Vec<u8>, root: impl Into<ObjectId>, choice: QueryChoice) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            serialized_policy,
            root: root.into(),
            choice,
            started_at: Utc::now(),
        }
    }
}

/// Point-in-time snapshot surfaced while the batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub state: BatchState,
    pub processed: usize,
    pub total: usize,
    pub failed: usize,
}

/// Terminal summary for the invoking collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub job_id: Uuid,
    pub state: BatchState,
    pub processed: usize,
    pub total: usize,
    /// Per-target failures in the order they were hit.
    pub failures: Vec<(ObjectId, PropagationError)>,
}

/// Handle to a running batch: poll progress, await the report, or abandon it.
pub struct BatchHandle {
    job_id: Uuid,
    progress: watch::Receiver<BatchProgress>,
    task: JoinHandle<BatchReport>,
}

impl BatchHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Latest progress snapshot, observable while the batch runs.
    pub fn progress(&self) -> BatchProgress {
        *self.progress.borrow()
    }

    /// A receiver for callers that want to await progress changes.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.clone()
    }

    /// Await the terminal report.
    pub async fn join(self) -> Result<BatchReport, BatchError> {
        match self.task.await {
            Ok(report) => Ok(report),
            Err(e) if e.is_cancelled() => Err(BatchError::Aborted),
            Err(e) => Err(BatchError::Panicked(e.to_string())),
        }
    }

    /// Abandon the batch. The task stops between targets; already-written
    /// targets keep their new policy.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Spawns batch jobs onto the ambient tokio runtime.
pub struct BatchPropagator;

impl BatchPropagator {
    /// Start a batch on a background task and return its handle.
    ///
    /// Must be called within a tokio runtime. The interactive edit path
    /// never blocks on the batch: the handle is the only coupling.
    pub fn spawn(store: Arc<dyn ObjectStore>, job: BatchJob) -> BatchHandle {
        let job_id = job.job_id;
        let (tx, rx) = watch::channel(BatchProgress {
            state: BatchState::Pending,
            processed: 0,
            total: 0,
            failed: 0,
        });
        let task = tokio::spawn(run(store, job, tx));
        BatchHandle {
            job_id,
            progress: rx,
            task,
        }
    }
}

async fn run(
    store: Arc<dyn ObjectStore>,
    job: BatchJob,
    tx: watch::Sender<BatchProgress>,
) -> BatchReport {
    let restrict = job.choice.restricted_to_types.clone();
    let traversal = job.choice.traversal;
    let mut processed = 0;
    let mut failures: Vec<(ObjectId, PropagationError)> = Vec::new();

    tracing::info!(
        job_id = %job.job_id,
        root = %job.root,
        scope = %job.choice.key,
        "starting policy propagation batch"
    );

    let total = match store.count_children(&job.root, traversal, restrict.as_ref()) {
        Ok(total) => total,
        Err(e) => {
            failures.push((
                job.root.clone(),
                PropagationError::Enumeration {
                    reason: e.to_string(),
                },
            ));
            return finish(&job, &tx, processed, 0, failures);
        }
    };

    let _ = tx.send(BatchProgress {
        state: BatchState::Running,
        processed,
        total,
        failed: 0,
    });

    let targets = match store.children(&job.root, traversal, restrict.as_ref()) {
        Ok(targets) => targets,
        Err(e) => {
            failures.push((
                job.root.clone(),
                PropagationError::Enumeration {
                    reason: e.to_string(),
                },
            ));
            return finish(&job, &tx, processed, total, failures);
        }
    };

    for item in targets {
        // Cancellation point: an aborted batch stops here, never mid-write.
        tokio::task::yield_now().await;

        match item {
            Ok(id) => {
                let outcome = store
                    .load(&id)
                    .and_then(|_| store.write_policy(&id, &job.serialized_policy));
                processed += 1;
                if let Err(e) = outcome {
                    tracing::warn!(job_id = %job.job_id, target = %id, error = %e, "target failed");
                    failures.push((id.clone(), PropagationError::from_repo(&id, e)));
                }
            }
            Err(e) => {
                // The walk itself broke; record it once and stop with what
                // we have. Previously written targets stand.
                failures.push((
                    job.root.clone(),
                    PropagationError::Enumeration {
                        reason: e.to_string(),
                    },
                ));
                break;
            }
        }

        let _ = tx.send(BatchProgress {
            state: BatchState::Running,
            processed,
            total,
            failed: failures.len(),
        });
    }

    finish(&job, &tx, processed, total, failures)
}

fn finish(
    job: &BatchJob,
    tx: &watch::Sender<BatchProgress>,
    processed: usize,
    total: usize,
    failures: Vec<(ObjectId, PropagationError)>,
) -> BatchReport {
    let state = if failures.is_empty() {
        BatchState::Completed
    } else {
        BatchState::PartiallyFailed
    };
    let _ = tx.send(BatchProgress {
        state,
        processed,
        total,
        failed: failures.len(),
    });
    tracing::info!(
        job_id = %job.job_id,
        ?state,
        processed,
        total,
        failed = failures.len(),
        "batch finished"
    );
    BatchReport {
        job_id: job.job_id,
        state,
        processed,
        total,
        failures,
    }
}
