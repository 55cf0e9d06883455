//! The module contains the sequential transaction queue.
//!
//! On-chain operations are dependent and irreversible: "transfer funds" must
//! finalize before "use transferred funds", and a committed step cannot be
//! rolled back. The queue therefore executes steps strictly in list order,
//! one at a time, and stops at the first failure. Retrying is the caller's
//! job, with a freshly built (possibly shortened) step list, since re-running
//! already-committed steps would duplicate their side effects.
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use crate::{EngineError, ResultEngine};

/// Opaque failure produced by an operation step.
///
/// The queue never inspects causes; they pass through to the caller on the
/// [`EngineError::StepFailed`] it returns.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for step closures.
pub type StepResult = Result<(), StepError>;

type StepFuture = Pin<Box<dyn Future<Output = StepResult> + Send>>;

/// A named, single-shot asynchronous unit of work with an external,
/// irreversible side effect.
///
/// Steps are opaque to the queue beyond success/failure. A step is attempted
/// at most once per run and may suspend for as long as it needs (waiting on
/// a network confirmation); the queue imposes no timeout.
pub struct OperationStep {
    label: String,
    action: Box<dyn FnOnce() -> StepFuture + Send>,
}

impl OperationStep {
    /// Wraps an async closure as a step.
    ///
    /// ```rust
    /// use engine::{OperationStep, StepResult};
    ///
    /// let step = OperationStep::new("wrap tokens", || async { StepResult::Ok(()) });
    /// assert_eq!(step.label(), "wrap tokens");
    /// ```
    pub fn new<F, Fut, E>(label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<StepError>,
    {
        Self {
            label: label.into(),
            action: Box::new(move || {
                let fut = action();
                Box::pin(async move { fut.await.map_err(Into::into) })
            }),
        }
    }

    /// Returns the human-readable step label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for OperationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationStep")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Failure information observable after a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    /// Zero-based index of the failed step.
    pub index: usize,
    pub label: String,
    /// Rendered failure cause; the boxed source travels on the error
    /// returned by [`TransactionQueue::run`].
    pub cause: String,
}

/// Progress of a completed run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Default)]
struct RunState {
    busy: AtomicBool,
    completed: AtomicUsize,
    total: AtomicUsize,
    failure: Mutex<Option<StepFailure>>,
}

/// Executes ordered lists of dependent on-chain operations, one run at a
/// time.
///
/// The queue owns its run state; external observers (progress UI) read the
/// busy flag, completed count and last failure but never mutate them. Clones
/// share the same state, so a UI can hold a handle while a run proceeds
/// elsewhere.
///
/// At most one run is active per queue instance: invoking [`run`] while one
/// is in progress fails fast with [`EngineError::QueueBusy`] and performs no
/// work. There is no mid-run cancellation; once started, a run proceeds to
/// completion or first failure.
///
/// [`run`]: TransactionQueue::run
#[derive(Clone, Debug, Default)]
pub struct TransactionQueue {
    state: Arc<RunState>,
}

impl TransactionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a run is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.busy.load(Ordering::Acquire)
    }

    /// Number of steps that completed in the current or most recent run.
    ///
    /// Updated after each successful step, before the next one starts, so a
    /// polling observer sees progress mid-run.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        self.state.completed.load(Ordering::Acquire)
    }

    /// Number of steps in the current or most recent run.
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.state.total.load(Ordering::Acquire)
    }

    /// Failure recorded by the most recent run, if any.
    ///
    /// Cleared when a new run starts.
    #[must_use]
    pub fn last_failure(&self) -> Option<StepFailure> {
        self.state.failure.lock().ok().and_then(|slot| slot.clone())
    }

    /// Executes `steps` strictly sequentially, in list order.
    ///
    /// Step *i+1* begins only after step *i* resolves successfully. On the
    /// first failure the run stops: no later step executes, the completed
    /// count keeps its pre-failure value, and the returned
    /// [`EngineError::StepFailed`] carries the failing index, label and
    /// cause. The queue returns to idle either way, ready for a fresh run.
    ///
    /// An empty list is a no-op success with a zero-step report.
    pub async fn run(&self, steps: Vec<OperationStep>) -> ResultEngine<RunReport> {
        if self
            .state
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::QueueBusy);
        }
        let _busy = BusyGuard(&self.state.busy);

        let total = steps.len();
        self.state.total.store(total, Ordering::Release);
        self.state.completed.store(0, Ordering::Release);
        if let Ok(mut slot) = self.state.failure.lock() {
            *slot = None;
        }

        for (index, step) in steps.into_iter().enumerate() {
            let OperationStep { label, action } = step;
            tracing::debug!("running step {index}/{total}: {label}");

            match action().await {
                Ok(()) => {
                    self.state.completed.fetch_add(1, Ordering::AcqRel);
                }
                Err(source) => {
                    tracing::error!("step {index} ({label}) failed: {source}");
                    if let Ok(mut slot) = self.state.failure.lock() {
                        *slot = Some(StepFailure {
                            index,
                            label: label.clone(),
                            cause: source.to_string(),
                        });
                    }
                    return Err(EngineError::StepFailed {
                        index,
                        label,
                        source,
                    });
                }
            }
        }

        tracing::info!("run completed: {total} steps");
        Ok(RunReport {
            total,
            completed: total,
        })
    }
}

/// Clears the busy flag when a run ends, including on a panicking step, so
/// the queue instance stays usable.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
