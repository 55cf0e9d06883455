//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidCheckpoint`] thrown when checkpoint data breaks the upstream
//!   contract (malformed integer strings, negative base amount, overflow).
//! - [`QueueBusy`] thrown when [`TransactionQueue::run`] is invoked while a
//!   run is already in progress.
//! - [`StepFailed`] thrown when an operation step fails mid-run.
//!
//!  [`InvalidCheckpoint`]: EngineError::InvalidCheckpoint
//!  [`QueueBusy`]: EngineError::QueueBusy
//!  [`StepFailed`]: EngineError::StepFailed
//!  [`TransactionQueue::run`]: crate::TransactionQueue::run
use thiserror::Error;

use crate::queue::StepError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("A queue run is already in progress")]
    QueueBusy,
    #[error("Step {index} ({label}) failed")]
    StepFailed {
        index: usize,
        label: String,
        #[source]
        source: StepError,
    },
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidCheckpoint(a), Self::InvalidCheckpoint(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::QueueBusy, Self::QueueBusy) => true,
            (
                Self::StepFailed {
                    index: a_index,
                    label: a_label,
                    source: a_source,
                },
                Self::StepFailed {
                    index: b_index,
                    label: b_label,
                    source: b_source,
                },
            ) => {
                a_index == b_index
                    && a_label == b_label
                    && a_source.to_string() == b_source.to_string()
            }
            _ => false,
        }
    }
}
