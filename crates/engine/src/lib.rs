pub use amount::{FlowRate, TokenAmount};
pub use checkpoint::Checkpoint;
pub use error::EngineError;
pub use interval::TimeInterval;
pub use projection::{depletion_date, depletion_time, suggested_reserve};
pub use queue::{OperationStep, RunReport, StepError, StepFailure, StepResult, TransactionQueue};

mod amount;
mod checkpoint;
mod error;
mod interval;
mod projection;
mod queue;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
