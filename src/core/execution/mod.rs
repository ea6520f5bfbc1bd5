//! Strategy execution: validation, the plugin loop, run tracking and
//! recording of externally reported executions.

mod recorder;
mod runner;
mod tracker;
mod types;
mod validator;

pub use recorder::{ExecutionRecordInput, record_execution};
pub use runner::{PluginExecutor, RunSummary, aggregate_status, run_plugins};
pub use tracker::ExecutionTracker;
pub use types::{
    ExecutionError, ExecutionStatus, ExecutionType, PluginOutcome, RunOutcome, RunRequest,
    ServiceResult, StrategyStatus, can_review, can_transition,
};
pub use validator::{check_required, validate_execution};

#[cfg(test)]
mod tests;
