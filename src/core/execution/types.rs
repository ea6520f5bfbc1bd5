use serde_json::Value;

use crate::core::store::ExecutionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl StrategyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyStatus::Draft => "draft",
            StrategyStatus::Pending => "pending",
            StrategyStatus::Approved => "approved",
            StrategyStatus::Rejected => "rejected",
            StrategyStatus::InProgress => "in_progress",
            StrategyStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(StrategyStatus::Draft),
            "pending" => Some(StrategyStatus::Pending),
            "approved" => Some(StrategyStatus::Approved),
            "rejected" => Some(StrategyStatus::Rejected),
            "in_progress" => Some(StrategyStatus::InProgress),
            "completed" => Some(StrategyStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Failure,
    Partial,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failure => "failure",
            ExecutionStatus::Partial => "partial",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ExecutionStatus::Pending),
            "success" => Some(ExecutionStatus::Success),
            "failure" => Some(ExecutionStatus::Failure),
            "partial" => Some(ExecutionStatus::Partial),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
    Strategy,
    Plugin,
    Agent,
}

impl ExecutionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionType::Strategy => "strategy",
            ExecutionType::Plugin => "plugin",
            ExecutionType::Agent => "agent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "strategy" => Some(ExecutionType::Strategy),
            "plugin" => Some(ExecutionType::Plugin),
            "agent" => Some(ExecutionType::Agent),
            _ => None,
        }
    }
}

/// Execution status only moves forward out of `pending`.
pub fn can_transition(from: ExecutionStatus, to: ExecutionStatus) -> bool {
    if from == to {
        return true;
    }
    from == ExecutionStatus::Pending && to.is_terminal()
}

/// Status changes a reviewer may make. Execution-driven moves
/// (`in_progress`, `completed`) are not review actions.
pub fn can_review(from: StrategyStatus, to: StrategyStatus) -> bool {
    use StrategyStatus::*;
    matches!(
        (from, to),
        (Draft, Pending)
            | (Draft, Approved)
            | (Draft, Rejected)
            | (Pending, Approved)
            | (Pending, Rejected)
            | (Rejected, Pending)
            | (Completed, Pending)
    )
}

/// Uniform `{success, data, error}` envelope returned to every surface.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServiceResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ServiceResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        ServiceResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ServiceResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Request to run a strategy's plugin chain.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub strategy_id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub executed_by: Option<String>,
    /// Handed to every plugin alongside the strategy context.
    #[serde(default)]
    pub input: Option<Value>,
}

impl RunRequest {
    pub fn new(tenant_id: impl Into<String>, strategy_id: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PluginOutcome {
    pub plugin_id: String,
    pub plugin_name: String,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time: i64,
    pub xp_earned: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunOutcome {
    pub execution: ExecutionRecord,
    pub plugins: Vec<PluginOutcome>,
}
