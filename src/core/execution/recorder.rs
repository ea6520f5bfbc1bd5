use serde_json::Value;
use tracing::{info, warn};

use super::types::{ExecutionError, ExecutionStatus, ExecutionType, ServiceResult};
use crate::core::store::{ExecutionRecord, ExecutionRow, Store};

/// Execution outcome as reported by callers, in camelCase.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecordInput {
    pub tenant_id: Option<String>,
    pub strategy_id: Option<String>,
    pub plugin_id: Option<String>,
    pub agent_version_id: Option<String>,
    pub executed_by: Option<String>,
    #[serde(rename = "type")]
    pub execution_type: Option<String>,
    pub status: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub execution_time: Option<i64>,
    pub xp_earned: Option<i64>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ExecutionError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ExecutionError::Validation(format!("{} is required", name)))
}

impl ExecutionRecordInput {
    /// Maps to the `executions` columns. Fails without touching the store.
    pub fn to_row(&self) -> Result<ExecutionRow, ExecutionError> {
        let tenant_id = required(&self.tenant_id, "tenantId")?;
        let execution_type = required(&self.execution_type, "type")?;
        let status = required(&self.status, "status")?;

        let execution_type = ExecutionType::parse(execution_type).ok_or_else(|| {
            ExecutionError::Validation(format!("Invalid execution type: {}", execution_type))
        })?;
        let status = ExecutionStatus::parse(status).ok_or_else(|| {
            ExecutionError::Validation(format!("Invalid execution status: {}", status))
        })?;
        if let Some(ms) = self.execution_time
            && ms < 0
        {
            return Err(ExecutionError::Validation(
                "executionTime must not be negative".to_string(),
            ));
        }

        Ok(ExecutionRow {
            tenant_id: tenant_id.to_string(),
            strategy_id: self.strategy_id.clone(),
            plugin_id: self.plugin_id.clone(),
            agent_version_id: self.agent_version_id.clone(),
            executed_by: self.executed_by.clone(),
            execution_type: execution_type.as_str().to_string(),
            status: status.as_str().to_string(),
            input: self.input.clone(),
            output: self.output.clone(),
            error: self.error.clone(),
            execution_time: self.execution_time,
            xp_earned: self.xp_earned.unwrap_or(0).max(0),
            started_at: self.started_at.clone(),
            completed_at: self.completed_at.clone(),
        })
    }
}

/// Persists one externally reported execution.
pub async fn record_execution(
    store: &Store,
    input: &ExecutionRecordInput,
) -> ServiceResult<ExecutionRecord> {
    let row = match input.to_row() {
        Ok(row) => row,
        Err(e) => {
            warn!("Rejected execution record: {}", e);
            return ServiceResult::fail(e.to_string());
        }
    };
    match store.insert_execution(&row).await {
        Ok(record) => {
            info!(
                "Recorded {} execution {} ({}) for tenant {}",
                record.execution_type, record.id, record.status, record.tenant_id
            );
            ServiceResult::ok(record)
        }
        Err(e) => {
            warn!("Failed to record execution: {}", e);
            ServiceResult::fail(format!("Failed to record execution: {}", e))
        }
    }
}
