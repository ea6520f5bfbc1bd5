use super::types::{ExecutionError, RunRequest, StrategyStatus};
use crate::core::store::{Store, StrategyRecord};

/// Field checks that need no store access.
pub fn check_required(request: &RunRequest) -> Result<(), ExecutionError> {
    if request.strategy_id.trim().is_empty() {
        return Err(ExecutionError::Validation(
            "Strategy ID is required".to_string(),
        ));
    }
    if request.tenant_id.trim().is_empty() {
        return Err(ExecutionError::Validation("Tenant ID is required".to_string()));
    }
    Ok(())
}

/// Returns the strategy when it may be executed. One store read at most.
pub async fn validate_execution(
    store: &Store,
    request: &RunRequest,
    require_approval: bool,
) -> Result<StrategyRecord, ExecutionError> {
    check_required(request)?;

    let strategy = store
        .get_strategy(&request.tenant_id, &request.strategy_id)
        .await?
        .ok_or_else(|| {
            ExecutionError::NotFound(format!("Strategy not found: {}", request.strategy_id))
        })?;

    let status = StrategyStatus::parse(&strategy.status);
    if status == Some(StrategyStatus::InProgress) {
        return Err(ExecutionError::Validation(
            "Strategy is already being executed".to_string(),
        ));
    }
    if require_approval && status != Some(StrategyStatus::Approved) {
        return Err(ExecutionError::Validation(format!(
            "Strategy must be approved before execution (current status: {})",
            strategy.status
        )));
    }
    Ok(strategy)
}
