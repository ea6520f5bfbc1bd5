use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::runner::{PluginExecutor, RunSummary, run_plugins};
use super::types::{
    ExecutionError, ExecutionStatus, ExecutionType, RunOutcome, RunRequest, ServiceResult,
    StrategyStatus,
};
use super::validator::validate_execution;
use crate::core::logs::Severity;
use crate::core::notify::{Event, EventSink, Toast, ToastKind};
use crate::core::store::{ExecutionRow, Store, StrategyRecord};

const MODULE: &str = "execution";

/// Drives one strategy run from validation to the final execution row.
#[derive(Clone)]
pub struct ExecutionTracker {
    store: Store,
    executor: Arc<dyn PluginExecutor>,
    events: EventSink,
    require_approval: bool,
}

impl ExecutionTracker {
    pub fn new(store: Store, executor: Arc<dyn PluginExecutor>, events: EventSink) -> Self {
        Self {
            store,
            executor,
            events,
            require_approval: true,
        }
    }

    pub fn require_approval(mut self, require: bool) -> Self {
        self.require_approval = require;
        self
    }

    pub async fn run_strategy(&self, request: &RunRequest) -> ServiceResult<RunOutcome> {
        match self.try_run(request).await {
            Ok(outcome) => ServiceResult::ok(outcome),
            Err(e) => {
                self.report_error(request, &e);
                ServiceResult::fail(e.to_string())
            }
        }
    }

    async fn try_run(&self, request: &RunRequest) -> Result<RunOutcome, ExecutionError> {
        let strategy = validate_execution(&self.store, request, self.require_approval).await?;
        let tenant_id = strategy.tenant_id.as_str();
        let plugins = self.store.list_strategy_plugins(&strategy.id).await?;

        let claimed = self
            .store
            .claim_strategy(tenant_id, &strategy.id, &strategy.status)
            .await?;
        if !claimed {
            return Err(ExecutionError::Validation(
                "Strategy is already being executed".to_string(),
            ));
        }

        let inserted = self
            .store
            .insert_execution(&ExecutionRow {
                tenant_id: tenant_id.to_string(),
                strategy_id: Some(strategy.id.clone()),
                executed_by: request.executed_by.clone(),
                execution_type: ExecutionType::Strategy.as_str().to_string(),
                status: ExecutionStatus::Pending.as_str().to_string(),
                input: request.input.clone(),
                ..Default::default()
            })
            .await;
        let execution = match inserted {
            Ok(execution) => execution,
            Err(e) => {
                if let Err(restore) = self
                    .store
                    .set_strategy_status(tenant_id, &strategy.id, &strategy.status, None)
                    .await
                {
                    warn!("Could not release strategy {}: {}", strategy.id, restore);
                }
                return Err(e.into());
            }
        };
        let started = Instant::now();
        info!(
            "Executing strategy [{}] ({} plugins) as execution {}",
            strategy.title,
            plugins.len(),
            execution.id
        );

        let input = json!({
            "tenant_id": tenant_id,
            "strategy": {
                "id": strategy.id,
                "title": strategy.title,
                "priority": strategy.priority,
                "tags": strategy.tags,
            },
            "params": request.input.clone().unwrap_or(Value::Null),
        });
        let summary = run_plugins(
            &self.store,
            self.executor.as_ref(),
            tenant_id,
            &execution.id,
            &plugins,
            &input,
        )
        .await;

        let completed = self
            .store
            .complete_execution(
                &execution.id,
                summary.status.as_str(),
                Some(&summary.output()),
                summary.error().as_deref(),
                started.elapsed().as_millis() as i64,
                summary.xp_earned,
            )
            .await;

        // The strategy leaves in_progress even when the completion write failed.
        let next_status = if summary.status == ExecutionStatus::Success {
            StrategyStatus::Completed.as_str()
        } else {
            strategy.status.as_str()
        };
        let restored = self
            .store
            .set_strategy_status(tenant_id, &strategy.id, next_status, None)
            .await;

        if !completed? {
            return Err(ExecutionError::Store(anyhow!(
                "Execution {} already left pending",
                execution.id
            )));
        }
        restored?;

        let record = self
            .store
            .get_execution(tenant_id, &execution.id)
            .await?
            .ok_or_else(|| ExecutionError::NotFound(format!("Execution not found: {}", execution.id)))?;

        self.report_outcome(&strategy, &record.id, &summary);
        Ok(RunOutcome {
            execution: record,
            plugins: summary.outcomes,
        })
    }

    fn report_outcome(&self, strategy: &StrategyRecord, execution_id: &str, summary: &RunSummary) {
        let total = summary.outcomes.len();
        let succeeded = summary.succeeded();
        let context = json!({
            "strategy_id": strategy.id,
            "execution_id": execution_id,
            "status": summary.status.as_str(),
            "succeeded": succeeded,
            "total": total,
            "xp_earned": summary.xp_earned,
        });
        let tenant_id = strategy.tenant_id.as_str();

        let event = match summary.status {
            ExecutionStatus::Success => Event::success(
                tenant_id,
                MODULE,
                "strategy_executed",
                "Strategy executed",
                format!(
                    "{}: {}/{} plugins succeeded, +{} XP",
                    strategy.title, succeeded, total, summary.xp_earned
                ),
            ),
            ExecutionStatus::Partial => Event::warning(
                tenant_id,
                MODULE,
                "strategy_partially_executed",
                "Strategy partially executed",
                format!(
                    "{}: {}/{} plugins succeeded",
                    strategy.title, succeeded, total
                ),
            ),
            _ => {
                let reason = if total == 0 {
                    "no plugins configured".to_string()
                } else {
                    summary.error().unwrap_or_else(|| "all plugins failed".to_string())
                };
                Event::failure(
                    tenant_id,
                    MODULE,
                    "strategy_failed",
                    "Strategy execution failed",
                    format!("{}: {}", strategy.title, reason),
                )
            }
        };
        info!(
            "Strategy [{}] finished with status {} ({}/{} plugins)",
            strategy.title,
            summary.status.as_str(),
            succeeded,
            total
        );
        self.events.emit(event.with_context(context));
    }

    /// Validation problems only toast; store failures are also logged as
    /// critical against the tenant.
    fn report_error(&self, request: &RunRequest, err: &ExecutionError) {
        match err {
            ExecutionError::Validation(msg) | ExecutionError::NotFound(msg) => {
                warn!("Strategy run rejected: {}", msg);
                self.events
                    .toast(Toast::new(ToastKind::Error, "Validation Error", msg.clone()));
            }
            ExecutionError::Store(e) => {
                error!("Strategy run for {} failed: {}", request.strategy_id, e);
                self.events.emit(
                    Event::failure(
                        &request.tenant_id,
                        MODULE,
                        "strategy_execution_error",
                        "Execution Error",
                        e.to_string(),
                    )
                    .with_severity(Severity::Critical)
                    .with_context(json!({ "strategy_id": request.strategy_id })),
                );
            }
        }
    }
}
