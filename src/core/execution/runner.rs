use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::types::{ExecutionStatus, PluginOutcome};
use crate::core::store::{NewPluginLog, PluginRecord, Store};

/// Runs one plugin. Implementations decide how `entrypoint` is interpreted.
#[async_trait]
pub trait PluginExecutor: Send + Sync {
    async fn execute(&self, plugin: &PluginRecord, input: &Value) -> Result<Value>;
}

/// `success` iff every plugin succeeded, `partial` iff some did, otherwise
/// `failure` (including an empty plugin list).
pub fn aggregate_status(succeeded: usize, total: usize) -> ExecutionStatus {
    if total == 0 || succeeded == 0 {
        ExecutionStatus::Failure
    } else if succeeded >= total {
        ExecutionStatus::Success
    } else {
        ExecutionStatus::Partial
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: ExecutionStatus,
    pub outcomes: Vec<PluginOutcome>,
    pub xp_earned: i64,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == ExecutionStatus::Success)
            .count()
    }

    /// Output stored on the execution row.
    pub fn output(&self) -> Value {
        json!({
            "succeeded": self.succeeded(),
            "total": self.outcomes.len(),
            "plugins": self.outcomes,
        })
    }

    /// Joined plugin errors, if any failed.
    pub fn error(&self) -> Option<String> {
        let errors: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {}", o.plugin_name, e)))
            .collect();
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        }
    }
}

/// Runs plugins one after another. A failing plugin is logged and the loop
/// moves on; only successful plugins earn XP.
pub async fn run_plugins(
    store: &Store,
    executor: &dyn PluginExecutor,
    tenant_id: &str,
    execution_id: &str,
    plugins: &[PluginRecord],
    input: &Value,
) -> RunSummary {
    let mut outcomes = Vec::with_capacity(plugins.len());
    let mut xp_earned = 0;

    for (step, plugin) in plugins.iter().enumerate() {
        let plugin_input = json!({
            "step": step,
            "execution_id": execution_id,
            "plugin": { "id": plugin.id, "name": plugin.name },
            "input": input,
        });
        let started = Instant::now();
        let result = executor.execute(plugin, &plugin_input).await;
        let execution_time = started.elapsed().as_millis() as i64;

        let outcome = match result {
            Ok(output) => {
                info!(
                    "Plugin [{}] succeeded in {}ms (+{} XP)",
                    plugin.name, execution_time, plugin.xp_reward
                );
                xp_earned += plugin.xp_reward;
                PluginOutcome {
                    plugin_id: plugin.id.clone(),
                    plugin_name: plugin.name.clone(),
                    status: ExecutionStatus::Success,
                    output: Some(output),
                    error: None,
                    execution_time,
                    xp_earned: plugin.xp_reward,
                }
            }
            Err(e) => {
                warn!("Plugin [{}] failed after {}ms: {}", plugin.name, execution_time, e);
                PluginOutcome {
                    plugin_id: plugin.id.clone(),
                    plugin_name: plugin.name.clone(),
                    status: ExecutionStatus::Failure,
                    output: None,
                    error: Some(e.to_string()),
                    execution_time,
                    xp_earned: 0,
                }
            }
        };

        let log = NewPluginLog {
            tenant_id: tenant_id.to_string(),
            execution_id: execution_id.to_string(),
            plugin_id: plugin.id.clone(),
            status: outcome.status.as_str().to_string(),
            input: Some(plugin_input),
            output: outcome.output.clone(),
            error: outcome.error.clone(),
            execution_time,
            xp_earned: outcome.xp_earned,
        };
        if let Err(e) = store.add_plugin_log(&log).await {
            warn!("Failed to write plugin log for [{}]: {}", plugin.name, e);
        }
        outcomes.push(outcome);
    }

    let succeeded = outcomes
        .iter()
        .filter(|o| o.status == ExecutionStatus::Success)
        .count();
    RunSummary {
        status: aggregate_status(succeeded, plugins.len()),
        outcomes,
        xp_earned,
    }
}
