mod runner;
mod state_machine;

use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use super::PluginExecutor;
use crate::core::store::{NewPlugin, NewStrategy, PluginRecord, Store, StrategyRecord};

/// Executes plugins in-process: entrypoints starting with `fail` error out,
/// everything else echoes its step. Records the order of calls.
#[derive(Default)]
pub(super) struct ScriptedExecutor {
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PluginExecutor for ScriptedExecutor {
    async fn execute(&self, plugin: &PluginRecord, input: &Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(plugin.name.clone());
        if plugin.entrypoint.starts_with("fail") {
            bail!("{} refused to run", plugin.name);
        }
        Ok(json!({ "handled_by": plugin.name, "step": input["step"] }))
    }
}

pub(super) async fn seed_plugin(store: &Store, name: &str, entrypoint: &str, xp: i64) -> PluginRecord {
    store
        .create_plugin(&NewPlugin {
            tenant_id: "t1".to_string(),
            name: name.to_string(),
            description: String::new(),
            executor_type: "native".to_string(),
            entrypoint: entrypoint.to_string(),
            xp_reward: xp,
        })
        .await
        .unwrap()
}

/// Strategy in `status` whose plugin chain is the given `(name, entrypoint, xp)` list.
pub(super) async fn seed_strategy(
    store: &Store,
    status: &str,
    plugins: &[(&str, &str, i64)],
) -> StrategyRecord {
    let strategy = store
        .create_strategy(&NewStrategy {
            tenant_id: "t1".to_string(),
            title: "Launch partner program".to_string(),
            description: "Recruit ten resellers".to_string(),
            status: status.to_string(),
            priority: "high".to_string(),
            tags: vec!["partners".to_string()],
            due_date: None,
            created_by: Some("alice".to_string()),
        })
        .await
        .unwrap();
    let mut ids = Vec::new();
    for (name, entrypoint, xp) in plugins {
        ids.push(seed_plugin(store, name, entrypoint, *xp).await.id);
    }
    store
        .set_strategy_plugins("t1", &strategy.id, &ids)
        .await
        .unwrap();
    strategy
}

pub(super) fn scripted() -> Arc<ScriptedExecutor> {
    Arc::new(ScriptedExecutor::default())
}
