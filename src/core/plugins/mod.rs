//! Plugin executors and the dispatcher that picks one per plugin.

mod edge;
mod native;

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

pub use edge::EdgeExecutor;
pub use native::NativeExecutor;

use crate::core::config::AppConfig;
use crate::core::edge::EdgeClient;
use crate::core::execution::PluginExecutor;
use crate::core::store::{NewPlugin, PluginRecord, Store};

pub const PLUGINS_DIR: &str = "plugins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    Edge,
    Native,
}

impl ExecutorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutorKind::Edge => "edge",
            ExecutorKind::Native => "native",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "edge" => Some(ExecutorKind::Edge),
            "native" => Some(ExecutorKind::Native),
            _ => None,
        }
    }
}

/// Routes each plugin to the executor named by its `executor_type`.
pub struct PluginDispatcher {
    native: NativeExecutor,
    edge: Option<EdgeExecutor>,
}

impl PluginDispatcher {
    pub fn new(native: NativeExecutor, edge: Option<EdgeExecutor>) -> Self {
        Self { native, edge }
    }

    pub fn from_config(cfg: &AppConfig, data_dir: &std::path::Path) -> Result<Self> {
        let native = NativeExecutor::new(
            data_dir.join(PLUGINS_DIR),
            Duration::from_secs(cfg.execution.plugin_timeout_secs.max(1)),
        );
        let edge = EdgeClient::from_config(cfg)?.map(EdgeExecutor::new);
        Ok(Self::new(native, edge))
    }
}

#[async_trait]
impl PluginExecutor for PluginDispatcher {
    async fn execute(&self, plugin: &PluginRecord, input: &Value) -> Result<Value> {
        match ExecutorKind::parse(&plugin.executor_type) {
            Some(ExecutorKind::Native) => self.native.execute(plugin, input).await,
            Some(ExecutorKind::Edge) => match &self.edge {
                Some(edge) => edge.execute(plugin, input).await,
                None => Err(anyhow!(
                    "Plugin {} needs edge functions, but no edge base_url is configured",
                    plugin.name
                )),
            },
            None => Err(anyhow!(
                "Unknown executor type '{}' for plugin {}",
                plugin.executor_type,
                plugin.name
            )),
        }
    }
}

/// Plugin definition as submitted by the CLI or the HTTP API.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub executor_type: String,
    pub entrypoint: String,
    #[serde(default)]
    pub xp_reward: i64,
}

pub async fn register_plugin(store: &Store, tenant_id: &str, spec: &PluginSpec) -> Result<PluginRecord> {
    let name = spec.name.trim();
    if name.is_empty() {
        bail!("Plugin name is required");
    }
    let kind = ExecutorKind::parse(&spec.executor_type)
        .ok_or_else(|| anyhow!("Executor type must be edge or native, not '{}'", spec.executor_type))?;
    let entrypoint = spec.entrypoint.trim();
    if entrypoint.is_empty() {
        bail!("Plugin entrypoint is required");
    }
    if kind == ExecutorKind::Native && (entrypoint.contains("..") || entrypoint.starts_with('/')) {
        bail!("Native entrypoints must be relative to the plugins directory");
    }
    if spec.xp_reward < 0 {
        bail!("XP reward cannot be negative");
    }

    let plugin = store
        .create_plugin(&NewPlugin {
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            description: spec.description.clone(),
            executor_type: kind.as_str().to_string(),
            entrypoint: entrypoint.to_string(),
            xp_reward: spec.xp_reward,
        })
        .await?;
    info!("Registered {} plugin {} ({}) for tenant {}", kind.as_str(), plugin.name, plugin.id, tenant_id);
    Ok(plugin)
}
