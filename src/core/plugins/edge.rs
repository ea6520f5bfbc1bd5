use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::core::edge::EdgeClient;
use crate::core::execution::PluginExecutor;
use crate::core::store::PluginRecord;

/// Invokes the edge function named by the plugin's entrypoint. An `error` in
/// the envelope fails the plugin.
pub struct EdgeExecutor {
    client: EdgeClient,
}

impl EdgeExecutor {
    pub fn new(client: EdgeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginExecutor for EdgeExecutor {
    async fn execute(&self, plugin: &PluginRecord, input: &Value) -> Result<Value> {
        self.client
            .invoke(&plugin.entrypoint, input)
            .await
            .into_result()
    }
}
