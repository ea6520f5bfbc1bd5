use std::collections::BTreeMap;

#[derive(Debug, Clone, serde::Serialize)]
pub struct TenantRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TenantUserRecord {
    pub tenant_id: String,
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StrategyRecord {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewStrategy {
    pub tenant_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PluginRecord {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub executor_type: String,
    pub entrypoint: String,
    pub xp_reward: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPlugin {
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub executor_type: String,
    pub entrypoint: String,
    pub xp_reward: i64,
}

/// One row of the `executions` table, column for column.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub tenant_id: String,
    pub strategy_id: Option<String>,
    pub plugin_id: Option<String>,
    pub agent_version_id: Option<String>,
    pub executed_by: Option<String>,
    #[serde(rename = "type")]
    pub execution_type: String,
    pub status: String,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub execution_time: Option<i64>,
    pub xp_earned: i64,
    pub started_at: String,
    pub completed_at: Option<String>,
}

/// Insert payload for `executions`, already in the table's snake_case shape.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ExecutionRow {
    pub tenant_id: String,
    pub strategy_id: Option<String>,
    pub plugin_id: Option<String>,
    pub agent_version_id: Option<String>,
    pub executed_by: Option<String>,
    #[serde(rename = "type")]
    pub execution_type: String,
    pub status: String,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub execution_time: Option<i64>,
    pub xp_earned: i64,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecutionStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub total_xp: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PluginLogRecord {
    pub id: i64,
    pub tenant_id: String,
    pub execution_id: String,
    pub plugin_id: String,
    pub status: String,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub execution_time: i64,
    pub xp_earned: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPluginLog {
    pub tenant_id: String,
    pub execution_id: String,
    pub plugin_id: String,
    pub status: String,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub execution_time: i64,
    pub xp_earned: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemLogRecord {
    pub id: i64,
    pub tenant_id: String,
    pub module: String,
    pub level: String,
    pub severity: String,
    pub event: String,
    pub description: String,
    pub context: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NewSystemLog {
    pub tenant_id: String,
    pub module: String,
    pub level: String,
    pub severity: String,
    pub event: String,
    pub description: String,
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationRecord {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub read_at: Option<String>,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub tenant_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub notification_type: String,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
}
