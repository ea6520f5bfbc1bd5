use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};

use super::super::AppState;
use super::rejected;
use crate::core::execution::{ExecutionRecordInput, ServiceResult, record_execution};
use crate::core::store::{ExecutionRecord, ExecutionStats, PluginLogRecord};

const DEFAULT_EXECUTION_LIMIT: usize = 50;

#[derive(serde::Deserialize)]
pub struct ExecutionQuery {
    strategy_id: Option<String>,
    limit: Option<usize>,
}

pub async fn list_executions(
    Path(tenant): Path<String>,
    Query(query): Query<ExecutionQuery>,
    State(state): State<AppState>,
) -> Json<ServiceResult<Vec<ExecutionRecord>>> {
    let limit = query.limit.unwrap_or(DEFAULT_EXECUTION_LIMIT).clamp(1, 500);
    let strategy_id = query.strategy_id.as_deref().filter(|s| !s.is_empty());
    Json(
        state
            .services
            .store
            .list_executions(&tenant, strategy_id, limit)
            .await
            .into(),
    )
}

#[derive(serde::Serialize)]
pub struct ExecutionDetail {
    #[serde(flatten)]
    execution: ExecutionRecord,
    plugin_logs: Vec<PluginLogRecord>,
}

pub async fn get_execution(
    Path((tenant, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Json<ServiceResult<ExecutionDetail>> {
    let store = &state.services.store;
    let execution = match store.get_execution(&tenant, &id).await {
        Ok(Some(e)) => e,
        Ok(None) => return Json(ServiceResult::fail(format!("Execution not found: {}", id))),
        Err(e) => return Json(ServiceResult::fail(e.to_string())),
    };
    let logs = store.list_plugin_logs(&execution.id).await;
    Json(
        logs.map(|plugin_logs| ExecutionDetail {
            execution,
            plugin_logs,
        })
        .into(),
    )
}

pub async fn execution_stats(
    Path(tenant): Path<String>,
    State(state): State<AppState>,
) -> Json<ServiceResult<ExecutionStats>> {
    Json(state.services.store.execution_stats(&tenant).await.into())
}

pub async fn record_execution_endpoint(
    State(state): State<AppState>,
    body: Result<Json<ExecutionRecordInput>, JsonRejection>,
) -> Json<ServiceResult<ExecutionRecord>> {
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    Json(record_execution(&state.services.store, &input).await)
}
