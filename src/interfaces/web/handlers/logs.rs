use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::super::AppState;
use crate::core::execution::ServiceResult;
use crate::core::logs::{LogFilter, LogStats, MAX_LOG_LIMIT, summarize};
use crate::core::store::SystemLogRecord;

pub async fn list_logs(
    Path(tenant): Path<String>,
    Query(filter): Query<LogFilter>,
    State(state): State<AppState>,
) -> Json<ServiceResult<Vec<SystemLogRecord>>> {
    Json(
        state
            .services
            .store
            .query_system_logs(&tenant, &filter)
            .await
            .into(),
    )
}

/// Aggregates over the newest matching rows, capped at [`MAX_LOG_LIMIT`].
pub async fn log_stats(
    Path(tenant): Path<String>,
    Query(filter): Query<LogFilter>,
    State(state): State<AppState>,
) -> Json<ServiceResult<LogStats>> {
    let filter = LogFilter {
        limit: Some(MAX_LOG_LIMIT),
        offset: None,
        ..filter
    };
    let logs = state.services.store.query_system_logs(&tenant, &filter).await;
    Json(logs.map(|logs| summarize(&logs)).into())
}
