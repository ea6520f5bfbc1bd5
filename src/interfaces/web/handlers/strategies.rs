use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
};

use super::super::AppState;
use super::{optional_body, rejected};
use crate::core::execution::{RunOutcome, RunRequest, ServiceResult};
use crate::core::store::{PluginRecord, StrategyRecord};
use crate::core::strategies::{ReviewRequest, StrategyDraft};

#[derive(serde::Deserialize)]
pub struct StrategyQuery {
    status: Option<String>,
}

pub async fn list_strategies(
    Path(tenant): Path<String>,
    Query(query): Query<StrategyQuery>,
    State(state): State<AppState>,
) -> Json<ServiceResult<Vec<StrategyRecord>>> {
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    Json(
        state
            .services
            .store
            .list_strategies(&tenant, status)
            .await
            .into(),
    )
}

pub async fn create_strategy(
    Path(tenant): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<StrategyDraft>, JsonRejection>,
) -> Json<ServiceResult<StrategyRecord>> {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    Json(state.services.strategies.create(&tenant, &draft).await.into())
}

#[derive(serde::Serialize)]
pub struct StrategyDetail {
    #[serde(flatten)]
    strategy: StrategyRecord,
    plugins: Vec<PluginRecord>,
}

pub async fn get_strategy(
    Path((tenant, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Json<ServiceResult<StrategyDetail>> {
    let store = &state.services.store;
    let strategy = match store.get_strategy(&tenant, &id).await {
        Ok(Some(s)) => s,
        Ok(None) => return Json(ServiceResult::fail(format!("Strategy not found: {}", id))),
        Err(e) => return Json(ServiceResult::fail(e.to_string())),
    };
    let plugins = store.list_strategy_plugins(&strategy.id).await;
    Json(plugins.map(|plugins| StrategyDetail { strategy, plugins }).into())
}

pub async fn review_strategy(
    Path((tenant, id)): Path<(String, String)>,
    State(state): State<AppState>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Json<ServiceResult<StrategyRecord>> {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    Json(
        state
            .services
            .strategies
            .review(&tenant, &id, &request)
            .await
            .into(),
    )
}

#[derive(serde::Deserialize)]
pub struct PluginListRequest {
    plugin_ids: Vec<String>,
}

pub async fn set_strategy_plugins(
    Path((tenant, id)): Path<(String, String)>,
    State(state): State<AppState>,
    body: Result<Json<PluginListRequest>, JsonRejection>,
) -> Json<ServiceResult<Vec<PluginRecord>>> {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    Json(
        state
            .services
            .strategies
            .set_plugins(&tenant, &id, &payload.plugin_ids)
            .await
            .into(),
    )
}

#[derive(Default, serde::Deserialize)]
pub struct RunStrategyRequest {
    #[serde(default)]
    executed_by: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

pub async fn run_strategy(
    Path((tenant, id)): Path<(String, String)>,
    State(state): State<AppState>,
    body: Bytes,
) -> Json<ServiceResult<RunOutcome>> {
    let payload: RunStrategyRequest = match optional_body(&body) {
        Ok(payload) => payload,
        Err(e) => return Json(ServiceResult::fail(e)),
    };
    let request = RunRequest {
        strategy_id: id,
        tenant_id: tenant,
        executed_by: payload.executed_by,
        input: payload.input,
    };
    Json(state.services.tracker.run_strategy(&request).await)
}

#[derive(serde::Deserialize)]
pub struct GenerateRequest {
    prompt: String,
    #[serde(default)]
    created_by: Option<String>,
}

pub async fn generate_strategy(
    Path(tenant): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Json<ServiceResult<StrategyRecord>> {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    Json(
        state
            .services
            .strategies
            .generate(&tenant, &payload.prompt, payload.created_by.as_deref())
            .await
            .into(),
    )
}
