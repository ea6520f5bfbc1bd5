use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::super::AppState;
use super::rejected;
use crate::core::execution::ServiceResult;
use crate::core::plugins::{PluginSpec, register_plugin};
use crate::core::store::PluginRecord;

pub async fn list_plugins(
    Path(tenant): Path<String>,
    State(state): State<AppState>,
) -> Json<ServiceResult<Vec<PluginRecord>>> {
    Json(state.services.store.list_plugins(&tenant).await.into())
}

pub async fn create_plugin(
    Path(tenant): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<PluginSpec>, JsonRejection>,
) -> Json<ServiceResult<PluginRecord>> {
    let Json(spec) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    Json(register_plugin(&state.services.store, &tenant, &spec).await.into())
}
