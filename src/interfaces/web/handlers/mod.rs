pub mod executions;
pub mod logs;
pub mod notifications;
pub mod plugins;
pub mod strategies;

use axum::{Json, extract::rejection::JsonRejection};
use serde::de::DeserializeOwned;

use crate::core::execution::ServiceResult;

/// Body rejections answer with the envelope instead of axum's plain-text 4xx.
pub(crate) fn rejected<T>(rejection: JsonRejection) -> Json<ServiceResult<T>> {
    Json(ServiceResult::fail(rejection.body_text()))
}

/// An empty body means the default request.
pub(crate) fn optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| format!("Invalid request body: {}", e))
}
