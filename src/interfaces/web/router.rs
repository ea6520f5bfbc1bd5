use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{executions, logs, notifications, plugins, strategies};

fn build_localhost_cors(api_port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", api_port),
        format!("http://localhost:{}", api_port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    let tenant_routes = Router::new()
        .route(
            "/api/tenants/{tenant}/strategies",
            get(strategies::list_strategies).post(strategies::create_strategy),
        )
        .route(
            "/api/tenants/{tenant}/strategies/generate",
            post(strategies::generate_strategy),
        )
        .route(
            "/api/tenants/{tenant}/strategies/{id}",
            get(strategies::get_strategy),
        )
        .route(
            "/api/tenants/{tenant}/strategies/{id}/review",
            post(strategies::review_strategy),
        )
        .route(
            "/api/tenants/{tenant}/strategies/{id}/plugins",
            post(strategies::set_strategy_plugins),
        )
        .route(
            "/api/tenants/{tenant}/strategies/{id}/run",
            post(strategies::run_strategy),
        )
        .route(
            "/api/tenants/{tenant}/plugins",
            get(plugins::list_plugins).post(plugins::create_plugin),
        )
        .route(
            "/api/tenants/{tenant}/executions",
            get(executions::list_executions),
        )
        .route(
            "/api/tenants/{tenant}/executions/stats",
            get(executions::execution_stats),
        )
        .route(
            "/api/tenants/{tenant}/executions/{id}",
            get(executions::get_execution),
        )
        .route("/api/tenants/{tenant}/logs", get(logs::list_logs))
        .route("/api/tenants/{tenant}/logs/stats", get(logs::log_stats))
        .route(
            "/api/tenants/{tenant}/notifications",
            post(notifications::send_notification),
        )
        .route(
            "/api/tenants/{tenant}/users/{user}/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/tenants/{tenant}/users/{user}/notifications/read-all",
            post(notifications::mark_all_notifications_read),
        )
        .route(
            "/api/tenants/{tenant}/users/{user}/notifications/stream",
            get(notifications::notification_stream),
        )
        .route(
            "/api/tenants/{tenant}/users/{user}/notifications/{id}",
            axum::routing::delete(notifications::delete_notification),
        )
        .route(
            "/api/tenants/{tenant}/users/{user}/notifications/{id}/read",
            post(notifications::mark_notification_read),
        );

    Router::new()
        .merge(tenant_routes)
        .route(
            "/api/executions",
            post(executions::record_execution_endpoint),
        )
        .route("/api/logs/tail", get(super::sse_logs_endpoint))
        .route("/api/toasts/stream", get(super::sse_toasts_endpoint))
        .layer(middleware::from_fn(security_headers))
        .layer(build_localhost_cors(state.api_port))
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::execution::PluginExecutor;
    use crate::core::notify::BroadcastToasts;
    use crate::core::services::Services;
    use crate::core::store::{PluginRecord, test_store};
    use anyhow::{Result, bail};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    /// Succeeds with a small payload unless the entrypoint starts with `fail`.
    struct EchoExecutor;

    #[async_trait::async_trait]
    impl PluginExecutor for EchoExecutor {
        async fn execute(&self, plugin: &PluginRecord, input: &Value) -> Result<Value> {
            if plugin.entrypoint.starts_with("fail") {
                bail!("{} refused", plugin.name);
            }
            Ok(json!({ "plugin": plugin.name, "step": input["step"] }))
        }
    }

    async fn test_state() -> AppState {
        let toasts = BroadcastToasts::new(16);
        let services = Services::assemble(
            AppConfig::default(),
            test_store().await,
            Arc::new(EchoExecutor),
            Arc::new(toasts.clone()),
        )
        .unwrap();
        let (log_tx, _) = tokio::sync::broadcast::channel(16);
        AppState::new(services, log_tx, toasts)
    }

    async fn json_request(
        app: Router,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = match body {
            Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
            None => Body::empty(),
        };

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body_bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
        (status, json)
    }

    async fn call(state: &AppState, method: Method, path: &str, body: Option<Value>) -> Value {
        let (status, json) = json_request(build_api_router(state.clone()), method, path, body).await;
        assert_eq!(status, StatusCode::OK, "{path}: {json}");
        json
    }

    /// Creates an approved strategy wired to the given `(name, entrypoint, xp)` plugins.
    async fn approved_strategy(state: &AppState, plugins: &[(&str, &str, i64)]) -> String {
        let created = call(
            state,
            Method::POST,
            "/api/tenants/t1/strategies",
            Some(json!({ "title": "Expand EMEA", "status": "pending", "created_by": "carol" })),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let mut plugin_ids = Vec::new();
        for (name, entrypoint, xp) in plugins {
            let plugin = call(
                state,
                Method::POST,
                "/api/tenants/t1/plugins",
                Some(json!({
                    "name": name,
                    "executor_type": "edge",
                    "entrypoint": entrypoint,
                    "xp_reward": xp
                })),
            )
            .await;
            plugin_ids.push(plugin["data"]["id"].clone());
        }
        call(
            state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/plugins"),
            Some(json!({ "plugin_ids": plugin_ids })),
        )
        .await;

        let approved = call(
            state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/review"),
            Some(json!({ "status": "approved", "reviewer": "bob" })),
        )
        .await;
        assert_eq!(approved["data"]["status"], "approved");
        id
    }

    #[tokio::test]
    async fn security_headers_present_on_responses() {
        let app = build_api_router(test_state().await);

        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/tenants/t1/strategies")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
        assert!(
            resp.headers()
                .get("content-security-policy")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("default-src 'none'")
        );
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_api_router(test_state().await);
        let (status, _) = json_request(app, Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_list_and_show_strategy() {
        let state = test_state().await;
        let created = call(
            &state,
            Method::POST,
            "/api/tenants/t1/strategies",
            Some(json!({ "title": "Win back churned accounts", "tags": ["retention"] })),
        )
        .await;
        assert_eq!(created["success"], true);
        assert_eq!(created["data"]["status"], "draft");
        assert_eq!(created["data"]["priority"], "medium");
        let id = created["data"]["id"].as_str().unwrap();

        let listed = call(&state, Method::GET, "/api/tenants/t1/strategies?status=draft", None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let shown = call(&state, Method::GET, &format!("/api/tenants/t1/strategies/{id}"), None).await;
        assert_eq!(shown["data"]["title"], "Win back churned accounts");
        assert_eq!(shown["data"]["plugins"].as_array().unwrap().len(), 0);

        let missing = call(&state, Method::GET, "/api/tenants/t1/strategies/nope", None).await;
        assert_eq!(missing["success"], false);
        assert!(missing["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn members_cannot_approve() {
        let state = test_state().await;
        let created = call(
            &state,
            Method::POST,
            "/api/tenants/t1/strategies",
            Some(json!({ "title": "Cold outreach", "status": "pending" })),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap();

        let json = call(
            &state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/review"),
            Some(json!({ "status": "approved", "reviewer": "carol" })),
        )
        .await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn run_reports_success_and_records_execution() {
        let state = test_state().await;
        let id = approved_strategy(&state, &[("enrich", "enrichLeads", 10), ("score", "scoreLeads", 5)]).await;

        let run = call(
            &state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/run"),
            Some(json!({ "executed_by": "alice" })),
        )
        .await;
        assert_eq!(run["success"], true);
        assert_eq!(run["data"]["execution"]["status"], "success");
        assert_eq!(run["data"]["execution"]["xp_earned"], 15);
        let execution_id = run["data"]["execution"]["id"].as_str().unwrap();

        let detail = call(
            &state,
            Method::GET,
            &format!("/api/tenants/t1/executions/{execution_id}"),
            None,
        )
        .await;
        assert_eq!(detail["data"]["plugin_logs"].as_array().unwrap().len(), 2);

        let stats = call(&state, Method::GET, "/api/tenants/t1/executions/stats", None).await;
        assert_eq!(stats["data"]["total"], 1);
        assert_eq!(stats["data"]["total_xp"], 15);

        let strategy = call(&state, Method::GET, &format!("/api/tenants/t1/strategies/{id}"), None).await;
        assert_eq!(strategy["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn partial_run_is_logged_as_warning() {
        let state = test_state().await;
        let id = approved_strategy(&state, &[("enrich", "enrichLeads", 10), ("broken", "failHard", 5)]).await;

        let run = call(
            &state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/run"),
            Some(json!({})),
        )
        .await;
        assert_eq!(run["data"]["execution"]["status"], "partial");

        state.services.events.flush().await;
        let logs = call(&state, Method::GET, "/api/tenants/t1/logs", None).await;
        let events: Vec<&str> = logs["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|l| l["event"].as_str())
            .collect();
        assert!(events.contains(&"strategy_partially_executed"), "{events:?}");

        let stats = call(&state, Method::GET, "/api/tenants/t1/logs/stats?module=execution", None).await;
        assert!(stats["data"]["total"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn unapproved_strategy_is_rejected_without_execution() {
        let state = test_state().await;
        let created = call(
            &state,
            Method::POST,
            "/api/tenants/t1/strategies",
            Some(json!({ "title": "Not yet" })),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap();

        let run = call(
            &state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/run"),
            Some(json!({})),
        )
        .await;
        assert_eq!(run["success"], false);
        assert!(run["error"].as_str().unwrap().contains("must be approved"));

        let listed = call(&state, Method::GET, "/api/tenants/t1/executions", None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn record_execution_accepts_camel_case() {
        let state = test_state().await;
        let json = call(
            &state,
            Method::POST,
            "/api/executions",
            Some(json!({
                "tenantId": "t1",
                "type": "agent",
                "status": "success",
                "executionTime": 1200,
                "xpEarned": 7
            })),
        )
        .await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["type"], "agent");
        assert_eq!(json["data"]["execution_time"], 1200);

        let missing = call(
            &state,
            Method::POST,
            "/api/executions",
            Some(json!({ "tenantId": "t1", "status": "success" })),
        )
        .await;
        assert_eq!(missing["success"], false);
        assert_eq!(missing["error"], "type is required");
    }

    #[tokio::test]
    async fn malformed_bodies_come_back_in_the_envelope() {
        let state = test_state().await;
        let wrong_type = call(
            &state,
            Method::POST,
            "/api/executions",
            Some(json!({ "tenantId": 42, "type": "agent", "status": "success" })),
        )
        .await;
        assert_eq!(wrong_type["success"], false);
        assert!(wrong_type["error"].as_str().unwrap().contains("tenantId"));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/tenants/t1/plugins")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = build_api_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());

        let run = call(
            &state,
            Method::POST,
            "/api/tenants/t1/strategies/s1/run",
            Some(json!({ "input": 1, "executed_by": ["x"] })),
        )
        .await;
        assert_eq!(run["success"], false);
        assert!(run["error"].as_str().unwrap().contains("Invalid request body"));
    }

    #[tokio::test]
    async fn run_without_body_uses_defaults() {
        let state = test_state().await;
        let id = approved_strategy(&state, &[("enrich", "enrichLeads", 10)]).await;

        let run = call(
            &state,
            Method::POST,
            &format!("/api/tenants/t1/strategies/{id}/run"),
            None,
        )
        .await;
        assert_eq!(run["success"], true, "{run}");
        assert_eq!(run["data"]["execution"]["status"], "success");
        assert!(run["data"]["execution"]["executed_by"].is_null());
    }

    #[tokio::test]
    async fn plugin_validation_errors_come_back_in_the_envelope() {
        let state = test_state().await;
        let json = call(
            &state,
            Method::POST,
            "/api/tenants/t1/plugins",
            Some(json!({ "name": "x", "executor_type": "wasm", "entrypoint": "x" })),
        )
        .await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("edge or native"));
    }

    #[tokio::test]
    async fn notification_lifecycle() {
        let state = test_state().await;
        let sent = call(
            &state,
            Method::POST,
            "/api/tenants/t1/notifications",
            Some(json!({
                "title": "Quarterly review",
                "description": "Strategies due Friday",
                "type": "warning",
                "roles": ["reviewer"]
            })),
        )
        .await;
        assert_eq!(sent["data"].as_array().unwrap().len(), 1);
        let id = sent["data"][0]["id"].as_str().unwrap();
        assert_eq!(sent["data"][0]["user_id"], "bob");

        let listed = call(&state, Method::GET, "/api/tenants/t1/users/bob/notifications", None).await;
        assert_eq!(listed["data"]["unread"], 1);
        assert_eq!(listed["data"]["notifications"][0]["type"], "warning");

        let read = call(
            &state,
            Method::POST,
            &format!("/api/tenants/t1/users/bob/notifications/{id}/read"),
            None,
        )
        .await;
        assert!(read["data"]["read_at"].is_string());

        let unread = call(
            &state,
            Method::GET,
            "/api/tenants/t1/users/bob/notifications?unread_only=true",
            None,
        )
        .await;
        assert_eq!(unread["data"]["notifications"].as_array().unwrap().len(), 0);

        let other_user = call(
            &state,
            Method::DELETE,
            &format!("/api/tenants/t1/users/carol/notifications/{id}"),
            None,
        )
        .await;
        assert_eq!(other_user["success"], false);

        let deleted = call(
            &state,
            Method::DELETE,
            &format!("/api/tenants/t1/users/bob/notifications/{id}"),
            None,
        )
        .await;
        assert_eq!(deleted["success"], true);
    }

    #[tokio::test]
    async fn direct_notification_and_read_all() {
        let state = test_state().await;
        for title in ["One", "Two"] {
            call(
                &state,
                Method::POST,
                "/api/tenants/t1/notifications",
                Some(json!({ "title": title, "user_id": "carol" })),
            )
            .await;
        }
        let json = call(
            &state,
            Method::POST,
            "/api/tenants/t1/users/carol/notifications/read-all",
            None,
        )
        .await;
        assert_eq!(json["data"], 2);
    }

    #[tokio::test]
    async fn streams_are_served_as_event_streams() {
        let state = test_state().await;
        for path in [
            "/api/logs/tail",
            "/api/toasts/stream",
            "/api/tenants/t1/users/bob/notifications/stream",
        ] {
            let req = Request::builder()
                .method(Method::GET)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let resp = build_api_router(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{path}");
            assert_eq!(
                resp.headers().get("content-type").unwrap(),
                "text/event-stream",
                "{path}"
            );
        }
    }
}
