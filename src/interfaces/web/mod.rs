mod handlers;
mod router;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info};

use crate::core::lifecycle::LifecycleComponent;
use crate::core::notify::BroadcastToasts;
use crate::core::services::Services;

pub struct ApiServer {
    state: AppState,
    host: String,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) services: Services,
    pub(crate) log_tx: broadcast::Sender<String>,
    pub(crate) toasts: BroadcastToasts,
    pub(crate) api_port: u16,
}

impl AppState {
    pub(crate) fn new(
        services: Services,
        log_tx: broadcast::Sender<String>,
        toasts: BroadcastToasts,
    ) -> Self {
        let api_port = services.config.server.port;
        Self {
            services,
            log_tx,
            toasts,
            api_port,
        }
    }
}

impl ApiServer {
    pub(crate) fn new(state: AppState) -> Self {
        let host = state.services.config.server.host.clone();
        Self { state, host }
    }
}

// --- SSE streams (used by router) ---

async fn sse_logs_endpoint(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.log_tx.subscribe();
    let stream = BroadcastStream::new(receiver).map(|msg| match msg {
        Ok(log) => Ok(Event::default().data(log)),
        Err(_) => Ok(Event::default().data("Log stream lagged")),
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn sse_toasts_endpoint(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.toasts.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|msg| {
        let toast = msg.ok()?;
        let payload = serde_json::to_string(&toast).ok()?;
        Some(Ok(Event::default().event("toast").data(payload)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[async_trait]
impl LifecycleComponent for ApiServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("API Server initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.state.api_port);
        let app = router::build_api_router(self.state.clone());

        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => {
                    info!("API Server running at http://{addr}");
                    if let Err(e) = axum::serve(listener, app).await {
                        error!("API Server crashed: {}", e);
                    }
                }
                Err(e) => error!("API Server could not bind {}: {}", addr, e),
            }
        });
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("API Server shutting down...");
        Ok(())
    }
}
