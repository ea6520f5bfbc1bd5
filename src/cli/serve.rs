use anyhow::Result;
use console::style;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::info;

use super::{installed_data_dir, parse_flags};
use crate::core::lifecycle::LifecycleManager;
use crate::core::notify::BroadcastToasts;
use crate::core::services::Services;
use crate::core::terminal::GuideSection;
use crate::interfaces::web::{ApiServer, AppState};

const TOAST_CAPACITY: usize = 256;

/// Runs the HTTP API and the retention schedule until Ctrl+C.
pub async fn run_serve(args: &[String], log_tx: broadcast::Sender<String>) -> Result<()> {
    let flags = parse_flags(args, 2);
    let data_dir = installed_data_dir()?;
    let toasts = BroadcastToasts::new(TOAST_CAPACITY);
    let mut services = Services::open(&data_dir, Arc::new(toasts.clone())).await?;
    if let Some(host) = flags.get("host") {
        services.config.server.host = host.to_string();
    }
    if let Some(port) = flags.number::<u16>("port")? {
        services.config.server.port = port;
    }
    info!("Starting allora API server...");

    let mut lifecycle = LifecycleManager::new().await?;
    let retention = services.retention();
    if retention.retention_days > 0 {
        lifecycle
            .schedule_retention(
                services.store.clone(),
                retention,
                &services.config.logs.cleanup_cron,
            )
            .await?;
    }

    let api_url = format!(
        "http://{}:{}",
        services.config.server.host, services.config.server.port
    );
    let state = AppState::new(services, log_tx, toasts);
    lifecycle.attach(Arc::new(Mutex::new(ApiServer::new(state))));
    lifecycle.start().await?;

    GuideSection::new("allora API")
        .status("API", &format!("{}", style(&api_url).underlined().cyan()))
        .status("Log tail", &format!("{}/api/logs/tail", api_url))
        .status("Toasts", &format!("{}/api/toasts/stream", api_url))
        .blank()
        .status("Stop", &format!("{}", style("Ctrl+C").bold().yellow()))
        .print();
    println!();

    tokio::signal::ctrl_c().await?;
    lifecycle.shutdown().await?;
    Ok(())
}
