use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::core::config::AppConfig;
use crate::core::edge::EdgeClient;
use crate::core::execution::{ExecutionTracker, PluginExecutor};
use crate::core::logs::RetentionPolicy;
use crate::core::notify::{EventSink, NotificationService, ToastSink};
use crate::core::plugins::PluginDispatcher;
use crate::core::store::Store;
use crate::core::strategies::StrategyService;

/// Everything a CLI command or HTTP handler needs, wired from one config.
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub store: Store,
    pub events: EventSink,
    pub notifications: NotificationService,
    pub strategies: StrategyService,
    pub tracker: ExecutionTracker,
}

impl Services {
    pub async fn open(data_dir: &Path, toasts: Arc<dyn ToastSink>) -> Result<Self> {
        let config = AppConfig::load(data_dir).await?;
        let store = Store::open(config.database_path(data_dir)).await?;
        let executor: Arc<dyn PluginExecutor> =
            Arc::new(PluginDispatcher::from_config(&config, data_dir)?);
        Self::assemble(config, store, executor, toasts)
    }

    pub fn assemble(
        config: AppConfig,
        store: Store,
        executor: Arc<dyn PluginExecutor>,
        toasts: Arc<dyn ToastSink>,
    ) -> Result<Self> {
        let edge = EdgeClient::from_config(&config)?;
        let alerts = if config.logs.alert_on_critical {
            edge.clone()
        } else {
            None
        };
        let events = EventSink::new(store.clone(), toasts).with_alerts(alerts);
        let notifications = NotificationService::new(store.clone());
        let strategies = StrategyService::new(
            store.clone(),
            events.clone(),
            notifications.clone(),
            edge,
        );
        let tracker = ExecutionTracker::new(store.clone(), executor, events.clone())
            .require_approval(config.execution.require_approval);
        Ok(Self {
            config,
            store,
            events,
            notifications,
            strategies,
            tracker,
        })
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.config.logs.retention_days)
    }
}
