use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::core::logs::RetentionPolicy;
use crate::core::store::Store;

#[derive(Debug, PartialEq)]
pub enum LifecycleState {
    Init,
    Ready,
    Shutdown,
}

#[async_trait::async_trait]
pub trait LifecycleComponent {
    async fn on_init(&mut self) -> Result<()> {
        Ok(())
    }
    async fn on_start(&mut self) -> Result<()> {
        Ok(())
    }
    async fn on_shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct LifecycleManager {
    state: LifecycleState,
    components: Vec<Arc<Mutex<dyn LifecycleComponent + Send + Sync>>>,
    pub scheduler: JobScheduler,
}

impl LifecycleManager {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            state: LifecycleState::Init,
            components: Vec::new(),
            scheduler,
        })
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn attach(&mut self, component: Arc<Mutex<dyn LifecycleComponent + Send + Sync>>) {
        self.components.push(component);
    }

    /// Registers the system-log retention sweep on `cron` (six fields, seconds first).
    pub async fn schedule_retention(
        &self,
        store: Store,
        policy: RetentionPolicy,
        cron: &str,
    ) -> Result<()> {
        let job = Job::new_async(cron, move |_uuid, _l| {
            let store = store.clone();
            Box::pin(async move {
                if let Err(e) = policy.cleanup(&store).await {
                    error!("Log retention cleanup failed: {}", e);
                }
            })
        })
        .map_err(|e| anyhow!("Invalid cleanup cron '{}': {}", cron, e))?;
        self.scheduler.add(job).await?;
        info!("Log retention scheduled ({}, keep {} days)", cron, policy.retention_days);
        Ok(())
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("Lifecycle Phase: Init");
        self.state = LifecycleState::Init;
        for comp in &self.components {
            comp.lock().await.on_init().await?;
        }

        for comp in &self.components {
            comp.lock().await.on_start().await?;
        }

        info!("Lifecycle Phase: Ready (Starting Scheduler)");
        self.scheduler.start().await?;
        self.state = LifecycleState::Ready;

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Lifecycle Phase: Shutdown");
        self.state = LifecycleState::Shutdown;

        for comp in &self.components {
            if let Err(e) = comp.lock().await.on_shutdown().await {
                warn!("Component shutdown error: {}", e);
            }
        }
        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Scheduler shutdown error: {}", e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::test_store;

    #[derive(Default)]
    struct Probe {
        calls: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl LifecycleComponent for Probe {
        async fn on_init(&mut self) -> Result<()> {
            self.calls.push("init");
            Ok(())
        }
        async fn on_start(&mut self) -> Result<()> {
            self.calls.push("start");
            Ok(())
        }
        async fn on_shutdown(&mut self) -> Result<()> {
            self.calls.push("shutdown");
            Ok(())
        }
    }

    #[tokio::test]
    async fn components_see_every_phase_in_order() {
        let probe = Arc::new(Mutex::new(Probe::default()));
        let mut manager = LifecycleManager::new().await.unwrap();
        manager.attach(probe.clone());

        manager.start().await.unwrap();
        assert_eq!(manager.state(), &LifecycleState::Ready);
        manager.shutdown().await.unwrap();
        assert_eq!(manager.state(), &LifecycleState::Shutdown);

        assert_eq!(probe.lock().await.calls, vec!["init", "start", "shutdown"]);
    }

    #[tokio::test]
    async fn bad_cleanup_cron_is_rejected() {
        let manager = LifecycleManager::new().await.unwrap();
        let err = manager
            .schedule_retention(test_store().await, RetentionPolicy::new(30), "every night")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid cleanup cron"));
    }

    #[tokio::test]
    async fn valid_cleanup_cron_is_accepted() {
        let manager = LifecycleManager::new().await.unwrap();
        manager
            .schedule_retention(test_store().await, RetentionPolicy::new(30), "0 0 3 * * *")
            .await
            .unwrap();
    }
}
