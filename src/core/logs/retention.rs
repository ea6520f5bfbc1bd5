use anyhow::Result;
use tracing::info;

use crate::core::store::Store;

/// Age-based cleanup of system logs, the only path that removes them.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub retention_days: u32,
}

impl RetentionPolicy {
    pub fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    pub async fn cleanup(&self, store: &Store) -> Result<usize> {
        if self.retention_days == 0 {
            info!("Log retention disabled (retention_days = 0), skipping cleanup");
            return Ok(0);
        }
        let removed = store.delete_system_logs_before(self.retention_days).await?;
        info!(
            "Log retention removed {} system log rows older than {} days",
            removed, self.retention_days
        );
        Ok(removed)
    }
}
