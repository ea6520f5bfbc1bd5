use std::collections::BTreeMap;

use crate::core::store::SystemLogRecord;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LogStats {
    pub total: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
    pub by_module: BTreeMap<String, usize>,
    pub critical: usize,
    /// Newest `created_at` seen, if any.
    pub latest_at: Option<String>,
}

pub fn summarize(logs: &[SystemLogRecord]) -> LogStats {
    let mut stats = LogStats {
        total: logs.len(),
        ..Default::default()
    };
    for log in logs {
        *stats.by_level.entry(log.level.clone()).or_insert(0) += 1;
        *stats.by_severity.entry(log.severity.clone()).or_insert(0) += 1;
        *stats.by_module.entry(log.module.clone()).or_insert(0) += 1;
        if log.severity == "critical" {
            stats.critical += 1;
        }
        if stats
            .latest_at
            .as_deref()
            .is_none_or(|latest| log.created_at.as_str() > latest)
        {
            stats.latest_at = Some(log.created_at.clone());
        }
    }
    stats
}
