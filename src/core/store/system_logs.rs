use anyhow::Result;
use rusqlite::{Row, params, params_from_iter, types::Value};

use super::types::{NewSystemLog, SystemLogRecord};
use super::{Store, json_column, json_text};
use crate::core::logs::LogFilter;

fn system_log_from_row(row: &Row<'_>) -> rusqlite::Result<SystemLogRecord> {
    Ok(SystemLogRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        module: row.get(2)?,
        level: row.get(3)?,
        severity: row.get(4)?,
        event: row.get(5)?,
        description: row.get(6)?,
        context: json_column(row.get(7)?),
        created_at: row.get(8)?,
    })
}

impl Store {
    /// System logs are write-once.
    pub async fn insert_system_log(&self, log: &NewSystemLog) -> Result<SystemLogRecord> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO system_logs (tenant_id, module, level, severity, event, description, context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.tenant_id,
                log.module,
                log.level,
                log.severity,
                log.event,
                log.description,
                json_text(log.context.as_ref())
            ],
        )?;
        let id = db.last_insert_rowid();
        let rec = db.query_row(
            "SELECT id, tenant_id, module, level, severity, event, description, context, created_at
             FROM system_logs WHERE id = ?1",
            params![id],
            system_log_from_row,
        )?;
        Ok(rec)
    }

    /// Newest first.
    pub async fn query_system_logs(
        &self,
        tenant_id: &str,
        filter: &LogFilter,
    ) -> Result<Vec<SystemLogRecord>> {
        let (where_sql, mut values) = filter.to_sql(tenant_id)?;
        values.push(Value::Integer(filter.effective_limit() as i64));
        values.push(Value::Integer(filter.offset.unwrap_or(0) as i64));

        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT id, tenant_id, module, level, severity, event, description, context, created_at
             FROM system_logs WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_sql
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), system_log_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Retention cleanup across all tenants. Returns the number of rows removed.
    pub async fn delete_system_logs_before(&self, retention_days: u32) -> Result<usize> {
        let db = self.db.lock().await;
        let modifier = format!("-{} days", retention_days);
        let rows = db.execute(
            "DELETE FROM system_logs WHERE created_at < datetime('now', ?1)",
            params![modifier],
        )?;
        Ok(rows)
    }
}
