use anyhow::Result;
use rusqlite::params;

use super::types::{NewPluginLog, PluginLogRecord};
use super::{Store, json_column, json_text};

impl Store {
    pub async fn add_plugin_log(&self, log: &NewPluginLog) -> Result<PluginLogRecord> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO plugin_logs (tenant_id, execution_id, plugin_id, status, input, output, error, execution_time, xp_earned)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                log.tenant_id,
                log.execution_id,
                log.plugin_id,
                log.status,
                json_text(log.input.as_ref()),
                json_text(log.output.as_ref()),
                log.error,
                log.execution_time,
                log.xp_earned
            ],
        )?;
        let id = db.last_insert_rowid();
        let rec = db.query_row(
            "SELECT id, tenant_id, execution_id, plugin_id, status, input, output, error, execution_time, xp_earned, created_at
             FROM plugin_logs WHERE id = ?1",
            params![id],
            |row| {
                Ok(PluginLogRecord {
                    id: row.get(0)?,
                    tenant_id: row.get(1)?,
                    execution_id: row.get(2)?,
                    plugin_id: row.get(3)?,
                    status: row.get(4)?,
                    input: json_column(row.get(5)?),
                    output: json_column(row.get(6)?),
                    error: row.get(7)?,
                    execution_time: row.get(8)?,
                    xp_earned: row.get(9)?,
                    created_at: row.get(10)?,
                })
            },
        )?;
        Ok(rec)
    }

    pub async fn list_plugin_logs(&self, execution_id: &str) -> Result<Vec<PluginLogRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, tenant_id, execution_id, plugin_id, status, input, output, error, execution_time, xp_earned, created_at
             FROM plugin_logs WHERE execution_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![execution_id], |row| {
            Ok(PluginLogRecord {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                execution_id: row.get(2)?,
                plugin_id: row.get(3)?,
                status: row.get(4)?,
                input: json_column(row.get(5)?),
                output: json_column(row.get(6)?),
                error: row.get(7)?,
                execution_time: row.get(8)?,
                xp_earned: row.get(9)?,
                created_at: row.get(10)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
