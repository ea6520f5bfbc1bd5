use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use super::types::{ExecutionRecord, ExecutionRow, ExecutionStats};
use super::{Store, json_column, json_text, new_id};

const EXECUTION_COLUMNS: &str = "id, tenant_id, strategy_id, plugin_id, agent_version_id, executed_by, type, status, input, output, error, execution_time, xp_earned, started_at, completed_at";

fn execution_from_row(row: &Row<'_>) -> rusqlite::Result<ExecutionRecord> {
    Ok(ExecutionRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        strategy_id: row.get(2)?,
        plugin_id: row.get(3)?,
        agent_version_id: row.get(4)?,
        executed_by: row.get(5)?,
        execution_type: row.get(6)?,
        status: row.get(7)?,
        input: json_column(row.get(8)?),
        output: json_column(row.get(9)?),
        error: row.get(10)?,
        execution_time: row.get(11)?,
        xp_earned: row.get(12)?,
        started_at: row.get(13)?,
        completed_at: row.get(14)?,
    })
}

impl Store {
    /// Inserts one execution row. `started_at` falls back to now; a
    /// non-pending row without `completed_at` is stamped as completed now.
    pub async fn insert_execution(&self, row: &ExecutionRow) -> Result<ExecutionRecord> {
        let id = new_id();
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO executions
             (id, tenant_id, strategy_id, plugin_id, agent_version_id, executed_by, type, status, input, output, error, execution_time, xp_earned, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     COALESCE(?14, CURRENT_TIMESTAMP),
                     CASE WHEN ?15 IS NOT NULL THEN ?15 WHEN ?8 = 'pending' THEN NULL ELSE CURRENT_TIMESTAMP END)",
            params![
                id,
                row.tenant_id,
                row.strategy_id,
                row.plugin_id,
                row.agent_version_id,
                row.executed_by,
                row.execution_type,
                row.status,
                json_text(row.input.as_ref()),
                json_text(row.output.as_ref()),
                row.error,
                row.execution_time,
                row.xp_earned,
                row.started_at,
                row.completed_at
            ],
        )?;
        let rec = db.query_row(
            &format!("SELECT {} FROM executions WHERE id = ?1", EXECUTION_COLUMNS),
            params![id],
            execution_from_row,
        )?;
        Ok(rec)
    }

    /// Moves a pending execution to its final status. Returns false when the
    /// execution does not exist or has already left `pending`.
    pub async fn complete_execution(
        &self,
        id: &str,
        status: &str,
        output: Option<&serde_json::Value>,
        error: Option<&str>,
        execution_time: i64,
        xp_earned: i64,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        let rows = db.execute(
            "UPDATE executions
             SET status = ?1, output = ?2, error = ?3, execution_time = ?4, xp_earned = ?5, completed_at = CURRENT_TIMESTAMP
             WHERE id = ?6 AND status = 'pending'",
            params![status, json_text(output), error, execution_time, xp_earned, id],
        )?;
        Ok(rows > 0)
    }

    pub async fn get_execution(&self, tenant_id: &str, id: &str) -> Result<Option<ExecutionRecord>> {
        let db = self.db.lock().await;
        let rec = db
            .query_row(
                &format!(
                    "SELECT {} FROM executions WHERE tenant_id = ?1 AND id = ?2",
                    EXECUTION_COLUMNS
                ),
                params![tenant_id, id],
                execution_from_row,
            )
            .optional()?;
        Ok(rec)
    }

    pub async fn list_executions(
        &self,
        tenant_id: &str,
        strategy_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM executions
             WHERE tenant_id = ?1 AND (?2 IS NULL OR strategy_id = ?2)
             ORDER BY started_at DESC, rowid DESC LIMIT ?3",
            EXECUTION_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![tenant_id, strategy_id, limit as i64],
            execution_from_row,
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub async fn execution_stats(&self, tenant_id: &str) -> Result<ExecutionStats> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT status, COUNT(*), COALESCE(SUM(xp_earned), 0)
             FROM executions WHERE tenant_id = ?1 GROUP BY status",
        )?;
        let rows = stmt.query_map(params![tenant_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut stats = ExecutionStats::default();
        for row in rows {
            let (status, count, xp) = row?;
            stats.total += count;
            stats.total_xp += xp;
            stats.by_status.insert(status, count);
        }
        Ok(stats)
    }
}
