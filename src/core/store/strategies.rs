use anyhow::{Result, anyhow};
use rusqlite::{OptionalExtension, Row, params};

use super::types::{NewStrategy, PluginRecord, StrategyRecord};
use super::{Store, new_id};

const STRATEGY_COLUMNS: &str = "id, tenant_id, title, description, status, priority, tags, due_date, created_by, approved_by, created_at, updated_at";

fn strategy_from_row(row: &Row<'_>) -> rusqlite::Result<StrategyRecord> {
    let tags: String = row.get(6)?;
    Ok(StrategyRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        due_date: row.get(7)?,
        created_by: row.get(8)?,
        approved_by: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl Store {
    pub async fn create_strategy(&self, strategy: &NewStrategy) -> Result<StrategyRecord> {
        let id = new_id();
        let tags = serde_json::to_string(&strategy.tags)?;
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO strategies (id, tenant_id, title, description, status, priority, tags, due_date, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                strategy.tenant_id,
                strategy.title,
                strategy.description,
                strategy.status,
                strategy.priority,
                tags,
                strategy.due_date,
                strategy.created_by
            ],
        )?;
        let rec = db.query_row(
            &format!("SELECT {} FROM strategies WHERE id = ?1", STRATEGY_COLUMNS),
            params![id],
            strategy_from_row,
        )?;
        Ok(rec)
    }

    pub async fn get_strategy(&self, tenant_id: &str, id: &str) -> Result<Option<StrategyRecord>> {
        let db = self.db.lock().await;
        let rec = db
            .query_row(
                &format!(
                    "SELECT {} FROM strategies WHERE tenant_id = ?1 AND id = ?2",
                    STRATEGY_COLUMNS
                ),
                params![tenant_id, id],
                strategy_from_row,
            )
            .optional()?;
        Ok(rec)
    }

    pub async fn list_strategies(
        &self,
        tenant_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<StrategyRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM strategies
             WHERE tenant_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id ASC",
            STRATEGY_COLUMNS
        ))?;
        let rows = stmt.query_map(params![tenant_id, status], strategy_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// `approved_by` is only overwritten when provided.
    pub async fn set_strategy_status(
        &self,
        tenant_id: &str,
        id: &str,
        status: &str,
        approved_by: Option<&str>,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        let rows = db.execute(
            "UPDATE strategies
             SET status = ?1, approved_by = COALESCE(?2, approved_by), updated_at = CURRENT_TIMESTAMP
             WHERE tenant_id = ?3 AND id = ?4",
            params![status, approved_by, tenant_id, id],
        )?;
        Ok(rows > 0)
    }

    /// Moves the strategy to `in_progress` only while it still has the
    /// `expected` status. Returns false when another run got there first.
    pub async fn claim_strategy(&self, tenant_id: &str, id: &str, expected: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let rows = db.execute(
            "UPDATE strategies
             SET status = 'in_progress', updated_at = CURRENT_TIMESTAMP
             WHERE tenant_id = ?1 AND id = ?2 AND status = ?3",
            params![tenant_id, id, expected],
        )?;
        Ok(rows > 0)
    }

    /// Replaces the ordered plugin list of a strategy. Every plugin must
    /// belong to the strategy's tenant.
    pub async fn set_strategy_plugins(
        &self,
        tenant_id: &str,
        strategy_id: &str,
        plugin_ids: &[String],
    ) -> Result<()> {
        let mut db = self.db.lock().await;
        let tx = db.transaction()?;
        let owned: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM strategies WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, strategy_id],
            |row| row.get(0),
        )?;
        if !owned {
            return Err(anyhow!("Strategy not found: {}", strategy_id));
        }
        for plugin_id in plugin_ids {
            let exists: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM plugins WHERE tenant_id = ?1 AND id = ?2",
                params![tenant_id, plugin_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(anyhow!("Plugin not found for tenant: {}", plugin_id));
            }
        }
        tx.execute(
            "DELETE FROM strategy_plugins WHERE strategy_id = ?1",
            params![strategy_id],
        )?;
        for (position, plugin_id) in plugin_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO strategy_plugins (strategy_id, plugin_id, position) VALUES (?1, ?2, ?3)",
                params![strategy_id, plugin_id, position as i64],
            )?;
        }
        tx.execute(
            "UPDATE strategies SET updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
            params![strategy_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub async fn list_strategy_plugins(&self, strategy_id: &str) -> Result<Vec<PluginRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT p.id, p.tenant_id, p.name, p.description, p.executor_type, p.entrypoint, p.xp_reward, p.created_at
             FROM strategy_plugins sp JOIN plugins p ON p.id = sp.plugin_id
             WHERE sp.strategy_id = ?1 ORDER BY sp.position ASC",
        )?;
        let rows = stmt.query_map(params![strategy_id], |row| {
            Ok(PluginRecord {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                executor_type: row.get(4)?,
                entrypoint: row.get(5)?,
                xp_reward: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
