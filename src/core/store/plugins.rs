use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use super::types::{NewPlugin, PluginRecord};
use super::{Store, new_id};

fn plugin_from_row(row: &Row<'_>) -> rusqlite::Result<PluginRecord> {
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
}

impl Store {
    pub async fn create_plugin(&self, plugin: &NewPlugin) -> Result<PluginRecord> {
        let id = new_id();
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO plugins (id, tenant_id, name, description, executor_type, entrypoint, xp_reward)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                plugin.tenant_id,
                plugin.name,
                plugin.description,
                plugin.executor_type,
                plugin.entrypoint,
                plugin.xp_reward
            ],
        )?;
        let rec = db.query_row(
            "SELECT id, tenant_id, name, description, executor_type, entrypoint, xp_reward, created_at
             FROM plugins WHERE id = ?1",
            params![id],
            plugin_from_row,
        )?;
        Ok(rec)
    }

    pub async fn get_plugin(&self, tenant_id: &str, id: &str) -> Result<Option<PluginRecord>> {
        let db = self.db.lock().await;
        let rec = db
            .query_row(
                "SELECT id, tenant_id, name, description, executor_type, entrypoint, xp_reward, created_at
                 FROM plugins WHERE tenant_id = ?1 AND id = ?2",
                params![tenant_id, id],
                plugin_from_row,
            )
            .optional()?;
        Ok(rec)
    }

    pub async fn list_plugins(&self, tenant_id: &str) -> Result<Vec<PluginRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, tenant_id, name, description, executor_type, entrypoint, xp_reward, created_at
             FROM plugins WHERE tenant_id = ?1 ORDER BY name ASC",
        )?;
        let rows = stmt.query_map(params![tenant_id], plugin_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
