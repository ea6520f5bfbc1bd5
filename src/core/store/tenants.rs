use anyhow::Result;
use rusqlite::{OptionalExtension, params, params_from_iter};

use super::Store;
use super::types::{TenantRecord, TenantUserRecord};

impl Store {
    pub async fn create_tenant(&self, id: &str, name: &str) -> Result<TenantRecord> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO tenants (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        let rec = db.query_row(
            "SELECT id, name, created_at FROM tenants WHERE id = ?1",
            params![id],
            |row| {
                Ok(TenantRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )?;
        Ok(rec)
    }

    pub async fn get_tenant(&self, id: &str) -> Result<Option<TenantRecord>> {
        let db = self.db.lock().await;
        let rec = db
            .query_row(
                "SELECT id, name, created_at FROM tenants WHERE id = ?1",
                params![id],
                |row| {
                    Ok(TenantRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(rec)
    }

    pub async fn list_tenants(&self) -> Result<Vec<TenantRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare("SELECT id, name, created_at FROM tenants ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TenantRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub async fn set_user_role(&self, tenant_id: &str, user_id: &str, role: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO tenant_user_roles (tenant_id, user_id, role) VALUES (?1, ?2, ?3)
             ON CONFLICT(tenant_id, user_id) DO UPDATE SET role = excluded.role",
            params![tenant_id, user_id, role],
        )?;
        Ok(())
    }

    pub async fn get_user_role(&self, tenant_id: &str, user_id: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let role = db
            .query_row(
                "SELECT role FROM tenant_user_roles WHERE tenant_id = ?1 AND user_id = ?2",
                params![tenant_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(role)
    }

    /// Users of a tenant, optionally restricted to the given roles. An empty
    /// role list means every user.
    pub async fn list_tenant_users(
        &self,
        tenant_id: &str,
        roles: &[String],
    ) -> Result<Vec<TenantUserRecord>> {
        let db = self.db.lock().await;
        let mut sql =
            "SELECT tenant_id, user_id, role FROM tenant_user_roles WHERE tenant_id = ?1"
                .to_string();
        let mut values: Vec<String> = vec![tenant_id.to_string()];
        if !roles.is_empty() {
            let placeholders: Vec<String> =
                (0..roles.len()).map(|i| format!("?{}", i + 2)).collect();
            sql.push_str(&format!(" AND role IN ({})", placeholders.join(", ")));
            values.extend(roles.iter().cloned());
        }
        sql.push_str(" ORDER BY user_id ASC");

        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(TenantUserRecord {
                tenant_id: row.get(0)?,
                user_id: row.get(1)?,
                role: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
