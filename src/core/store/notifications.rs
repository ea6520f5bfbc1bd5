use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

use super::types::{NewNotification, NotificationRecord};
use super::{Store, new_id};

const NOTIFICATION_COLUMNS: &str =
    "id, tenant_id, user_id, title, description, type, read_at, action_url, action_label, created_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationRecord> {
    Ok(NotificationRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        notification_type: row.get(5)?,
        read_at: row.get(6)?,
        action_url: row.get(7)?,
        action_label: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl Store {
    pub async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationRecord> {
        let id = new_id();
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO notifications (id, tenant_id, user_id, title, description, type, action_url, action_label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                notification.tenant_id,
                notification.user_id,
                notification.title,
                notification.description,
                notification.notification_type,
                notification.action_url,
                notification.action_label
            ],
        )?;
        let rec = db.query_row(
            &format!(
                "SELECT {} FROM notifications WHERE id = ?1",
                NOTIFICATION_COLUMNS
            ),
            params![id],
            notification_from_row,
        )?;
        Ok(rec)
    }

    /// Newest first.
    pub async fn list_notifications(
        &self,
        tenant_id: &str,
        user_id: &str,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(&format!(
            "SELECT {} FROM notifications
             WHERE tenant_id = ?1 AND user_id = ?2 AND (?3 = 0 OR read_at IS NULL)
             ORDER BY created_at DESC, rowid DESC LIMIT ?4",
            NOTIFICATION_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![tenant_id, user_id, unread_only as i32, limit as i64],
            notification_from_row,
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Sets `read_at` the first time only and returns the notification, or
    /// `None` when it does not belong to the user.
    pub async fn mark_notification_read(
        &self,
        tenant_id: &str,
        user_id: &str,
        id: &str,
    ) -> Result<Option<NotificationRecord>> {
        let db = self.db.lock().await;
        db.execute(
            "UPDATE notifications SET read_at = CURRENT_TIMESTAMP
             WHERE tenant_id = ?1 AND user_id = ?2 AND id = ?3 AND read_at IS NULL",
            params![tenant_id, user_id, id],
        )?;
        let rec = db
            .query_row(
                &format!(
                    "SELECT {} FROM notifications WHERE tenant_id = ?1 AND user_id = ?2 AND id = ?3",
                    NOTIFICATION_COLUMNS
                ),
                params![tenant_id, user_id, id],
                notification_from_row,
            )
            .optional()?;
        Ok(rec)
    }

    pub async fn mark_all_notifications_read(&self, tenant_id: &str, user_id: &str) -> Result<usize> {
        let db = self.db.lock().await;
        let rows = db.execute(
            "UPDATE notifications SET read_at = CURRENT_TIMESTAMP
             WHERE tenant_id = ?1 AND user_id = ?2 AND read_at IS NULL",
            params![tenant_id, user_id],
        )?;
        Ok(rows)
    }

    pub async fn delete_notification(&self, tenant_id: &str, user_id: &str, id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let rows = db.execute(
            "DELETE FROM notifications WHERE tenant_id = ?1 AND user_id = ?2 AND id = ?3",
            params![tenant_id, user_id, id],
        )?;
        Ok(rows > 0)
    }

    pub async fn unread_notification_count(&self, tenant_id: &str, user_id: &str) -> Result<i64> {
        let db = self.db.lock().await;
        let count = db.query_row(
            "SELECT COUNT(*) FROM notifications WHERE tenant_id = ?1 AND user_id = ?2 AND read_at IS NULL",
            params![tenant_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
