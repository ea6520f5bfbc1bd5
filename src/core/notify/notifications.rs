use anyhow::{Result, bail};
use tokio::sync::broadcast;
use tracing::info;

use crate::core::store::{NewNotification, NotificationRecord, Store};

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Content of a notification before it is addressed to a user.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_type")]
    pub notification_type: String,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub action_label: Option<String>,
}

fn default_type() -> String {
    "info".to_string()
}

impl NotificationDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            notification_type: default_type(),
            action_url: None,
            action_label: None,
        }
    }

    fn addressed(&self, tenant_id: &str, user_id: &str) -> NewNotification {
        NewNotification {
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            notification_type: self.notification_type.clone(),
            action_url: self.action_url.clone(),
            action_label: self.action_label.clone(),
        }
    }
}

/// Change feed for one user's notifications, streamed over SSE.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    Created {
        notification: NotificationRecord,
    },
    Read {
        notification: NotificationRecord,
    },
    AllRead {
        tenant_id: String,
        user_id: String,
        count: usize,
    },
    Deleted {
        tenant_id: String,
        user_id: String,
        id: String,
    },
}

impl NotificationEvent {
    pub fn belongs_to(&self, tenant_id: &str, user_id: &str) -> bool {
        let (t, u) = match self {
            NotificationEvent::Created { notification } | NotificationEvent::Read { notification } => {
                (&notification.tenant_id, &notification.user_id)
            }
            NotificationEvent::AllRead {
                tenant_id, user_id, ..
            }
            | NotificationEvent::Deleted {
                tenant_id, user_id, ..
            } => (tenant_id, user_id),
        };
        t == tenant_id && u == user_id
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Store,
    tx: broadcast::Sender<NotificationEvent>,
}

impl NotificationService {
    pub fn new(store: Store) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { store, tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }

    pub async fn notify_user(
        &self,
        tenant_id: &str,
        user_id: &str,
        draft: &NotificationDraft,
    ) -> Result<NotificationRecord> {
        if draft.title.trim().is_empty() {
            bail!("Notification title is required");
        }
        if user_id.trim().is_empty() {
            bail!("User ID is required");
        }
        let record = self
            .store
            .insert_notification(&draft.addressed(tenant_id, user_id))
            .await?;
        let _ = self.tx.send(NotificationEvent::Created {
            notification: record.clone(),
        });
        Ok(record)
    }

    /// One notification per tenant user holding any of `roles`; an empty role
    /// list addresses every user of the tenant.
    pub async fn fan_out(
        &self,
        tenant_id: &str,
        roles: &[String],
        draft: &NotificationDraft,
    ) -> Result<Vec<NotificationRecord>> {
        if draft.title.trim().is_empty() {
            bail!("Notification title is required");
        }
        let users = self.store.list_tenant_users(tenant_id, roles).await?;
        let mut out = Vec::with_capacity(users.len());
        for user in users {
            out.push(self.notify_user(tenant_id, &user.user_id, draft).await?);
        }
        info!(
            "Fanned out notification '{}' to {} users of tenant {}",
            draft.title,
            out.len(),
            tenant_id
        );
        Ok(out)
    }

    pub async fn list(
        &self,
        tenant_id: &str,
        user_id: &str,
        unread_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<NotificationRecord>> {
        let limit = limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT).clamp(1, 500);
        self.store
            .list_notifications(tenant_id, user_id, unread_only, limit)
            .await
    }

    /// Idempotent: a second call returns the record with its original `read_at`.
    pub async fn mark_read(
        &self,
        tenant_id: &str,
        user_id: &str,
        id: &str,
    ) -> Result<Option<NotificationRecord>> {
        let record = self.store.mark_notification_read(tenant_id, user_id, id).await?;
        if let Some(notification) = &record {
            let _ = self.tx.send(NotificationEvent::Read {
                notification: notification.clone(),
            });
        }
        Ok(record)
    }

    pub async fn mark_all_read(&self, tenant_id: &str, user_id: &str) -> Result<usize> {
        let count = self
            .store
            .mark_all_notifications_read(tenant_id, user_id)
            .await?;
        if count > 0 {
            let _ = self.tx.send(NotificationEvent::AllRead {
                tenant_id: tenant_id.to_string(),
                user_id: user_id.to_string(),
                count,
            });
        }
        Ok(count)
    }

    pub async fn delete(&self, tenant_id: &str, user_id: &str, id: &str) -> Result<bool> {
        let deleted = self.store.delete_notification(tenant_id, user_id, id).await?;
        if deleted {
            let _ = self.tx.send(NotificationEvent::Deleted {
                tenant_id: tenant_id.to_string(),
                user_id: user_id.to_string(),
                id: id.to_string(),
            });
        }
        Ok(deleted)
    }

    pub async fn unread_count(&self, tenant_id: &str, user_id: &str) -> Result<i64> {
        self.store.unread_notification_count(tenant_id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::test_store;

    #[tokio::test]
    async fn fan_out_by_role_reaches_distinct_users() {
        let service = NotificationService::new(test_store().await);
        let draft = NotificationDraft::new("Strategy awaiting review", "Q3 expansion");
        let sent = service
            .fan_out("t1", &["owner".to_string(), "reviewer".to_string()], &draft)
            .await
            .unwrap();
        let mut users: Vec<_> = sent.iter().map(|n| n.user_id.clone()).collect();
        users.sort();
        assert_eq!(users, vec!["alice", "bob"]);
        assert!(sent.iter().all(|n| n.read_at.is_none()));
    }

    #[tokio::test]
    async fn fan_out_without_roles_reaches_everyone() {
        let service = NotificationService::new(test_store().await);
        let sent = service
            .fan_out("t1", &[], &NotificationDraft::new("Maintenance", ""))
            .await
            .unwrap();
        assert_eq!(sent.len(), 3);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let service = NotificationService::new(test_store().await);
        let err = service
            .notify_user("t1", "alice", &NotificationDraft::new("  ", "d"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[tokio::test]
    async fn read_state_and_counts() {
        let service = NotificationService::new(test_store().await);
        let draft = NotificationDraft::new("Hello", "");
        let first = service.notify_user("t1", "alice", &draft).await.unwrap();
        service.notify_user("t1", "alice", &draft).await.unwrap();
        assert_eq!(service.unread_count("t1", "alice").await.unwrap(), 2);

        let read = service.mark_read("t1", "alice", &first.id).await.unwrap().unwrap();
        let again = service.mark_read("t1", "alice", &first.id).await.unwrap().unwrap();
        assert_eq!(read.read_at, again.read_at);
        assert_eq!(service.unread_count("t1", "alice").await.unwrap(), 1);

        let unread = service.list("t1", "alice", true, None).await.unwrap();
        assert_eq!(unread.len(), 1);

        assert_eq!(service.mark_all_read("t1", "alice").await.unwrap(), 1);
        assert_eq!(service.mark_all_read("t1", "alice").await.unwrap(), 0);
        assert_eq!(service.unread_count("t1", "alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn events_are_scoped_to_user() {
        let service = NotificationService::new(test_store().await);
        let mut rx = service.subscribe();
        let created = service
            .notify_user("t1", "bob", &NotificationDraft::new("Hi", ""))
            .await
            .unwrap();
        assert!(service.delete("t1", "bob", &created.id).await.unwrap());
        assert!(!service.delete("t1", "bob", &created.id).await.unwrap());

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, NotificationEvent::Created { .. }));
        assert!(first.belongs_to("t1", "bob"));
        assert!(!first.belongs_to("t1", "alice"));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, NotificationEvent::Deleted { .. }));
        assert!(rx.try_recv().is_err());
    }
}
