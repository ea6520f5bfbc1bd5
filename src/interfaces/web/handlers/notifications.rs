use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::super::AppState;
use super::rejected;
use crate::core::execution::ServiceResult;
use crate::core::notify::NotificationDraft;
use crate::core::store::NotificationRecord;

#[derive(serde::Deserialize)]
pub struct SendNotificationRequest {
    #[serde(flatten)]
    draft: NotificationDraft,
    /// Roles to fan out to; empty means every user of the tenant.
    #[serde(default)]
    roles: Vec<String>,
    /// Addresses a single user instead of fanning out.
    #[serde(default)]
    user_id: Option<String>,
}

pub async fn send_notification(
    Path(tenant): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Json<ServiceResult<Vec<NotificationRecord>>> {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    let notifications = &state.services.notifications;
    let result = match payload.user_id.as_deref().filter(|u| !u.is_empty()) {
        Some(user) => notifications
            .notify_user(&tenant, user, &payload.draft)
            .await
            .map(|n| vec![n]),
        None => {
            notifications
                .fan_out(&tenant, &payload.roles, &payload.draft)
                .await
        }
    };
    Json(result.into())
}

#[derive(serde::Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    unread_only: bool,
    limit: Option<usize>,
}

#[derive(serde::Serialize)]
pub struct NotificationList {
    notifications: Vec<NotificationRecord>,
    unread: i64,
}

pub async fn list_notifications(
    Path((tenant, user)): Path<(String, String)>,
    Query(query): Query<NotificationQuery>,
    State(state): State<AppState>,
) -> Json<ServiceResult<NotificationList>> {
    let service = &state.services.notifications;
    let notifications = match service
        .list(&tenant, &user, query.unread_only, query.limit)
        .await
    {
        Ok(list) => list,
        Err(e) => return Json(ServiceResult::fail(e.to_string())),
    };
    let unread = service.unread_count(&tenant, &user).await;
    Json(
        unread
            .map(|unread| NotificationList {
                notifications,
                unread,
            })
            .into(),
    )
}

pub async fn mark_notification_read(
    Path((tenant, user, id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Json<ServiceResult<NotificationRecord>> {
    match state.services.notifications.mark_read(&tenant, &user, &id).await {
        Ok(Some(n)) => Json(ServiceResult::ok(n)),
        Ok(None) => Json(ServiceResult::fail(format!("Notification not found: {}", id))),
        Err(e) => Json(ServiceResult::fail(e.to_string())),
    }
}

pub async fn mark_all_notifications_read(
    Path((tenant, user)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Json<ServiceResult<usize>> {
    Json(
        state
            .services
            .notifications
            .mark_all_read(&tenant, &user)
            .await
            .into(),
    )
}

pub async fn delete_notification(
    Path((tenant, user, id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Json<ServiceResult<bool>> {
    match state.services.notifications.delete(&tenant, &user, &id).await {
        Ok(true) => Json(ServiceResult::ok(true)),
        Ok(false) => Json(ServiceResult::fail(format!("Notification not found: {}", id))),
        Err(e) => Json(ServiceResult::fail(e.to_string())),
    }
}

/// Live feed of one user's notification changes.
pub async fn notification_stream(
    Path((tenant, user)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.services.notifications.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(move |msg| {
        let event = msg.ok()?;
        if !event.belongs_to(&tenant, &user) {
            return None;
        }
        let payload = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event("notification").data(payload)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
