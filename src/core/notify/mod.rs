//! User-facing feedback: toasts, the system-log event sink and per-user
//! notifications.

mod notifications;
mod sink;
mod toast;

pub use notifications::{
    DEFAULT_NOTIFICATION_LIMIT, NotificationDraft, NotificationEvent, NotificationService,
};
pub use sink::{ALERT_FUNCTION, Event, EventSink};
#[cfg(test)]
pub(crate) use toast::RecordingToasts;
pub use toast::{BroadcastToasts, TerminalToasts, Toast, ToastKind, ToastSink};
