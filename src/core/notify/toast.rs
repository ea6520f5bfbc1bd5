use tokio::sync::broadcast;

use crate::core::terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
}

impl Toast {
    pub fn new(kind: ToastKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Where user-facing toasts are shown. Must never block.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: &Toast);
}

/// Styled terminal output for CLI commands.
pub struct TerminalToasts;

impl ToastSink for TerminalToasts {
    fn show(&self, toast: &Toast) {
        let line = if toast.description.is_empty() {
            toast.title.clone()
        } else {
            format!("{}: {}", toast.title, toast.description)
        };
        match toast.kind {
            ToastKind::Success => terminal::print_success(&line),
            ToastKind::Error => terminal::print_error(&line),
            ToastKind::Warning => terminal::print_warn(&line),
            ToastKind::Info => terminal::print_info(&line),
        }
    }
}

/// Fans toasts out to SSE subscribers. Dropped when nobody listens.
#[derive(Clone)]
pub struct BroadcastToasts {
    tx: broadcast::Sender<Toast>,
}

impl BroadcastToasts {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }
}

impl ToastSink for BroadcastToasts {
    fn show(&self, toast: &Toast) {
        let _ = self.tx.send(toast.clone());
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingToasts {
    toasts: std::sync::Mutex<Vec<Toast>>,
}

#[cfg(test)]
impl RecordingToasts {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.toasts().into_iter().map(|t| t.title).collect()
    }
}

#[cfg(test)]
impl ToastSink for RecordingToasts {
    fn show(&self, toast: &Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(toast.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let toasts = BroadcastToasts::new(8);
        let mut rx = toasts.subscribe();
        toasts.show(&Toast::new(ToastKind::Success, "Strategy executed", "3 plugins"));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.kind, ToastKind::Success);
        assert_eq!(got.title, "Strategy executed");
    }

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        BroadcastToasts::new(1).show(&Toast::new(ToastKind::Info, "nobody", ""));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_value(Toast::new(ToastKind::Warning, "t", "d")).unwrap();
        assert_eq!(json["kind"], "warning");
    }
}
