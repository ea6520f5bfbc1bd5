use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use super::toast::{Toast, ToastKind, ToastSink};
use crate::core::edge::EdgeClient;
use crate::core::logs::{LogLevel, Severity};
use crate::core::store::{NewSystemLog, Store};

pub const ALERT_FUNCTION: &str = "send-webhook-alert";

/// A milestone or failure worth both a toast and a system-log row.
#[derive(Debug, Clone)]
pub struct Event {
    pub tenant_id: String,
    pub module: String,
    pub event: String,
    pub level: LogLevel,
    /// Falls back to the level's default severity.
    pub severity: Option<Severity>,
    pub toast: ToastKind,
    pub title: String,
    pub description: String,
    pub context: Option<Value>,
}

impl Event {
    pub fn success(
        tenant_id: &str,
        module: &str,
        event: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::build(tenant_id, module, event, LogLevel::Info, ToastKind::Success)
            .titled(title, description)
    }

    pub fn warning(
        tenant_id: &str,
        module: &str,
        event: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::build(tenant_id, module, event, LogLevel::Warning, ToastKind::Warning)
            .titled(title, description)
    }

    pub fn failure(
        tenant_id: &str,
        module: &str,
        event: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::build(tenant_id, module, event, LogLevel::Error, ToastKind::Error)
            .titled(title, description)
    }

    fn build(tenant_id: &str, module: &str, event: &str, level: LogLevel, toast: ToastKind) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            module: module.to_string(),
            event: event.to_string(),
            level,
            severity: None,
            toast,
            title: String::new(),
            description: String::new(),
            context: None,
        }
    }

    fn titled(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.title = title.into();
        self.description = description.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or(self.level.default_severity())
    }

    fn to_system_log(&self) -> NewSystemLog {
        NewSystemLog {
            tenant_id: self.tenant_id.clone(),
            module: self.module.clone(),
            level: self.level.as_str().to_string(),
            severity: self.effective_severity().as_str().to_string(),
            event: self.event.clone(),
            description: if self.description.is_empty() {
                self.title.clone()
            } else {
                self.description.clone()
            },
            context: self.context.clone(),
        }
    }
}

/// Counts one background write; the count drops when the write task ends.
struct InFlight(Arc<watch::Sender<usize>>);

impl InFlight {
    fn enter(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

/// Shows toasts immediately and persists the matching system-log rows in the
/// background.
#[derive(Clone)]
pub struct EventSink {
    store: Store,
    toasts: Arc<dyn ToastSink>,
    alerts: Option<EdgeClient>,
    in_flight: Arc<watch::Sender<usize>>,
}

impl EventSink {
    pub fn new(store: Store, toasts: Arc<dyn ToastSink>) -> Self {
        Self {
            store,
            toasts,
            alerts: None,
            in_flight: Arc::new(watch::channel(0).0),
        }
    }

    /// Critical events are forwarded to the alert edge function.
    pub fn with_alerts(mut self, client: Option<EdgeClient>) -> Self {
        self.alerts = client;
        self
    }

    /// Toast only; used when there is nothing to persist.
    pub fn toast(&self, toast: Toast) {
        self.toasts.show(&toast);
    }

    /// Waits for the background writes of every event emitted so far. One-shot
    /// CLI commands call this before exiting.
    pub async fn flush(&self) {
        let mut pending = self.in_flight.subscribe();
        let _ = pending.wait_for(|n| *n == 0).await;
    }

    /// The returned handle is for tests; callers are not expected to await it.
    pub fn emit(&self, event: Event) -> JoinHandle<()> {
        self.toasts
            .show(&Toast::new(event.toast, event.title.clone(), event.description.clone()));

        let store = self.store.clone();
        let toasts = Arc::clone(&self.toasts);
        let alerts = self.alerts.clone();
        let guard = InFlight::enter(&self.in_flight);
        tokio::spawn(async move {
            let _guard = guard;
            let log = event.to_system_log();
            match store.insert_system_log(&log).await {
                Ok(record) => {
                    if event.effective_severity() == Severity::Critical
                        && let Some(client) = alerts
                    {
                        let payload = json!({
                            "tenant_id": record.tenant_id,
                            "log_id": record.id,
                            "module": record.module,
                            "event": record.event,
                            "description": record.description,
                            "context": record.context,
                            "created_at": record.created_at,
                        });
                        let res = client.invoke(ALERT_FUNCTION, &payload).await;
                        if let Some(err) = res.error {
                            warn!("Critical alert for log {} not delivered: {}", record.id, err);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "System log write failed for [{}:{}]: {}",
                        log.module, log.event, e
                    );
                    toasts.show(&Toast::new(ToastKind::Error, "Logging failed", e.to_string()));
                }
            }
        })
    }
}
