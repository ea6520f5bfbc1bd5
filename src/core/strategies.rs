//! Strategy authoring and review.

use anyhow::{Result, anyhow, bail};
use serde_json::json;
use tracing::info;

use crate::core::edge::EdgeClient;
use crate::core::execution::{StrategyStatus, can_review};
use crate::core::notify::{Event, EventSink, NotificationDraft, NotificationService};
use crate::core::store::{NewStrategy, Store, StrategyRecord};

pub const GENERATE_FUNCTION: &str = "generateStrategy";
pub const REVIEWER_ROLES: [&str; 3] = ["owner", "admin", "reviewer"];
pub const TENANT_ROLES: [&str; 4] = ["owner", "admin", "reviewer", "member"];

const MODULE: &str = "strategies";

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct StrategyDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    /// `draft` (default) or `pending` to submit right away.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ReviewRequest {
    pub status: String,
    #[serde(default)]
    pub reviewer: Option<String>,
}

#[derive(Clone)]
pub struct StrategyService {
    store: Store,
    events: EventSink,
    notifications: NotificationService,
    edge: Option<EdgeClient>,
}

impl StrategyService {
    pub fn new(
        store: Store,
        events: EventSink,
        notifications: NotificationService,
        edge: Option<EdgeClient>,
    ) -> Self {
        Self {
            store,
            events,
            notifications,
            edge,
        }
    }

    pub async fn create(&self, tenant_id: &str, draft: &StrategyDraft) -> Result<StrategyRecord> {
        let title = draft.title.trim();
        if title.is_empty() {
            bail!("Strategy title is required");
        }
        let status = match draft.status.as_deref().map(str::trim) {
            None | Some("") => StrategyStatus::Draft,
            Some(s) => match StrategyStatus::parse(s) {
                Some(st @ (StrategyStatus::Draft | StrategyStatus::Pending)) => st,
                _ => bail!("New strategies start as draft or pending, not '{}'", s),
            },
        };
        let priority = draft
            .priority
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("medium");

        let strategy = self
            .store
            .create_strategy(&NewStrategy {
                tenant_id: tenant_id.to_string(),
                title: title.to_string(),
                description: draft.description.clone(),
                status: status.as_str().to_string(),
                priority: priority.to_string(),
                tags: draft.tags.clone(),
                due_date: draft.due_date.clone(),
                created_by: draft.created_by.clone(),
            })
            .await?;
        info!("Created strategy {} [{}] for tenant {}", strategy.id, strategy.title, tenant_id);

        if status == StrategyStatus::Pending {
            self.request_review(&strategy).await?;
        }
        Ok(strategy)
    }

    /// Applies a reviewer action. Approving or rejecting needs a reviewer with
    /// one of [`REVIEWER_ROLES`] in the tenant.
    pub async fn review(
        &self,
        tenant_id: &str,
        strategy_id: &str,
        request: &ReviewRequest,
    ) -> Result<StrategyRecord> {
        let target = StrategyStatus::parse(request.status.trim())
            .ok_or_else(|| anyhow!("Unknown strategy status: {}", request.status))?;
        let strategy = self
            .store
            .get_strategy(tenant_id, strategy_id)
            .await?
            .ok_or_else(|| anyhow!("Strategy not found: {}", strategy_id))?;
        let current = StrategyStatus::parse(&strategy.status)
            .ok_or_else(|| anyhow!("Strategy has unknown status: {}", strategy.status))?;
        if !can_review(current, target) {
            bail!(
                "Cannot move strategy from {} to {}",
                current.as_str(),
                target.as_str()
            );
        }

        let reviewer = request
            .reviewer
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let decides = matches!(target, StrategyStatus::Approved | StrategyStatus::Rejected);
        if decides {
            let reviewer = reviewer.ok_or_else(|| anyhow!("Reviewer is required"))?;
            let role = self.store.get_user_role(tenant_id, reviewer).await?;
            if !role.as_deref().is_some_and(|r| REVIEWER_ROLES.contains(&r)) {
                bail!("User {} is not allowed to review strategies", reviewer);
            }
        }

        let approved_by = if target == StrategyStatus::Approved {
            reviewer
        } else {
            None
        };
        self.store
            .set_strategy_status(tenant_id, strategy_id, target.as_str(), approved_by)
            .await?;
        let updated = self
            .store
            .get_strategy(tenant_id, strategy_id)
            .await?
            .ok_or_else(|| anyhow!("Strategy not found: {}", strategy_id))?;

        let context = json!({
            "strategy_id": updated.id,
            "from": current.as_str(),
            "to": target.as_str(),
            "reviewer": reviewer,
        });
        match target {
            StrategyStatus::Pending => {
                self.events.emit(
                    Event::success(
                        tenant_id,
                        MODULE,
                        "strategy_submitted",
                        "Strategy submitted",
                        format!("{} is awaiting review", updated.title),
                    )
                    .with_context(context),
                );
                self.request_review(&updated).await?;
            }
            StrategyStatus::Approved | StrategyStatus::Rejected => {
                let approved = target == StrategyStatus::Approved;
                let (event, title) = if approved {
                    ("strategy_approved", "Strategy approved")
                } else {
                    ("strategy_rejected", "Strategy rejected")
                };
                let description = format!(
                    "{} was {} by {}",
                    updated.title,
                    target.as_str(),
                    reviewer.unwrap_or("-")
                );
                let ev = if approved {
                    Event::success(tenant_id, MODULE, event, title, description.clone())
                } else {
                    Event::warning(tenant_id, MODULE, event, title, description.clone())
                };
                self.events.emit(ev.with_context(context));

                if let Some(author) = updated.created_by.as_deref() {
                    let mut note = NotificationDraft::new(title, description);
                    note.notification_type = if approved { "success" } else { "warning" }.to_string();
                    note.action_label = Some("View strategy".to_string());
                    note.action_url = Some(format!("/strategies/{}", updated.id));
                    self.notifications.notify_user(tenant_id, author, &note).await?;
                }
            }
            _ => {}
        }
        Ok(updated)
    }

    pub async fn set_plugins(
        &self,
        tenant_id: &str,
        strategy_id: &str,
        plugin_ids: &[String],
    ) -> Result<Vec<crate::core::store::PluginRecord>> {
        self.store
            .set_strategy_plugins(tenant_id, strategy_id, plugin_ids)
            .await?;
        self.store.list_strategy_plugins(strategy_id).await
    }

    /// Asks the `generateStrategy` edge function for a plan and stores it as a
    /// draft.
    pub async fn generate(
        &self,
        tenant_id: &str,
        prompt: &str,
        created_by: Option<&str>,
    ) -> Result<StrategyRecord> {
        let client = self
            .edge
            .as_ref()
            .ok_or_else(|| anyhow!("Edge functions are not configured (set edge.base_url)"))?;
        if prompt.trim().is_empty() {
            bail!("Prompt is required");
        }
        let data = client
            .invoke(
                GENERATE_FUNCTION,
                &json!({ "tenant_id": tenant_id, "prompt": prompt }),
            )
            .await
            .into_result()?;

        #[derive(serde::Deserialize)]
        struct Generated {
            title: String,
            #[serde(default)]
            description: String,
            #[serde(default)]
            priority: Option<String>,
            #[serde(default)]
            tags: Vec<String>,
        }
        let generated: Generated = serde_json::from_value(data)
            .map_err(|e| anyhow!("Unexpected {} response: {}", GENERATE_FUNCTION, e))?;

        self.create(
            tenant_id,
            &StrategyDraft {
                title: generated.title,
                description: generated.description,
                priority: generated.priority,
                tags: generated.tags,
                due_date: None,
                status: None,
                created_by: created_by.map(str::to_string),
            },
        )
        .await
    }

    async fn request_review(&self, strategy: &StrategyRecord) -> Result<()> {
        let roles: Vec<String> = REVIEWER_ROLES.iter().map(|r| r.to_string()).collect();
        let mut note = NotificationDraft::new(
            "Strategy awaiting review",
            format!("{} needs a decision", strategy.title),
        );
        note.action_label = Some("Review".to_string());
        note.action_url = Some(format!("/strategies/{}", strategy.id));
        self.notifications
            .fan_out(&strategy.tenant_id, &roles, &note)
            .await?;
        Ok(())
    }
}
