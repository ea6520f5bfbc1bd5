use anyhow::Result;
use console::style;

use super::{finish, open_services, parse_flags, sub_command};
use crate::core::execution::ServiceResult;
use crate::core::notify::NotificationDraft;
use crate::core::terminal::{GuideSection, print_success};

pub async fn run_notify_command(args: &[String]) -> Result<()> {
    let flags = parse_flags(args, 3);
    match sub_command(args) {
        "list" | "ls" => {
            let user = flags.require("user")?;
            let limit = flags.number("limit")?;
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services
                .notifications
                .list(flags.tenant(), user, flags.has("unread"), limit)
                .await
                .into();
            finish(&flags, result, |notifications| {
                let mut section = GuideSection::new(&format!("Notifications · {}", user));
                for n in notifications {
                    let marker = if n.read_at.is_some() {
                        style("·").dim().to_string()
                    } else {
                        style("●").cyan().to_string()
                    };
                    section = section.status(
                        &n.id,
                        &format!("{} [{}] {}  {}", marker, n.notification_type, n.title, n.description),
                    );
                }
                if notifications.is_empty() {
                    section = section.text("Nothing here.");
                }
                section.print();
                println!();
            })
        }
        "send" => {
            let mut draft = NotificationDraft::new(
                flags.require("title")?,
                flags.get("description").unwrap_or_default(),
            );
            if let Some(kind) = flags.get("type") {
                draft.notification_type = kind.to_string();
            }
            draft.action_url = flags.get("url").map(str::to_string);
            draft.action_label = flags.get("label").map(str::to_string);

            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> = match flags.get("user") {
                Some(user) => services
                    .notifications
                    .notify_user(tenant, user, &draft)
                    .await
                    .map(|n| vec![n])
                    .into(),
                None => services
                    .notifications
                    .fan_out(tenant, &flags.list("roles"), &draft)
                    .await
                    .into(),
            };
            finish(&flags, result, |sent| {
                print_success(&format!("Notification sent to {} users", sent.len()))
            })
        }
        "read" => {
            let id = flags.id("Notification")?;
            let user = flags.require("user")?;
            let services = open_services(&flags).await?;
            let result = match services.notifications.mark_read(flags.tenant(), user, id).await {
                Ok(Some(n)) => ServiceResult::ok(n),
                Ok(None) => ServiceResult::fail(format!("Notification not found: {}", id)),
                Err(e) => ServiceResult::fail(e.to_string()),
            };
            finish(&flags, result, |n| print_success(&format!("Marked {} as read", n.id)))
        }
        "read-all" => {
            let user = flags.require("user")?;
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services
                .notifications
                .mark_all_read(flags.tenant(), user)
                .await
                .into();
            finish(&flags, result, |count| {
                print_success(&format!("Marked {} notifications as read", count))
            })
        }
        "delete" | "rm" => {
            let id = flags.id("Notification")?;
            let user = flags.require("user")?;
            let services = open_services(&flags).await?;
            let result = match services.notifications.delete(flags.tenant(), user, id).await {
                Ok(true) => ServiceResult::ok(true),
                Ok(false) => ServiceResult::fail(format!("Notification not found: {}", id)),
                Err(e) => ServiceResult::fail(e.to_string()),
            };
            finish(&flags, result, |_| print_success(&format!("Deleted {}", id)))
        }
        _ => {
            GuideSection::new("allora notify")
                .command("list --user <id> [--unread]", "A user's notifications, newest first")
                .command("send --title <t> [--roles a,b | --user <id>]", "Notify users")
                .command("read <id> --user <id>", "Mark one as read")
                .command("read-all --user <id>", "Mark all as read")
                .command("delete <id> --user <id>", "Delete one")
                .print();
            println!();
            Ok(())
        }
    }
}
