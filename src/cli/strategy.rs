use anyhow::{Result, anyhow};
use console::style;

use super::{CommandFlags, finish, open_services, parse_flags, sub_command};
use crate::core::execution::{RunOutcome, RunRequest, ServiceResult};
use crate::core::services::Services;
use crate::core::store::StrategyRecord;
use crate::core::strategies::{ReviewRequest, StrategyDraft};
use crate::core::terminal::{GuideSection, print_success};

pub async fn run_strategy_command(args: &[String]) -> Result<()> {
    let flags = parse_flags(args, 3);
    match sub_command(args) {
        "create" => {
            let draft = StrategyDraft {
                title: flags.require("title")?.to_string(),
                description: flags.get("description").unwrap_or_default().to_string(),
                priority: flags.get("priority").map(str::to_string),
                tags: flags.list("tags"),
                due_date: flags.get("due").map(str::to_string),
                status: flags.has("submit").then(|| "pending".to_string()),
                created_by: flags.get("by").map(str::to_string),
            };
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> =
                services.strategies.create(flags.tenant(), &draft).await.into();
            services.events.flush().await;
            finish(&flags, result, |s| {
                print_success(&format!("Strategy {} created ({})", s.id, s.status))
            })
        }
        "list" | "ls" => {
            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> = services
                .store
                .list_strategies(tenant, flags.get("status"))
                .await
                .into();
            finish(&flags, result, |strategies| {
                let mut section = GuideSection::new(&format!("Strategies · {}", tenant));
                for s in strategies {
                    section = section.status(
                        &s.id,
                        &format!("{} {} [{}]", status_badge(&s.status), s.title, s.priority),
                    );
                }
                if strategies.is_empty() {
                    section = section.text("No strategies match.");
                }
                section.print();
                println!();
            })
        }
        "show" => {
            let services = open_services(&flags).await?;
            let id = flags.id("Strategy")?;
            let result: ServiceResult<(StrategyRecord, Vec<String>)> =
                show(&services, flags.tenant(), id).await.into();
            finish(&flags, result, |(s, plugins)| {
                strategy_section(s)
                    .status(
                        "plugins",
                        &if plugins.is_empty() {
                            "-".to_string()
                        } else {
                            plugins.join(" → ")
                        },
                    )
                    .print();
                println!();
            })
        }
        "submit" => review(&flags, "pending").await,
        "approve" => review(&flags, "approved").await,
        "reject" => review(&flags, "rejected").await,
        "plugins" => {
            let id = flags.id("Strategy")?;
            let plugin_ids = flags.list("plugins");
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services
                .strategies
                .set_plugins(flags.tenant(), id, &plugin_ids)
                .await
                .into();
            finish(&flags, result, |plugins| {
                print_success(&format!("Strategy {} now runs {} plugins", id, plugins.len()))
            })
        }
        "run" => {
            let id = flags.id("Strategy")?;
            let input = match flags.get("input") {
                Some(raw) => Some(
                    serde_json::from_str(raw).map_err(|e| anyhow!("--input is not valid JSON: {}", e))?,
                ),
                None => None,
            };
            let services = open_services(&flags).await?;
            let request = RunRequest {
                strategy_id: id.to_string(),
                tenant_id: flags.tenant().to_string(),
                executed_by: flags.get("by").map(str::to_string),
                input,
            };
            let result = services.tracker.run_strategy(&request).await;
            services.events.flush().await;
            finish(&flags, result, print_outcome)
        }
        "generate" => {
            let prompt = flags.require("prompt")?;
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services
                .strategies
                .generate(flags.tenant(), prompt, flags.get("by"))
                .await
                .into();
            services.events.flush().await;
            finish(&flags, result, |s| {
                print_success(&format!("Draft strategy {} generated", s.id));
                strategy_section(s).print();
                println!();
            })
        }
        _ => {
            GuideSection::new("allora strategy")
                .command("create --title <t> [--submit]", "Create a draft (or submit it right away)")
                .command("list [--status <s>]", "List strategies")
                .command("show <id>", "Show one strategy and its plugin chain")
                .command("submit <id> [--by <user>]", "Submit for review")
                .command("approve <id> --by <user>", "Approve (owner, admin or reviewer)")
                .command("reject <id> --by <user>", "Reject (owner, admin or reviewer)")
                .command("plugins <id> --plugins <p1,p2>", "Set the ordered plugin chain")
                .command("run <id> [--input <json>]", "Execute an approved strategy")
                .command("generate --prompt <text>", "Draft a strategy with the generator")
                .print();
            println!();
            Ok(())
        }
    }
}

async fn show(services: &Services, tenant: &str, id: &str) -> Result<(StrategyRecord, Vec<String>)> {
    let strategy = services
        .store
        .get_strategy(tenant, id)
        .await?
        .ok_or_else(|| anyhow!("Strategy not found: {}", id))?;
    let plugins = services
        .store
        .list_strategy_plugins(&strategy.id)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    Ok((strategy, plugins))
}

async fn review(flags: &CommandFlags, status: &str) -> Result<()> {
    let id = flags.id("Strategy")?;
    let request = ReviewRequest {
        status: status.to_string(),
        reviewer: flags.get("by").map(str::to_string),
    };
    let services = open_services(flags).await?;
    let result: ServiceResult<_> = services
        .strategies
        .review(flags.tenant(), id, &request)
        .await
        .into();
    services.events.flush().await;
    finish(flags, result, |s| {
        print_success(&format!("Strategy {} is now {}", s.id, s.status))
    })
}

fn status_badge(status: &str) -> String {
    let label = format!("{:<11}", status);
    match status {
        "approved" | "completed" => style(label).green().to_string(),
        "pending" | "in_progress" => style(label).yellow().to_string(),
        "rejected" => style(label).red().to_string(),
        _ => style(label).dim().to_string(),
    }
}

fn strategy_section(s: &StrategyRecord) -> GuideSection {
    GuideSection::new(&s.title)
        .status("id", &s.id)
        .status("status", &s.status)
        .status("priority", &s.priority)
        .status("tags", &if s.tags.is_empty() { "-".to_string() } else { s.tags.join(", ") })
        .status("due", s.due_date.as_deref().unwrap_or("-"))
        .status("created by", s.created_by.as_deref().unwrap_or("-"))
        .status("approved by", s.approved_by.as_deref().unwrap_or("-"))
        .text(&s.description)
}

fn print_outcome(outcome: &RunOutcome) {
    let e = &outcome.execution;
    let mut section = GuideSection::new(&format!("Execution {}", e.id))
        .status("status", &e.status)
        .status("xp earned", &e.xp_earned.to_string())
        .status(
            "time",
            &e.execution_time
                .map(|ms| format!("{} ms", ms))
                .unwrap_or_else(|| "-".to_string()),
        )
        .blank();
    for p in &outcome.plugins {
        let line = match &p.error {
            Some(err) => format!("{} {}", style("✗").red(), err),
            None => format!("{} +{} XP in {} ms", style("✓").green(), p.xp_earned, p.execution_time),
        };
        section = section.status(&p.plugin_name, &line);
    }
    section
        .blank()
        .hint(&format!("allora execution show {}", e.id), "")
        .print();
    println!();
}
