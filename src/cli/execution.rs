use anyhow::{Result, anyhow};

use super::{finish, open_services, parse_flags, sub_command};
use crate::core::execution::{ExecutionRecordInput, ServiceResult, record_execution};
use crate::core::services::Services;
use crate::core::store::{ExecutionRecord, PluginLogRecord};
use crate::core::terminal::{GuideSection, print_success};

pub async fn run_execution_command(args: &[String]) -> Result<()> {
    let flags = parse_flags(args, 3);
    match sub_command(args) {
        "list" | "ls" => {
            let limit = flags.number::<usize>("limit")?.unwrap_or(20).clamp(1, 500);
            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> = services
                .store
                .list_executions(tenant, flags.get("strategy"), limit)
                .await
                .into();
            finish(&flags, result, |executions| {
                let mut section = GuideSection::new(&format!("Executions · {}", tenant));
                for e in executions {
                    section = section.status(
                        &e.id,
                        &format!(
                            "{:<8} {:<8} +{} XP  {}",
                            e.execution_type, e.status, e.xp_earned, e.started_at
                        ),
                    );
                }
                if executions.is_empty() {
                    section = section.text("No executions yet.");
                }
                section.print();
                println!();
            })
        }
        "show" => {
            let id = flags.id("Execution")?;
            let services = open_services(&flags).await?;
            let result: ServiceResult<(ExecutionRecord, Vec<PluginLogRecord>)> =
                show(&services, flags.tenant(), id).await.into();
            finish(&flags, result, |(e, logs)| {
                let mut section = GuideSection::new(&format!("Execution {}", e.id))
                    .status("type", &e.execution_type)
                    .status("status", &e.status)
                    .status("strategy", e.strategy_id.as_deref().unwrap_or("-"))
                    .status("executed by", e.executed_by.as_deref().unwrap_or("-"))
                    .status("xp earned", &e.xp_earned.to_string())
                    .status("started", &e.started_at)
                    .status("completed", e.completed_at.as_deref().unwrap_or("-"));
                if let Some(err) = &e.error {
                    section = section.status("error", err);
                }
                if !logs.is_empty() {
                    section = section.blank().text("Plugin log:");
                    for log in logs {
                        let detail = log.error.clone().unwrap_or_else(|| format!("+{} XP", log.xp_earned));
                        section = section.status(
                            &log.plugin_id,
                            &format!("{:<8} {} ms  {}", log.status, log.execution_time, detail),
                        );
                    }
                }
                section.print();
                println!();
            })
        }
        "record" => {
            let raw = flags.require("data")?;
            let mut input: ExecutionRecordInput =
                serde_json::from_str(raw).map_err(|e| anyhow!("--data is not valid JSON: {}", e))?;
            if input.tenant_id.is_none() {
                input.tenant_id = Some(flags.tenant().to_string());
            }
            let services = open_services(&flags).await?;
            let result = record_execution(&services.store, &input).await;
            finish(&flags, result, |e| {
                print_success(&format!("Recorded {} execution {} ({})", e.execution_type, e.id, e.status))
            })
        }
        "stats" => {
            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> = services.store.execution_stats(tenant).await.into();
            finish(&flags, result, |stats| {
                let mut section = GuideSection::new(&format!("Execution stats · {}", tenant))
                    .status("total", &stats.total.to_string())
                    .status("total xp", &stats.total_xp.to_string());
                for (status, count) in &stats.by_status {
                    section = section.status(status, &count.to_string());
                }
                section.print();
                println!();
            })
        }
        _ => {
            GuideSection::new("allora execution")
                .command("list [--strategy <id>] [--limit <n>]", "Recent executions")
                .command("show <id>", "One execution with its plugin log")
                .command("record --data <json>", "Record an externally run execution")
                .command("stats", "Counts per status and total XP")
                .blank()
                .hint(
                    r#"allora execution record --data '{"tenantId":"default","type":"agent","status":"success"}'"#,
                    "",
                )
                .print();
            println!();
            Ok(())
        }
    }
}

async fn show(
    services: &Services,
    tenant: &str,
    id: &str,
) -> Result<(ExecutionRecord, Vec<PluginLogRecord>)> {
    let execution = services
        .store
        .get_execution(tenant, id)
        .await?
        .ok_or_else(|| anyhow!("Execution not found: {}", id))?;
    let logs = services.store.list_plugin_logs(&execution.id).await?;
    Ok((execution, logs))
}
