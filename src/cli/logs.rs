use anyhow::Result;
use console::style;

use super::{CommandFlags, finish, open_services, parse_flags, sub_command};
use crate::core::execution::ServiceResult;
use crate::core::logs::{LogFilter, MAX_LOG_LIMIT, RetentionPolicy, summarize};
use crate::core::terminal::{GuideSection, print_success};

fn filter_from_flags(flags: &CommandFlags) -> Result<LogFilter> {
    let owned = |name: &str| flags.get(name).map(str::to_string);
    Ok(LogFilter {
        module: owned("module"),
        level: owned("level"),
        severity: owned("severity"),
        min_severity: owned("min-severity"),
        search: owned("search"),
        since: owned("since"),
        until: owned("until"),
        limit: flags.number("limit")?,
        offset: flags.number("offset")?,
    })
}

pub async fn run_logs_command(args: &[String]) -> Result<()> {
    let flags = parse_flags(args, 3);
    match sub_command(args) {
        "list" | "ls" => {
            let filter = filter_from_flags(&flags)?;
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services
                .store
                .query_system_logs(flags.tenant(), &filter)
                .await
                .into();
            finish(&flags, result, |logs| {
                if logs.is_empty() {
                    GuideSection::new("System logs").text("No logs match.").print();
                }
                for log in logs {
                    let severity = match log.severity.as_str() {
                        "critical" => style(&log.severity).red().bold(),
                        "high" => style(&log.severity).red(),
                        "medium" => style(&log.severity).yellow(),
                        _ => style(&log.severity).dim(),
                    };
                    println!(
                        "{} {:<7} {:<8} {}/{}  {}",
                        style(&log.created_at).dim(),
                        log.level,
                        severity,
                        log.module,
                        style(&log.event).bold(),
                        log.description
                    );
                }
            })
        }
        "stats" => {
            let filter = LogFilter {
                limit: Some(MAX_LOG_LIMIT),
                offset: None,
                ..filter_from_flags(&flags)?
            };
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> = services
                .store
                .query_system_logs(flags.tenant(), &filter)
                .await
                .map(|logs| summarize(&logs))
                .into();
            finish(&flags, result, |stats| {
                let mut section = GuideSection::new("System log summary")
                    .status("total", &stats.total.to_string())
                    .status("critical", &stats.critical.to_string())
                    .status("latest", stats.latest_at.as_deref().unwrap_or("-"))
                    .blank();
                for (level, count) in &stats.by_level {
                    section = section.status(&format!("level {}", level), &count.to_string());
                }
                for (severity, count) in &stats.by_severity {
                    section = section.status(&format!("severity {}", severity), &count.to_string());
                }
                for (module, count) in &stats.by_module {
                    section = section.status(&format!("module {}", module), &count.to_string());
                }
                section.print();
                println!();
            })
        }
        "cleanup" => {
            let services = open_services(&flags).await?;
            let policy = match flags.number::<u32>("days")? {
                Some(days) => RetentionPolicy::new(days),
                None => services.retention(),
            };
            let result: ServiceResult<_> = policy.cleanup(&services.store).await.into();
            finish(&flags, result, |removed| {
                print_success(&format!(
                    "Removed {} system logs older than {} days",
                    removed, policy.retention_days
                ))
            })
        }
        _ => {
            GuideSection::new("allora logs")
                .command("list", "Newest system logs first")
                .command("stats", "Counts by level, severity and module")
                .command("cleanup [--days <n>]", "Apply the retention policy now")
                .blank()
                .text("Filters: --module --level --severity --min-severity --search")
                .text("         --since --until --limit --offset")
                .print();
            println!();
            Ok(())
        }
    }
}
