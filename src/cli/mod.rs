mod execution;
mod install;
mod logs;
mod notify;
mod plugin;
mod serve;
mod strategy;
mod tenant;

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, bail};
use console::style;
use serde::Serialize;
use tracing::Level;

use crate::core::config::CONFIG_FILE;
use crate::core::execution::ServiceResult;
use crate::core::notify::{BroadcastToasts, TerminalToasts, ToastSink};
use crate::core::services::Services;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::logging;
use crate::platform::{NativePlatform, Platform};

/// Tenant used when a command gets no `--tenant`. Created by `allora install`.
pub(crate) const DEFAULT_TENANT: &str = "default";

/// Flags that never take a value.
const SWITCHES: [&str; 4] = ["json", "unread", "submit", "help"];

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Setup")
        .command("install", "Create the data directory, config and database")
        .command("tenant", "Manage tenants and user roles")
        .print();

    GuideSection::new("Strategies")
        .command("plugin", "Register and list plugins")
        .command("strategy", "Create, review, run and generate strategies")
        .command("execution", "Inspect and record executions")
        .print();

    GuideSection::new("Observability")
        .command("logs", "Query, summarize and clean up system logs")
        .command("notify", "Send and manage user notifications")
        .command("serve", "Start the HTTP API with live log, toast and notification streams")
        .print();

    GuideSection::new("Global flags")
        .text("--tenant <id>   Tenant to act on (default: \"default\")")
        .text("--json          Print the raw {success, data, error} envelope")
        .print();

    println!(
        "\n {} {} <command> [subcommand] [--flags]\n",
        style("Usage:").bold(),
        style("allora").green()
    );
}

/// `--name value` pairs, bare switches and positional arguments of one command.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CommandFlags {
    values: HashMap<String, String>,
    switches: Vec<String>,
    positionals: Vec<String>,
}

pub(crate) fn parse_flags(args: &[String], start: usize) -> CommandFlags {
    let mut flags = CommandFlags::default();
    let mut i = start;
    while i < args.len() {
        match args[i].strip_prefix("--") {
            Some(name) if SWITCHES.contains(&name) => {
                flags.switches.push(name.to_string());
                i += 1;
            }
            Some(name) => {
                if i + 1 < args.len() && !args[i + 1].starts_with("--") {
                    flags.values.insert(name.to_string(), args[i + 1].clone());
                    i += 2;
                } else {
                    flags.switches.push(name.to_string());
                    i += 1;
                }
            }
            None => {
                flags.positionals.push(args[i].clone());
                i += 1;
            }
        }
    }
    flags
}

impl CommandFlags {
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s == name)
    }

    pub(crate) fn require(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(v) => Ok(v),
            None => bail!("--{} is required", name),
        }
    }

    pub(crate) fn json(&self) -> bool {
        self.has("json")
    }

    pub(crate) fn tenant(&self) -> &str {
        self.get("tenant").unwrap_or(DEFAULT_TENANT)
    }

    /// Comma-separated values, blanks dropped.
    pub(crate) fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => match raw.parse() {
                Ok(n) => Ok(Some(n)),
                Err(_) => bail!("--{} must be a number, got '{}'", name, raw),
            },
        }
    }

    /// First positional argument, or `--id`.
    pub(crate) fn id(&self, what: &str) -> Result<&str> {
        match self.positionals.first().map(String::as_str).or(self.get("id")) {
            Some(id) => Ok(id),
            None => bail!("{} id is required", what),
        }
    }
}

pub(crate) fn installed_data_dir() -> Result<PathBuf> {
    let data_dir = NativePlatform::data_dir();
    if !data_dir.join(CONFIG_FILE).exists() {
        bail!("allora is not set up yet. Run 'allora install' first.");
    }
    Ok(data_dir)
}

/// Loads config and store from the data directory. In `--json` mode toasts
/// are dropped so stdout carries only the envelope.
pub(crate) async fn open_services(flags: &CommandFlags) -> Result<Services> {
    let data_dir = installed_data_dir()?;
    let toasts: Arc<dyn ToastSink> = if flags.json() {
        Arc::new(BroadcastToasts::new(1))
    } else {
        Arc::new(TerminalToasts)
    };
    Services::open(&data_dir, toasts).await
}

/// Prints a service result: the envelope with `--json`, otherwise `render`.
/// A failed result becomes the command's error.
pub(crate) fn finish<T: Serialize>(
    flags: &CommandFlags,
    result: ServiceResult<T>,
    render: impl FnOnce(&T),
) -> Result<()> {
    if flags.json() {
        terminal::print_json(&result);
    }
    match result.data {
        Some(data) if result.success => {
            if !flags.json() {
                render(&data);
            }
            Ok(())
        }
        _ => bail!(result.error.unwrap_or_else(|| "Unknown error".to_string())),
    }
}

pub(crate) fn sub_command(args: &[String]) -> &str {
    args.get(2).map(String::as_str).unwrap_or("")
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let cmd = args[1].as_str();
    let default_level = if cmd == "serve" { Level::INFO } else { Level::WARN };
    let log_tx = logging::init(default_level, false);

    match cmd {
        "install" => install::run_install().await,
        "tenant" | "tenants" => tenant::run_tenant_command(&args).await,
        "plugin" | "plugins" => plugin::run_plugin_command(&args).await,
        "strategy" | "strategies" => strategy::run_strategy_command(&args).await,
        "execution" | "executions" => execution::run_execution_command(&args).await,
        "logs" => logs::run_logs_command(&args).await,
        "notify" | "notifications" => notify::run_notify_command(&args).await,
        "serve" => serve::run_serve(&args, log_tx).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_flags_splits_values_switches_and_positionals() {
        let args = args(&[
            "allora", "strategy", "run", "s-42", "--tenant", "acme", "--json", "--by", "alice",
        ]);
        let flags = parse_flags(&args, 3);
        assert_eq!(flags.id("Strategy").unwrap(), "s-42");
        assert_eq!(flags.tenant(), "acme");
        assert_eq!(flags.get("by"), Some("alice"));
        assert!(flags.json());
    }

    #[test]
    fn switches_never_swallow_the_next_argument() {
        let args = args(&["allora", "strategy", "show", "--json", "s-1"]);
        let flags = parse_flags(&args, 3);
        assert!(flags.json());
        assert_eq!(flags.id("Strategy").unwrap(), "s-1");
    }

    #[test]
    fn trailing_flag_without_value_is_a_switch() {
        let args = args(&["allora", "logs", "list", "--verbose"]);
        let flags = parse_flags(&args, 3);
        assert!(flags.has("verbose"));
        assert_eq!(flags.get("verbose"), None);
    }

    #[test]
    fn tenant_defaults_and_lists_split_on_commas() {
        let args = args(&["allora", "notify", "send", "--roles", "owner, reviewer,,"]);
        let flags = parse_flags(&args, 3);
        assert_eq!(flags.tenant(), DEFAULT_TENANT);
        assert_eq!(flags.list("roles"), vec!["owner", "reviewer"]);
        assert!(flags.list("missing").is_empty());
    }

    #[test]
    fn number_and_require_report_the_flag_name() {
        let args = args(&["allora", "logs", "list", "--limit", "ten"]);
        let flags = parse_flags(&args, 3);
        let err = flags.number::<usize>("limit").unwrap_err();
        assert!(err.to_string().contains("--limit must be a number"));
        assert_eq!(flags.number::<usize>("offset").unwrap(), None);
        assert_eq!(flags.require("title").unwrap_err().to_string(), "--title is required");
        assert!(flags.id("Execution").is_err());
    }

    #[test]
    fn finish_turns_failures_into_errors() {
        let flags = parse_flags(&args(&["allora"]), 1);
        let err = finish(&flags, ServiceResult::<u32>::fail("Strategy not found: x"), |_| {})
            .unwrap_err();
        assert_eq!(err.to_string(), "Strategy not found: x");

        let mut rendered = None;
        finish(&flags, ServiceResult::ok(7u32), |n| rendered = Some(*n)).unwrap();
        assert_eq!(rendered, Some(7));
    }
}
