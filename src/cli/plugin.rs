use anyhow::Result;

use super::{finish, open_services, parse_flags, sub_command};
use crate::core::execution::ServiceResult;
use crate::core::plugins::{PLUGINS_DIR, PluginSpec, register_plugin};
use crate::core::terminal::{GuideSection, print_success};

pub async fn run_plugin_command(args: &[String]) -> Result<()> {
    let flags = parse_flags(args, 3);
    match sub_command(args) {
        "add" => {
            let spec = PluginSpec {
                name: flags.require("name")?.to_string(),
                description: flags.get("description").unwrap_or_default().to_string(),
                executor_type: flags.require("type")?.to_string(),
                entrypoint: flags.require("entrypoint")?.to_string(),
                xp_reward: flags.number("xp")?.unwrap_or(0),
            };
            let services = open_services(&flags).await?;
            let result: ServiceResult<_> =
                register_plugin(&services.store, flags.tenant(), &spec).await.into();
            finish(&flags, result, |p| {
                print_success(&format!("Plugin {} registered as {}", p.name, p.id))
            })
        }
        "list" | "ls" => {
            let services = open_services(&flags).await?;
            let tenant = flags.tenant();
            let result: ServiceResult<_> = services.store.list_plugins(tenant).await.into();
            finish(&flags, result, |plugins| {
                let mut section = GuideSection::new(&format!("Plugins · {}", tenant));
                for p in plugins {
                    section = section.status(
                        &p.id,
                        &format!("{} [{}: {}] +{} XP", p.name, p.executor_type, p.entrypoint, p.xp_reward),
                    );
                }
                if plugins.is_empty() {
                    section = section.text("No plugins registered.");
                }
                section.print();
                println!();
            })
        }
        _ => {
            GuideSection::new("allora plugin")
                .command(
                    "add --name <n> --type edge|native --entrypoint <e> [--xp <n>]",
                    "Register a plugin",
                )
                .command("list", "List plugins of a tenant")
                .blank()
                .info(&format!(
                    "Native entrypoints are scripts inside the data directory's {}/ folder.",
                    PLUGINS_DIR
                ))
                .print();
            println!();
            Ok(())
        }
    }
}
