use anyhow::Result;
use console::style;

use super::DEFAULT_TENANT;
use crate::core::config::{AppConfig, CONFIG_FILE};
use crate::core::plugins::PLUGINS_DIR;
use crate::core::store::Store;
use crate::core::terminal::{self, GuideSection, print_info, print_success};
use crate::platform::{NativePlatform, Platform};

/// Non-interactive first-run setup. Re-running keeps an existing config and
/// database.
pub async fn run_install() -> Result<()> {
    terminal::print_banner();
    println!("  {}\n", style("Setting up allora...").bold());

    let data_dir = NativePlatform::data_dir();
    let plugins_dir = data_dir.join(PLUGINS_DIR);
    tokio::fs::create_dir_all(&plugins_dir).await?;
    NativePlatform::restrict_dir_permissions(&data_dir);
    NativePlatform::restrict_dir_permissions(&plugins_dir);

    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() {
        print_info(&format!("Keeping existing {}", config_path.display()));
    } else {
        tokio::fs::write(&config_path, AppConfig::default().to_toml()?).await?;
        NativePlatform::restrict_file_permissions(&config_path);
    }

    let config = AppConfig::load(&data_dir).await?;
    let db_path = config.database_path(&data_dir);
    let store = Store::open(&db_path).await?;
    if store.get_tenant(DEFAULT_TENANT).await?.is_none() {
        store.create_tenant(DEFAULT_TENANT, "Default").await?;
    }

    print_success("Installation complete!");
    GuideSection::new("Locations")
        .status("Config", &config_path.display().to_string())
        .status("Database", &db_path.display().to_string())
        .status("Plugins", &plugins_dir.display().to_string())
        .blank()
        .hint("allora tenant user --user alice --role owner", "Add yourself to the default tenant")
        .hint("allora serve", "Start the HTTP API")
        .print();
    println!();

    Ok(())
}
