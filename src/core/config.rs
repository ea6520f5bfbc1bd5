use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_FILE: &str = "allora.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub edge: EdgeConfig,

    #[serde(default)]
    pub logs: LogsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the data directory.
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_true")]
    pub require_approval: bool,

    /// Upper bound for one native plugin run.
    #[serde(default = "default_plugin_timeout_secs")]
    pub plugin_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeConfig {
    /// Empty disables edge functions entirely.
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub signing_secret: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogsConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,

    #[serde(default = "default_true")]
    pub alert_on_critical: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_db_path() -> String {
    "allora.db".to_string()
}
fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_plugin_timeout_secs() -> u64 {
    60
}
fn default_retention_days() -> u32 {
    90
}
fn default_cleanup_cron() -> String {
    "0 0 3 * * *".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    17990
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            require_approval: true,
            plugin_timeout_secs: default_plugin_timeout_secs(),
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            signing_secret: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            cleanup_cron: default_cleanup_cron(),
            alert_on_critical: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    pub async fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path).await?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            info!("No {} found, using defaults.", CONFIG_FILE);
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ALLORA_EDGE_URL")
            && !url.trim().is_empty()
        {
            self.edge.base_url = url.trim().to_string();
        }
        if let Ok(key) = std::env::var("ALLORA_EDGE_KEY")
            && !key.trim().is_empty()
        {
            self.edge.api_key = key.trim().to_string();
        }
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        let path = PathBuf::from(&self.database.path);
        if path.is_absolute() {
            path
        } else {
            data_dir.join(path)
        }
    }

    pub fn edge_enabled(&self) -> bool {
        !self.edge.base_url.trim().is_empty()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_approval_and_disable_edge() {
        let cfg = AppConfig::default();
        assert!(cfg.execution.require_approval);
        assert!(!cfg.edge_enabled());
        assert_eq!(cfg.logs.retention_days, 90);
        assert_eq!(cfg.server.port, 17990);
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [execution]
            require_approval = false

            [edge]
            base_url = "https://edge.example.com"
            "#,
        )
        .unwrap();
        assert!(!cfg.execution.require_approval);
        assert!(cfg.edge_enabled());
        assert_eq!(cfg.edge.timeout_secs, 30);
        assert_eq!(cfg.logs.cleanup_cron, "0 0 3 * * *");
        assert_eq!(cfg.database.path, "allora.db");
    }

    #[test]
    fn relative_database_path_joins_data_dir() {
        let cfg = AppConfig::default();
        let path = cfg.database_path(Path::new("/srv/allora"));
        assert_eq!(path, PathBuf::from("/srv/allora/allora.db"));
    }

    #[tokio::test]
    async fn load_without_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load(dir.path()).await.unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn written_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let text = AppConfig::default().to_toml().unwrap();
        tokio::fs::write(dir.path().join(CONFIG_FILE), text)
            .await
            .unwrap();
        let cfg = AppConfig::load(dir.path()).await.unwrap();
        assert_eq!(cfg.logs.retention_days, 90);
    }
}
