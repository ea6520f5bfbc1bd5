use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::core::execution::PluginExecutor;
use crate::core::store::PluginRecord;
use crate::platform::{NativePlatform, Platform};

/// Runs plugin scripts on the host through the platform shell.
///
/// The plugin input arrives as JSON on stdin. Stdout is parsed as JSON when
/// possible and otherwise returned as `{"stdout": "..."}`. A non-zero exit
/// status fails the plugin.
pub struct NativeExecutor {
    plugins_dir: PathBuf,
    timeout: Duration,
}

impl NativeExecutor {
    pub fn new(plugins_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            plugins_dir,
            timeout,
        }
    }

    /// Relative entrypoints resolve against the plugins directory.
    pub fn script_path(&self, entrypoint: &str) -> PathBuf {
        let path = Path::new(entrypoint);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.plugins_dir.join(path)
        }
    }
}

#[async_trait]
impl PluginExecutor for NativeExecutor {
    async fn execute(&self, plugin: &PluginRecord, input: &Value) -> Result<Value> {
        let script_path = self.script_path(&plugin.entrypoint);
        if !script_path.exists() {
            return Err(anyhow!(
                "Plugin entrypoint not found at {:?}",
                script_path
            ));
        }
        info!("Executing plugin [{}] natively", plugin.name);

        let mut cmd = NativePlatform::shell_command_async(&script_path);
        if let Some(dir) = script_path.parent() {
            cmd.current_dir(dir);
        }
        cmd.env("ALLORA_PLUGIN_ID", &plugin.id);
        cmd.env("ALLORA_PLUGIN_NAME", &plugin.name);
        cmd.env("ALLORA_TENANT_ID", &plugin.tenant_id);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let payload = serde_json::to_vec(input)?;
        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                // Scripts that ignore stdin close the pipe early.
                let _ = stdin.write_all(&payload).await;
            }
        };

        // The deadline covers the stdin write too; dropping the child kills it.
        let (_, output) = tokio::time::timeout(
            self.timeout,
            async { tokio::join!(write_input, child.wait_with_output()) },
        )
        .await
        .map_err(|_| {
            anyhow!(
                "Plugin {} timed out after {}s",
                plugin.name,
                self.timeout.as_secs()
            )
        })?;
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Plugin {} exited with {}: {}",
                plugin.name,
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        Ok(serde_json::from_str::<Value>(trimmed).unwrap_or_else(|_| json!({ "stdout": trimmed })))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn plugin(entrypoint: &str) -> PluginRecord {
        PluginRecord {
            id: "p1".to_string(),
            tenant_id: "t1".to_string(),
            name: "sample".to_string(),
            description: String::new(),
            executor_type: "native".to_string(),
            entrypoint: entrypoint.to_string(),
            xp_reward: 5,
            created_at: String::new(),
        }
    }

    fn write_script(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn json_stdout_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "ok.sh", "cat >/dev/null\necho '{\"rows\": 3}'\n");
        let exec = NativeExecutor::new(dir.path().to_path_buf(), Duration::from_secs(5));
        let out = exec.execute(&plugin("ok.sh"), &json!({})).await.unwrap();
        assert_eq!(out["rows"], 3);
    }

    #[tokio::test]
    async fn stdin_carries_input_and_plain_text_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "echo.sh", "read line\necho \"got $line from $ALLORA_TENANT_ID\"\n");
        let exec = NativeExecutor::new(dir.path().to_path_buf(), Duration::from_secs(5));
        let out = exec
            .execute(&plugin("echo.sh"), &json!({ "k": 1 }))
            .await
            .unwrap();
        assert_eq!(out["stdout"], "got {\"k\":1} from t1");
    }

    #[tokio::test]
    async fn non_zero_exit_fails_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "bad.sh", "echo 'quota exceeded' >&2\nexit 3\n");
        let exec = NativeExecutor::new(dir.path().to_path_buf(), Duration::from_secs(5));
        let err = exec.execute(&plugin("bad.sh"), &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn missing_script_fails() {
        let dir = tempfile::tempdir().unwrap();
        let exec = NativeExecutor::new(dir.path().to_path_buf(), Duration::from_secs(5));
        let err = exec.execute(&plugin("nope.sh"), &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn slow_script_times_out() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "slow.sh", "sleep 5\n");
        let exec = NativeExecutor::new(dir.path().to_path_buf(), Duration::from_millis(200));
        let err = exec.execute(&plugin("slow.sh"), &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn large_input_to_script_ignoring_stdin_still_times_out() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "deaf.sh", "sleep 5\n");
        let exec = NativeExecutor::new(dir.path().to_path_buf(), Duration::from_millis(300));
        let input = json!({ "blob": "x".repeat(1024 * 1024) });

        let started = std::time::Instant::now();
        let err = exec.execute(&plugin("deaf.sh"), &input).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
