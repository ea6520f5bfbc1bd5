use std::path::{Path, PathBuf};

/// OS-specific operations behind one interface so call sites stay free of
/// `#[cfg]` blocks.
pub trait Platform {
    /// Build a **tokio** `Command` that executes a plugin script through the platform shell.
    fn shell_command_async(script_path: &Path) -> tokio::process::Command;

    /// Set restrictive *directory* permissions (0o700 on Unix, no-op on Windows).
    fn restrict_dir_permissions(path: &Path);

    /// Set restrictive *file* permissions (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path);

    /// Root data directory holding `allora.toml` and the database.
    /// Unix: `~/.allora`, Windows: `%APPDATA%\allora`.
    fn data_dir() -> PathBuf;
}

/// `ALLORA_DATA_DIR` wins over the platform default.
pub(crate) fn resolve_data_dir(default: PathBuf) -> PathBuf {
    match std::env::var("ALLORA_DATA_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default,
    }
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
