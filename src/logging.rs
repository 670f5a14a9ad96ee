//! Diagnostic log
//!
//! The terminal belongs to the game, so diagnostics go to `<logs>/talespin.log`.
//! `RUST_LOG` overrides the level; `DEBUG=true` raises the default to debug,
//! which includes raw generator replies.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "talespin.log";

pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "talespin=debug"
    } else {
        "talespin=info"
    }
}

/// Install the global subscriber. Returns the log file path.
pub fn init(logs_dir: &Path, debug: bool) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;
    let path = logs_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "talespin=info");
        assert_eq!(default_directive(true), "talespin=debug");
    }

    #[test]
    fn test_init_creates_log_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        // another test may already own the global subscriber
        if let Ok(path) = init(&dir, false) {
            tracing::info!("logger ready");
            assert!(path.exists());
        }
        assert!(dir.exists());
    }
}
