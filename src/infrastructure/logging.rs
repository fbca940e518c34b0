//! Logging initialization.
//!
//! Console output plus an optional per-run file named
//! `<run_name>_latest.log`, truncated on every start so the file always
//! holds exactly the latest run. Initialization is first-call-wins: later
//! calls in the same process are no-ops.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking writer alive for the process lifetime.
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Path of the per-run log file for `run_name`.
pub fn log_file_path(config: &LoggingConfig, run_name: &str) -> PathBuf {
    Path::new(&config.dir).join(format!("{run_name}_latest.log"))
}

/// Initialize tracing for one run. Returns `Ok` without effect when a
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, run_name: &str) -> Result<()> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let console = fmt::layer().with_target(false);

    // A subscriber installed by the embedding process wins silently.
    if config.file_output {
        std::fs::create_dir_all(&config.dir)
            .with_context(|| format!("failed to create log dir {}", config.dir))?;
        let path = log_file_path(config, run_name);
        let file = File::create(&path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        let (writer, guard) = non_blocking(file);
        let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file_layer)
            .try_init();
        let _ = LOG_GUARD.set(guard);
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init();
    }

    let _ = INITIALIZED.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_truncated_run_file_and_tolerates_reinit() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            dir: dir.path().join("logs").display().to_string(),
            file_output: true,
        };
        init_logging(&config, "trendyol").unwrap();
        assert!(log_file_path(&config, "trendyol").exists());
        // Second call in the same process is a no-op.
        init_logging(&config, "n11").unwrap();
    }
}
