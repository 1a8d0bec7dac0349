use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Terminal output is for the user; only problems are logged there by default.
const DEFAULT_STDERR_LEVEL: &str = "warn";
/// The JSON log file records the full call history of this crate.
const DEFAULT_FILE_DIRECTIVE: &str = "nutria=debug,info";
const ENV_VAR_NAME: &str = "NUTRIA_LOG";

static INIT: Once = Once::new();

/// Install the global tracing subscriber once per process.
///
/// The stderr filter is resolved with precedence: `NUTRIA_LOG` env var >
/// `log_level` argument > `warn`. When `log_file` is given, JSON lines are
/// appended there with the same override or `nutria=debug,info`.
pub fn init(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| result = install(log_level, log_file));
    result
}

fn install(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .compact()
        .with_filter(stderr_filter(log_level));

    let file_layer = match log_file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .json()
                .with_filter(file_filter(log_level)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn stderr_filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR_NAME)
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or(DEFAULT_STDERR_LEVEL)))
}

fn file_filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR_NAME)
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or(DEFAULT_FILE_DIRECTIVE)))
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "failed to create log file directory {}: {e}",
                parent.display()
            )
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_filter_defaults_to_warn() {
        if std::env::var_os(ENV_VAR_NAME).is_some() {
            return;
        }
        let display = stderr_filter(None).to_string();
        assert!(display.contains("warn"), "expected 'warn', got: {display}");
    }

    #[test]
    fn stderr_filter_uses_explicit_level() {
        if std::env::var_os(ENV_VAR_NAME).is_some() {
            return;
        }
        let display = stderr_filter(Some("debug")).to_string();
        assert!(display.contains("debug"), "expected 'debug', got: {display}");
    }

    #[test]
    fn file_filter_records_crate_debug_by_default() {
        if std::env::var_os(ENV_VAR_NAME).is_some() {
            return;
        }
        let display = file_filter(None).to_string();
        assert!(
            display.contains("nutria=debug"),
            "expected 'nutria=debug', got: {display}"
        );
    }

    #[test]
    fn open_log_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("nutria.log");

        assert!(open_log_file(&log_path).is_ok());
        assert!(log_path.exists());
    }

    #[test]
    fn open_log_file_appends() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("nutria.log");

        writeln!(open_log_file(&log_path).unwrap(), "line1").unwrap();
        writeln!(open_log_file(&log_path).unwrap(), "line2").unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents, "line1\nline2\n");
    }
}
