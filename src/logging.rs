//! Diagnostic logging via `simplelog`.
//!
//! Diagnostics always go to a file, never to stderr.
//!
//! Diagnostics are separate from the audit log: they describe what the
//! gateway itself did (state transitions, degraded audit writes, internal
//! failures), not what the agent did.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::WriteLogger;

use crate::config::LoggingConfig;

/// Diagnostic log used when `logging.file` is unset.
///
/// Never stderr: that channel carries the block reason to the agent.
pub const DEFAULT_LOG_FILE: &str = "~/.local/share/hookgate/hookgate.log";

/// Parse a configured level, falling back to `warn` on unknown names.
pub fn level_filter(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Warn)
}

/// Resolve the diagnostic log path, expanding `~` and `$VAR`.
pub fn log_path(config: &LoggingConfig) -> Option<PathBuf> {
    let raw = config.file.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    shellexpand::full(raw)
        .ok()
        .map(|p| PathBuf::from(p.as_ref()))
}

/// Install the global logger. Best-effort: a logger that cannot be set up
/// must never stop the hook from answering, so diagnostics are dropped.
pub fn init(config: &LoggingConfig) {
    let level = level_filter(&config.level);
    if level == LevelFilter::Off {
        return;
    }
    let Some(path) = log_path(config) else {
        return;
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let log_config = simplelog::ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    let _ = WriteLogger::init(level, log_config, file);
}
