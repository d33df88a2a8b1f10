//! Append-only audit log.
//!
//! One line per tool invocation, whatever the policy decided:
//!
//! ```text
//! [2026-10-18T09:30:00.123Z] Write: /project/src/app.ts
//! ```
//!
//! Every line is written with a single `write(2)` on a file opened in
//! append mode, so concurrent hook processes never interleave partial lines.

use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::AuditConfig;
use crate::error::AuditWriteError;
use crate::event::ToolInvocationEvent;

/// Rendered in place of a missing tool name.
pub const UNKNOWN_TOOL: &str = "unknown";

/// One audit record, stamped by the logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub tool_name: Option<String>,
    pub operation_path: String,
}

impl AuditLogEntry {
    pub fn from_event(event: &ToolInvocationEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            tool_name: event.tool_name().map(str::to_owned),
            operation_path: event.operation_path().to_owned(),
        }
    }

    /// `[<timestamp>] <tool>: <path>\n`
    pub fn to_line(&self) -> String {
        format!(
            "[{ts}] {tool}: {path}\n",
            ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            tool = one_line(self.tool_name.as_deref().unwrap_or(UNKNOWN_TOOL)),
            path = one_line(&self.operation_path),
        )
    }
}

/// Escape line breaks so a record never spans lines.
fn one_line(s: &str) -> Cow<'_, str> {
    if s.contains(['\n', '\r']) {
        Cow::Owned(s.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Audit log destination.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: String,
}

impl AuditLog {
    /// `path` may contain `~` and `$VAR`; it is expanded on each append.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.path.clone())
    }

    /// Expand `~` and environment variables in the configured path.
    pub fn resolve_path(&self) -> Result<PathBuf, AuditWriteError> {
        shellexpand::full(&self.path)
            .map(|p| PathBuf::from(p.as_ref()))
            .map_err(|e| AuditWriteError::Expand {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Stamp the event with the current time and append it.
    pub fn record(&self, event: &ToolInvocationEvent) -> Result<PathBuf, AuditWriteError> {
        self.append(&AuditLogEntry::from_event(event, Utc::now()))
    }

    /// Append one entry. Returns the resolved path written to.
    pub fn append(&self, entry: &AuditLogEntry) -> Result<PathBuf, AuditWriteError> {
        let path = self.resolve_path()?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| AuditWriteError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditWriteError::Open {
                path: path.clone(),
                source,
            })?;

        let line = entry.to_line();
        let written = file
            .write(line.as_bytes())
            .map_err(|source| AuditWriteError::Write {
                path: path.clone(),
                source,
            })?;
        if written != line.len() {
            return Err(AuditWriteError::ShortWrite {
                path,
                written,
                expected: line.len(),
            });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Phase;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    fn entry(tool: Option<&str>, path: &str) -> AuditLogEntry {
        let event = ToolInvocationEvent::new(tool.map(String::from), path, Phase::PreInvocation);
        AuditLogEntry::from_event(&event, fixed_time())
    }

    #[test]
    fn line_format() {
        assert_eq!(
            entry(Some("write"), "/project/src/app.ts").to_line(),
            "[2026-10-18T09:30:00.000Z] write: /project/src/app.ts\n"
        );
    }

    #[test]
    fn missing_tool_renders_unknown() {
        assert_eq!(
            entry(None, "/project/.env").to_line(),
            "[2026-10-18T09:30:00.000Z] unknown: /project/.env\n"
        );
    }

    #[test]
    fn empty_path_keeps_shape() {
        assert_eq!(
            entry(Some("Bash"), "").to_line(),
            "[2026-10-18T09:30:00.000Z] Bash: \n"
        );
    }

    #[test]
    fn line_breaks_are_escaped() {
        let line = entry(Some("Write"), "/tmp/a\nb\rc").to_line();
        assert_eq!(line, "[2026-10-18T09:30:00.000Z] Write: /tmp/a\\nb\\rc\n");
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn append_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/changes.log");
        let log = AuditLog::new(path.to_string_lossy());
        log.append(&entry(Some("Read"), "/a")).unwrap();
        log.append(&entry(Some("Write"), "/b")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "[2026-10-18T09:30:00.000Z] Read: /a\n[2026-10-18T09:30:00.000Z] Write: /b\n"
        );
    }

    #[test]
    fn append_preserves_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.log");
        std::fs::write(&path, "previous line\n").unwrap();
        AuditLog::new(path.to_string_lossy())
            .append(&entry(None, "/x"))
            .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("previous line\n"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn unwritable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let err = AuditLog::new(dir.path().to_string_lossy())
            .append(&entry(None, "/x"))
            .unwrap_err();
        assert!(matches!(err, AuditWriteError::Open { .. }));
    }

    #[test]
    fn uncreatable_parent_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let err = AuditLog::new(blocker.join("logs/changes.log").to_string_lossy())
            .append(&entry(None, "/x"))
            .unwrap_err();
        match err {
            AuditWriteError::CreateDir { path, .. } => assert_eq!(path, blocker.join("logs")),
            other => panic!("expected CreateDir, got {other:?}"),
        }
    }

    #[test]
    fn undefined_variable_is_reported() {
        let log = AuditLog::new("$HOOKGATE_TEST_SURELY_UNSET_VAR/changes.log");
        assert!(matches!(
            log.resolve_path(),
            Err(AuditWriteError::Expand { .. })
        ));
    }

    #[test]
    fn record_uses_current_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.log");
        let event = ToolInvocationEvent::new(Some("Edit".into()), "/p/lib.rs", Phase::PostInvocation);
        AuditLog::new(path.to_string_lossy()).record(&event).unwrap();
        let line = std::fs::read_to_string(&path).unwrap();
        assert!(line.starts_with('['));
        assert!(line.ends_with("Z] Edit: /p/lib.rs\n"));
    }
}
