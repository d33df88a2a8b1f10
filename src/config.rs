use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::decode::DEFAULT_MAX_BYTES;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// User overlay location, relative to `$HOME`.
const USER_CONFIG: &str = ".config/hookgate/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Block the tool call when the gateway itself fails.
    #[serde(default)]
    pub fail_closed: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Audit log destination. `~` and `$VAR` are expanded at write time.
    #[serde(default = "default_audit_path")]
    pub path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: default_audit_path(),
        }
    }
}

fn default_audit_path() -> String {
    "changes.log".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Diagnostics file; `logging::DEFAULT_LOG_FILE` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

/// One `[[rules]]` entry. All listed conditions must hold for the rule to match.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    pub name: String,
    /// `block` or `allow`.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_contains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_prefix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool: Vec<String>,
    /// `pre` or `post`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    audit: AuditOverlay,
    #[serde(default)]
    input: InputOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
    #[serde(default)]
    rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    fail_closed: Option<bool>,
    #[serde(default)]
    replace_rules: bool,
    #[serde(default)]
    remove_rules: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AuditOverlay {
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct InputOverlay {
    max_bytes: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

// ── Merge logic ──

/// Merge user rules into the default rule list.
/// In replace mode: user rules replace defaults entirely.
/// In merge mode: remove named rules first, then append additions in order.
/// A user rule with the same name as a remaining default replaces it in place.
fn merge_rules(base: &mut Vec<RuleConfig>, add: Vec<RuleConfig>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
        return;
    }
    base.retain(|rule| !remove.contains(&rule.name));
    for rule in add {
        match base.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => base.push(rule),
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or ~/.config/hookgate/config.toml if `path` is None
    ///
    /// An explicit path must exist. The default user overlay is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        let overlay = match path {
            Some(p) => Some(Self::read_overlay(p)?),
            None => match Self::user_overlay_path() {
                Some(p) if p.is_file() => Some(Self::read_overlay(&p)?),
                _ => None,
            },
        };
        if let Some(overlay) = overlay {
            config.apply_overlay(overlay);
        }
        Ok(config)
    }

    fn user_overlay_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(USER_CONFIG))
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Scalars override
        let s = overlay.settings;
        if let Some(v) = s.fail_closed {
            self.settings.fail_closed = v;
        }
        if let Some(v) = overlay.audit.path {
            self.audit.path = v;
        }
        if let Some(v) = overlay.input.max_bytes {
            self.input.max_bytes = v;
        }
        if let Some(v) = overlay.logging.level {
            self.logging.level = v;
        }
        if let Some(v) = overlay.logging.file {
            self.logging.file = Some(v);
        }

        merge_rules(&mut self.rules, overlay.rules, &s.remove_rules, s.replace_rules);
    }

    /// Render the merged configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
