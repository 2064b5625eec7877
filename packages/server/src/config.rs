//! Runtime configuration for the Quill server core.
//!
//! A single [`RunMode`] flag drives both behavioral splits in the pipeline:
//! console vs asynchronous file logging, and reload-per-render vs cached
//! templates. Everything else is plain data with sensible defaults; loading
//! these values from a file or the environment is the caller's concern.

use std::path::PathBuf;

/// Application run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Development: synchronous console logging, templates recompiled on
    /// every render so on-disk edits are visible without a restart.
    Dev,
    /// Production: asynchronous rotating file logging, templates compiled
    /// once at startup and reused for the process lifetime.
    Prod,
}

impl RunMode {
    #[must_use]
    pub fn is_dev(self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Top-level configuration for the server core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Run mode controlling the logging and template strategies.
    pub mode: RunMode,
    /// Value written to the `Server` response header on authenticated
    /// requests, marking the serving instance.
    pub instance_tag: String,
    /// Bind address and CORS settings.
    pub network: NetworkConfig,
    /// Token verification settings.
    pub auth: AuthConfig,
    /// Request-log file settings (production mode only).
    pub log: LogConfig,
    /// Template directory settings.
    pub templates: TemplateConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Prod,
            instance_tag: "quill".to_string(),
            network: NetworkConfig::default(),
            auth: AuthConfig::default(),
            log: LogConfig::default(),
            templates: TemplateConfig::default(),
        }
    }
}

/// Bind address and CORS configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins. A wildcard `"*"` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Shared-secret configuration for bearer-token verification.
///
/// The core only verifies tokens; issuance happens elsewhere with the same
/// secret.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret shared with the token issuer.
    pub secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "quill-dev-secret".to_string(),
        }
    }
}

/// Request-log file settings.
///
/// The log directory is created on startup if absent. Files rotate daily as
/// `<file_prefix>.<date>.log` and old files beyond the retention window are
/// pruned.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding rotated log files.
    pub dir: PathBuf,
    /// Rotated file name prefix.
    pub file_prefix: String,
    /// Bounded in-memory queue depth for the asynchronous sink. A full
    /// queue drops lines rather than stalling the request path.
    pub queue_capacity: usize,
    /// Number of daily files kept before pruning.
    pub retention_days: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_prefix: "app".to_string(),
            queue_capacity: 1000,
            retention_days: 30,
        }
    }
}

/// Template directory settings.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Directory scanned (recursively) for `.html` templates.
    pub dir: PathBuf,
}

impl TemplateConfig {
    /// Glob pattern covering every template under the configured directory.
    /// Template names are paths relative to that directory.
    #[must_use]
    pub fn glob(&self) -> String {
        format!("{}/**/*.html", self.dir.display())
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("views"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.mode, RunMode::Prod);
        assert_eq!(config.instance_tag, "quill");
        assert_eq!(config.network.host, "0.0.0.0");
        assert_eq!(config.network.port, 0);
        assert_eq!(config.network.cors_origins, vec!["*"]);
    }

    #[test]
    fn log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.dir, PathBuf::from("logs"));
        assert_eq!(config.file_prefix, "app");
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn template_glob_covers_nested_files() {
        let config = TemplateConfig {
            dir: PathBuf::from("views"),
        };
        assert_eq!(config.glob(), "views/**/*.html");
    }

    #[test]
    fn run_mode_is_dev() {
        assert!(RunMode::Dev.is_dev());
        assert!(!RunMode::Prod.is_dev());
    }
}
