//! Start-up configuration.
//!
//! Built-in defaults are overlaid by an optional RON file, then by the
//! `OUTREACH_BASE_URL` environment variable, then by command-line flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use outreach_engine::{Endpoints, WebhookSettings};
use outreach_logging::{LogDestination, DEFAULT_LOG_FILE};
use serde::Deserialize;

pub const BASE_URL_ENV: &str = "OUTREACH_BASE_URL";
pub const DEFAULT_CONFIG_FILE: &str = "outreach.ron";
pub const DEFAULT_SUBJECT: &str = "Project Update: Progress Report for AI System";
pub const DEFAULT_BODY: &str = "Hello Team,\n\nThis is to inform you that our AI system project is \
progressing as planned. The next development phase will start tomorrow, focusing on model \
optimization and testing.\n\nBest regards,";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub search_path: String,
    pub persist_path: String,
    pub generate_path: String,
    pub send_path: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub export_dir: PathBuf,
    /// `file`, `terminal` or `both`.
    pub log: String,
    pub log_file: PathBuf,
    /// Pre-filled composer form.
    pub default_subject: String,
    pub default_body: String,
    /// File the values were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5678/webhook".to_string(),
            search_path: "ai-business-lookup".to_string(),
            persist_path: "Sheet_management".to_string(),
            generate_path: "email_writting".to_string(),
            send_path: "email_management".to_string(),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
            export_dir: PathBuf::from("./exports"),
            log: "file".to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            default_subject: DEFAULT_SUBJECT.to_string(),
            default_body: DEFAULT_BODY.to_string(),
            source: None,
        }
    }
}

/// Values given on the command line. `None` keeps the lower layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log: Option<String>,
}

impl AppConfig {
    /// Builds the effective configuration.
    ///
    /// An explicit `file` must exist. Without one, `outreach.ron` in the
    /// working directory is read when present.
    pub fn load(
        file: Option<&Path>,
        env_base_url: Option<String>,
        cli: CliOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(base_url) = env_base_url.filter(|value| !value.trim().is_empty()) {
            config.base_url = base_url;
        }
        config.apply(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Self {
            source: Some(path.to_path_buf()),
            ..config
        })
    }

    fn apply(&mut self, cli: CliOverrides) {
        if let Some(base_url) = cli.base_url {
            self.base_url = base_url;
        }
        if let Some(secs) = cli.timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_url",
                message: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "connect_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        self.log_destination()?;
        Ok(())
    }

    pub fn log_destination(&self) -> Result<LogDestination, ConfigError> {
        LogDestination::from_name(&self.log).ok_or_else(|| ConfigError::Invalid {
            field: "log",
            message: format!("{:?} is not one of file, terminal, both", self.log),
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::from_base(
            &self.base_url,
            &self.search_path,
            &self.persist_path,
            &self.generate_path,
            &self.send_path,
        )
    }

    pub fn webhook_settings(&self) -> WebhookSettings {
        WebhookSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("outreach.ron");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn defaults_point_at_local_webhooks() {
        let endpoints = AppConfig::default().endpoints();
        assert_eq!(endpoints.search, "http://localhost:5678/webhook/ai-business-lookup");
        assert_eq!(endpoints.persist, "http://localhost:5678/webhook/Sheet_management");
        assert_eq!(endpoints.generate, "http://localhost:5678/webhook/email_writting");
        assert_eq!(endpoints.send, "http://localhost:5678/webhook/email_management");
        assert_eq!(AppConfig::default().webhook_settings().request_timeout, Duration::from_secs(300));
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"(base_url: "https://n8n.example.com/webhook", request_timeout_secs: 60)"#,
        );

        let config = AppConfig::load(Some(&path), None, CliOverrides::default()).unwrap();

        assert_eq!(config.base_url, "https://n8n.example.com/webhook");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.send_path, "email_management");
    }

    #[test]
    fn env_then_cli_take_precedence() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"(base_url: "http://from-file/webhook")"#);

        let from_env = AppConfig::load(
            Some(&path),
            Some("http://from-env/webhook".to_string()),
            CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(from_env.base_url, "http://from-env/webhook");

        let from_cli = AppConfig::load(
            Some(&path),
            Some("http://from-env/webhook".to_string()),
            CliOverrides {
                base_url: Some("http://from-cli/webhook".to_string()),
                timeout_secs: Some(30),
                log: Some("both".to_string()),
            },
        )
        .unwrap();
        assert_eq!(from_cli.base_url, "http://from-cli/webhook");
        assert_eq!(from_cli.request_timeout_secs, 30);
        assert_eq!(from_cli.log_destination().unwrap(), LogDestination::Both);
    }

    #[test]
    fn composer_starts_filled_unless_configured() {
        let defaults = AppConfig::default();
        assert_eq!(defaults.default_subject, "Project Update: Progress Report for AI System");
        assert!(defaults.default_body.starts_with("Hello Team,\n\n"));
        assert_eq!(defaults.source, None);

        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"(default_subject: "Hello from us")"#);
        let config = AppConfig::load(Some(&path), None, CliOverrides::default()).unwrap();
        assert_eq!(config.default_subject, "Hello from us");
        assert_eq!(config.default_body, DEFAULT_BODY);
        assert_eq!(config.source, Some(path));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(
            Some(&dir.path().join("absent.ron")),
            None,
            CliOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "(request_timeout_secs: 0)");
        let err = AppConfig::load(Some(&path), None, CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "request_timeout_secs", .. }));

        let err = AppConfig::load(
            None,
            None,
            CliOverrides {
                log: Some("syslog".to_string()),
                ..CliOverrides::default()
            },
        );
        assert!(matches!(err, Err(ConfigError::Invalid { field: "log", .. })));
    }

    #[test]
    fn unparseable_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "(base_url: 42)");
        let err = AppConfig::load(Some(&path), None, CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if p == &path));
    }
}
