//! Application configuration: TOML file plus environment overrides.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Default HTTP port for the feedback relay.
pub const DEFAULT_PORT: u16 = 10000;

/// Largest screenshot the relay accepts.
pub const DEFAULT_MAX_SCREENSHOT_BYTES: usize = 5 * 1024 * 1024;

/// How outgoing feedback mail is delivered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    /// Write each message as a JSON file.
    #[default]
    Outbox,
    /// Send through the SendGrid HTTP API.
    SendGrid,
}

/// Mail delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct MailConfig {
    /// Delivery mechanism.
    #[serde(default)]
    transport: TransportKind,

    /// Address feedback is sent to and from.
    #[serde(default = "default_support_address")]
    support_address: String,

    /// Display name on the From header.
    #[serde(default = "default_sender_name")]
    sender_name: String,

    /// SendGrid API key. Usually supplied through `SENDGRID_API_KEY`.
    #[serde(default)]
    sendgrid_api_key: Option<String>,

    /// SendGrid send endpoint.
    #[serde(default = "default_sendgrid_endpoint")]
    sendgrid_endpoint: String,

    /// Directory for the outbox transport.
    #[serde(default = "default_outbox_dir")]
    outbox_dir: PathBuf,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            support_address: default_support_address(),
            sender_name: default_sender_name(),
            sendgrid_api_key: None,
            sendgrid_endpoint: default_sendgrid_endpoint(),
            outbox_dir: default_outbox_dir(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interface the relay binds to.
    #[serde(default = "default_host")]
    host: String,

    /// Port the relay listens on.
    #[serde(default = "default_port")]
    port: u16,

    /// File holding the edited content bundle.
    #[serde(default = "default_content_path")]
    content_path: PathBuf,

    /// Screenshot size limit in bytes.
    #[serde(default = "default_max_screenshot_bytes")]
    max_screenshot_bytes: usize,

    /// Mail delivery.
    #[serde(default)]
    mail: MailConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_content_path() -> PathBuf {
    PathBuf::from("chess_worlds_content.json")
}

fn default_max_screenshot_bytes() -> usize {
    DEFAULT_MAX_SCREENSHOT_BYTES
}

fn default_support_address() -> String {
    "support@chessworldsgame.com".to_string()
}

fn default_sender_name() -> String {
    "Chess Worlds Support".to_string()
}

fn default_sendgrid_endpoint() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("outbox")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            content_path: default_content_path(),
            max_screenshot_bytes: default_max_screenshot_bytes(),
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads the file if it exists, otherwise defaults, then applies the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid or an
    /// environment override cannot be parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            Self::from_file(path.as_ref())?
        } else {
            debug!("No config file, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        info!(
            port = config.port,
            transport = %config.mail.transport,
            content = %config.content_path.display(),
            "Config loaded"
        );
        Ok(config)
    }

    /// Applies `PORT`, `SUPPORT_ADDRESS`, `SENDGRID_API_KEY`,
    /// `CHESS_WORLDS_CONTENT`, `CHESS_WORLDS_OUTBOX` and
    /// `CHESS_WORLDS_TRANSPORT` from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PORT` or `CHESS_WORLDS_TRANSPORT` is invalid.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid PORT {:?}: {}", port, e)))?;
        }
        if let Some(address) = lookup("SUPPORT_ADDRESS") {
            self.mail.support_address = address;
        }
        if let Some(key) = lookup("SENDGRID_API_KEY") {
            self.mail.sendgrid_api_key = Some(key);
        }
        if let Some(path) = lookup("CHESS_WORLDS_CONTENT") {
            self.content_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("CHESS_WORLDS_OUTBOX") {
            self.mail.outbox_dir = PathBuf::from(dir);
        }
        if let Some(kind) = lookup("CHESS_WORLDS_TRANSPORT") {
            self.mail.transport = kind.trim().to_lowercase().parse().map_err(|_| {
                ConfigError::new(format!("Invalid CHESS_WORLDS_TRANSPORT {:?}", kind))
            })?;
        }
        Ok(())
    }

    /// Overrides the bind address.
    pub fn with_listen(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port` for binding.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(*config.port(), 10000);
        assert_eq!(config.mail().support_address(), "support@chessworldsgame.com");
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
port = 8080

[mail]
transport = "sendgrid"
sender_name = "Feedback Bot"
"#,
        )
        .expect("parse");
        assert_eq!(*config.port(), 8080);
        assert_eq!(*config.mail().transport(), TransportKind::SendGrid);
        assert_eq!(config.mail().sender_name(), "Feedback Bot");
        assert_eq!(config.mail().outbox_dir(), &PathBuf::from("outbox"));
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "4321"),
            ("SENDGRID_API_KEY", "sg-key"),
            ("CHESS_WORLDS_TRANSPORT", "SendGrid"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(*config.port(), 4321);
        assert_eq!(config.mail().sendgrid_api_key().as_deref(), Some("sg-key"));
        assert_eq!(*config.mail().transport(), TransportKind::SendGrid);
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()))
            .expect_err("invalid");
        assert!(err.message.contains("Invalid PORT"));
    }
}
