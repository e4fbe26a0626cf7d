//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Loaded once at process start and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Announcement page to watch
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client settings used for scraping
    #[serde(default)]
    pub http: HttpConfig,

    /// Polling loop behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Liveness endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Topic tag table, in rendering order
    #[serde(default = "defaults::tags")]
    pub tags: Vec<TagRule>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay secrets and deployment-specific values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = Some(token.trim().to_string());
        }
        if let Some(ids) = get("GROUPS_IDS") {
            self.telegram.chat_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(owner) = get("BOT_OWNER_ID") {
            self.telegram.owner_chat_id = Some(owner.trim().to_string());
        }
        if let Some(host) = get("PROXY_IP") {
            self.http.proxy_host = Some(host.trim().to_string());
        }
        if let Some(port) = get("PROXY_PORT") {
            match port.trim().parse() {
                Ok(port) => self.http.proxy_port = Some(port),
                Err(_) => log::warn!("Ignoring invalid PROXY_PORT value: {}", port),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.source.url)
            .map_err(|e| AppError::validation(format!("source.url is invalid: {e}")))?;
        if self.source.row_style.trim().is_empty() {
            return Err(AppError::validation("source.row_style is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.proxy_host.is_some() != self.http.proxy_port.is_some() {
            return Err(AppError::validation(
                "http.proxy_host and http.proxy_port must be set together",
            ));
        }
        if self.monitor.interval_secs == 0 {
            return Err(AppError::validation("monitor.interval_secs must be > 0"));
        }
        for rule in &self.tags {
            if rule.tag.trim().is_empty() {
                return Err(AppError::validation("tags: empty tag name"));
            }
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(AppError::validation(format!(
                    "tags: {} has no keywords",
                    rule.tag
                )));
            }
        }
        Ok(())
    }

    /// Ensure everything needed to actually deliver messages is present.
    pub fn require_delivery(&self) -> Result<()> {
        if self.telegram.bot_token.as_deref().is_none_or(str::is_empty) {
            return Err(AppError::config(
                "Telegram bot token is not set (BOT_TOKEN or telegram.bot_token)",
            ));
        }
        if self.telegram.chat_ids.is_empty() {
            return Err(AppError::config(
                "No destination chats configured (GROUPS_IDS or telegram.chat_ids)",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            http: HttpConfig::default(),
            monitor: MonitorConfig::default(),
            telegram: TelegramConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            tags: defaults::tags(),
        }
    }
}

/// Announcement page location and row signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the announcements page
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// Exact `style` attribute of the first cell of an announcement row
    #[serde(default = "defaults::row_style")]
    pub row_style: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
            row_style: defaults::row_style(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for page requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds (scrape and delivery)
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Optional HTTP proxy host
    #[serde(default)]
    pub proxy_host: Option<String>,

    /// Optional HTTP proxy port
    #[serde(default)]
    pub proxy_port: Option<u16>,
}

impl HttpConfig {
    /// Proxy URL if both host and port are configured.
    pub fn proxy_url(&self) -> Option<String> {
        match (&self.proxy_host, self.proxy_port) {
            (Some(host), Some(port)) => Some(format!("http://{}:{}", host, port)),
            _ => None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            proxy_host: None,
            proxy_port: None,
        }
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Sleep between cycles in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Pause after each outbound message in milliseconds
    #[serde(default = "defaults::send_delay")]
    pub send_delay_ms: u64,

    /// File holding the identifiers already delivered
    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            send_delay_ms: defaults::send_delay(),
            state_file: defaults::state_file(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token; usually supplied through `BOT_TOKEN`
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Group chats that receive announcements
    #[serde(default)]
    pub chat_ids: Vec<String>,

    /// Chat that receives crash reports
    #[serde(default)]
    pub owner_chat_id: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_ids", &self.chat_ids)
            .field("owner_chat_id", &self.owner_chat_id)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: None,
            chat_ids: Vec::new(),
            owner_chat_id: None,
        }
    }
}

/// Liveness endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Plaintext body returned by the endpoint
    #[serde(default = "defaults::alive_message")]
    pub message: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            message: defaults::alive_message(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// A topic tag and the title keywords that select it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRule {
    /// Label rendered in the message, e.g. `#Exams`
    pub tag: String,

    /// Lowercase substrings matched against the title
    pub keywords: Vec<String>,
}

mod defaults {
    use std::path::PathBuf;

    use super::TagRule;

    // Source defaults
    pub fn source_url() -> String {
        "https://fmi.univ-tiaret.dz/index.php".into()
    }
    pub fn row_style() -> String {
        "border: 1px solid #ababab; text-align: center;".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }

    // Monitor defaults
    pub fn interval() -> u64 {
        900
    }
    pub fn send_delay() -> u64 {
        1000
    }
    pub fn state_file() -> PathBuf {
        PathBuf::from("seen_announcements.json")
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        8080
    }
    pub fn alive_message() -> String {
        "Announcement Bot is alive and checking!".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }

    fn rule(tag: &str, keywords: &[&str]) -> TagRule {
        TagRule {
            tag: tag.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    // Tag table defaults
    pub fn tags() -> Vec<TagRule> {
        vec![
            rule("#Exams", &["examen", "examens", "planning", "rattrapage"]),
            rule("#Results", &["resultat", "résultats", "notes", "affichage"]),
            rule("#Masters", &["master", "masters"]),
            rule("#Doctorate", &["doctorat", "phd"]),
            rule(
                "#Important",
                &["important", "urgent", "reporté", "تنبيه", "هام"],
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_tag_table_has_five_categories() {
        let config = Config::default();
        let tags: Vec<_> = config.tags.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec!["#Exams", "#Results", "#Masters", "#Doctorate", "#Important"]
        );
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.monitor.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_half_configured_proxy() {
        let mut config = Config::default();
        config.http.proxy_host = Some("10.0.0.1".to_string());
        assert!(config.validate().is_err());

        config.http.proxy_port = Some(3128);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.http.proxy_url().as_deref(),
            Some("http://10.0.0.1:3128")
        );
    }

    #[test]
    fn validate_rejects_bad_source_url() {
        let mut config = Config::default();
        config.source.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let config: Config = toml::from_str(
            r##"
            [source]
            url = "https://example.edu/news"

            [monitor]
            interval_secs = 60

            [[tags]]
            tag = "#Sport"
            keywords = ["football"]
            "##,
        )
        .unwrap();

        assert_eq!(config.source.url, "https://example.edu/news");
        assert_eq!(config.source.row_style, defaults::row_style());
        assert_eq!(config.monitor.interval_secs, 60);
        assert_eq!(config.monitor.send_delay_ms, 1000);
        assert_eq!(config.http.timeout_secs, 20);
        assert_eq!(config.tags.len(), 1);
        assert_eq!(config.tags[0].tag, "#Sport");
    }

    #[test]
    fn load_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor\ninterval_secs = 60\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(AppError::Toml(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn env_overlay_sets_secrets_and_proxy() {
        let env = vars(&[
            ("BOT_TOKEN", "123:ABC"),
            ("GROUPS_IDS", " -1001, -1002 ,,"),
            ("BOT_OWNER_ID", "42"),
            ("PROXY_IP", "10.0.0.1"),
            ("PROXY_PORT", "8080"),
        ]);
        let mut config = Config::default();
        config.apply_vars(|key| env.get(key).cloned());

        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
        assert_eq!(config.telegram.chat_ids, vec!["-1001", "-1002"]);
        assert_eq!(config.telegram.owner_chat_id.as_deref(), Some("42"));
        assert_eq!(
            config.http.proxy_url().as_deref(),
            Some("http://10.0.0.1:8080")
        );
        assert!(config.require_delivery().is_ok());
    }

    #[test]
    fn env_overlay_ignores_invalid_port() {
        let env = vars(&[("PROXY_PORT", "eighty")]);
        let mut config = Config::default();
        config.apply_vars(|key| env.get(key).cloned());
        assert!(config.http.proxy_port.is_none());
    }

    #[test]
    fn require_delivery_needs_token_and_chats() {
        let mut config = Config::default();
        assert!(config.require_delivery().is_err());

        config.telegram.bot_token = Some("123:ABC".to_string());
        assert!(config.require_delivery().is_err());

        config.telegram.chat_ids = vec!["-1001".to_string()];
        assert!(config.require_delivery().is_ok());
    }

    #[test]
    fn debug_output_redacts_token() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("123:SECRET".to_string());
        let rendered = format!("{:?}", config.telegram);
        assert!(!rendered.contains("SECRET"));
    }
}
