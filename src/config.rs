use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Env var naming an optional TOML file loaded before the environment overlay.
pub const CONFIG_PATH_VAR: &str = "FEED_RELAY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How selected items are sent to the webhook.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// One interactive card holding every item.
    #[default]
    Card,
    /// One plain-text message per item.
    Text,
}

impl FromStr for DeliveryMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "interactive" => Ok(DeliveryMode::Card),
            "text" | "plain" => Ok(DeliveryMode::Text),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Upper bound on items delivered after the first run
    #[serde(default = "default_max_items_per_run")]
    pub max_items_per_run: usize,
    /// Per-request network timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub include_summary: bool,
    /// Summary length in characters before the ellipsis is appended
    #[serde(default = "default_summary_max_len")]
    pub summary_max_len: usize,
    /// Send a notice when a run finds nothing new
    #[serde(default)]
    pub always_notify: bool,
    /// Send a notice when the feed yields no entries at all
    #[serde(default = "default_true")]
    pub notify_on_empty: bool,
    /// Ignore the watermark and resend the newest `force_items` entries
    #[serde(default)]
    pub force_send: bool,
    #[serde(default = "default_force_items")]
    pub force_items: usize,
    #[serde(default = "default_card_title")]
    pub card_title: String,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default)]
    pub delivery: DeliveryMode,
}

fn default_feed_url() -> String {
    "https://imjuya.github.io/juya-ai-daily/rss.xml".to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state.json")
}

fn default_max_items_per_run() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_summary_max_len() -> usize {
    140
}

fn default_true() -> bool {
    true
}

fn default_force_items() -> usize {
    3
}

fn default_card_title() -> String {
    "Feed Update".to_string()
}

fn default_bot_name() -> String {
    "RSS Bot".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            webhook_url: None,
            state_file: default_state_file(),
            max_items_per_run: default_max_items_per_run(),
            timeout_secs: default_timeout_secs(),
            include_summary: false,
            summary_max_len: default_summary_max_len(),
            always_notify: false,
            notify_on_empty: true,
            force_send: false,
            force_items: default_force_items(),
            card_title: default_card_title(),
            bot_name: default_bot_name(),
            delivery: DeliveryMode::Card,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Build the process configuration from the real environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of variables: the optional
    /// TOML file named by [`CONFIG_PATH_VAR`] first, then every recognised
    /// variable on top of it.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let vars: Vec<(String, String)> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();

        let base = match vars.iter().find(|(k, _)| k == CONFIG_PATH_VAR) {
            Some((_, path)) if !path.is_empty() => Self::load(path)?,
            _ => Self::default(),
        };

        let config = base.overlay(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn overlay(mut self, vars: Vec<(String, String)>) -> Result<Self, ConfigError> {
        if let Some(url) = webhook_from(&vars) {
            self.webhook_url = url;
        }

        for (key, value) in vars {
            match key.as_str() {
                "RSS_URL" => self.feed_url = value,
                "STATE_FILE" => self.state_file = PathBuf::from(value),
                "MAX_ITEMS_PER_RUN" => self.max_items_per_run = parse_number(&key, &value)?,
                "TIMEOUT" => self.timeout_secs = parse_number(&key, &value)?,
                "INCLUDE_SUMMARY" => self.include_summary = parse_flag(&key, &value)?,
                "SUMMARY_MAX_LEN" => self.summary_max_len = parse_number(&key, &value)?,
                "ALWAYS_NOTIFY" => self.always_notify = parse_flag(&key, &value)?,
                "NOTIFY_ON_EMPTY" => self.notify_on_empty = parse_flag(&key, &value)?,
                "FORCE_SEND" => self.force_send = parse_flag(&key, &value)?,
                "FORCE_ITEMS" => self.force_items = parse_number(&key, &value)?,
                "CARD_TITLE" => self.card_title = value,
                "BOT_NAME" => self.bot_name = value,
                "DELIVERY_MODE" => {
                    self.delivery = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue {
                            key: key.clone(),
                            value: value.clone(),
                        })?;
                }
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::Invalid("feed URL is empty".to_string()));
        }
        if self.max_items_per_run == 0 {
            return Err(ConfigError::Invalid(
                "max_items_per_run must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `FEISHU_WEBHOOK` wins over its `WEBHOOK_URL` alias whatever the variable
/// order. `None` when neither is present; `Some(None)` when both are blank.
fn webhook_from(vars: &[(String, String)]) -> Option<Option<String>> {
    let lookup = |name: &str| {
        vars.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim().to_string())
    };

    let primary = lookup("FEISHU_WEBHOOK");
    let alias = lookup("WEBHOOK_URL");
    if primary.is_none() && alias.is_none() {
        return None;
    }

    Some(
        primary
            .filter(|v| !v.is_empty())
            .or(alias.filter(|v| !v.is_empty())),
    )
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
