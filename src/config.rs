//! Settings and configuration structures.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. an explicit file passed on the command line (optional)
//! 4. environment variables prefixed with `STOCKWATCH__`, e.g. `STOCKWATCH__SOURCE__MODE=snapshot`

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::market_data::adapters::ProviderKind;
use crate::quote::types::{default_symbols, SymbolConfig, SymbolSet};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub news: NewsSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<SymbolConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: SourceSettings::default(),
            http: HttpSettings::default(),
            cache: CacheSettings::default(),
            news: NewsSettings::default(),
            dashboard: DashboardSettings::default(),
            display: DisplaySettings::default(),
            symbols: default_symbols(),
        }
    }
}

impl Settings {
    pub fn load(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));
        if let Some(path) = extra {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("STOCKWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("source.providers")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("at least one symbol is required".into()));
        }
        if self.source.mode == SourceMode::Live && self.source.providers.is_empty() {
            return Err(ConfigError::Invalid("live mode needs at least one provider".into()));
        }
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.http.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_secs must be between {} and {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS
            )));
        }
        if !(1..=10).contains(&self.news.max_entries) {
            return Err(ConfigError::Invalid("news.max_entries must be between 1 and 10".into()));
        }
        self.display.offset()?;
        Ok(())
    }

    pub fn symbol_set(&self) -> SymbolSet {
        SymbolSet::new(self.symbols.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Live,
    Snapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub mode: SourceMode,
    // live mode: tried in this order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderKind>,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            mode: SourceMode::default(),
            providers: default_providers(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::Yahoo]
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/quotes.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,
    #[serde(default = "default_twse_base_url")]
    pub twse_base_url: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            yahoo_base_url: default_yahoo_base_url(),
            twse_base_url: default_twse_base_url(),
        }
    }
}

// Upstream calls are bounded to 8-10 s
const MIN_TIMEOUT_SECS: u64 = 8;
const MAX_TIMEOUT_SECS: u64 = 10;

fn default_timeout_secs() -> u64 {
    MAX_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_twse_base_url() -> String {
    "https://mis.twse.com.tw".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: default_ttl_secs() }
    }
}

fn default_ttl_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsSettings {
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    #[serde(default = "default_locale")]
    pub locale: String, // hl
    #[serde(default = "default_region")]
    pub region: String, // gl
    #[serde(default = "default_edition")]
    pub edition: String, // ceid
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            base_url: default_news_base_url(),
            locale: default_locale(),
            region: default_region(),
            edition: default_edition(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_news_base_url() -> String {
    "https://news.google.com/rss/search".into()
}

fn default_locale() -> String {
    "zh-TW".into()
}

fn default_region() -> String {
    "TW".into()
}

fn default_edition() -> String {
    "TW:zh-Hant".into()
}

fn default_max_entries() -> usize {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

// Sign colours. Defaults follow the Taiwan convention: red up, green down.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorSettings {
    #[serde(default = "default_positive")]
    pub positive: String,
    #[serde(default = "default_negative")]
    pub negative: String,
    #[serde(default = "default_flat")]
    pub flat: String,
    #[serde(default = "default_price")]
    pub price: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            positive: default_positive(),
            negative: default_negative(),
            flat: default_flat(),
            price: default_price(),
        }
    }
}

fn default_positive() -> String {
    "#d60000".into()
}

fn default_negative() -> String {
    "#008000".into()
}

fn default_flat() -> String {
    "#666666".into()
}

fn default_price() -> String {
    "#111111".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64, // page auto-refresh; 0 disables
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub colors: ColorSettings,
    #[serde(default = "default_widgets")]
    pub widgets: bool,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            refresh_secs: default_refresh_secs(),
            theme: Theme::default(),
            colors: ColorSettings::default(),
            widgets: default_widgets(),
            title: default_title(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_widgets() -> bool {
    true
}

fn default_title() -> String {
    "Stock Watch".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySettings {
    // offset used for snapshot timestamps and page captions
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl DisplaySettings {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid(format!("utc_offset_hours out of range: {}", self.utc_offset_hours)))
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { utc_offset_hours: default_utc_offset_hours() }
    }
}

fn default_utc_offset_hours() -> i32 {
    8
}
