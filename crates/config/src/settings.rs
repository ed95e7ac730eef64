// Application settings
// Loaded from ~/.config/typecalc/settings.json

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Response shape of a geolocation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoProviderKind {
    /// ipapi.co: `currency` field, falling back to `country`
    #[serde(rename = "ipapi")]
    IpapiCo,
    /// ip-api.com: `countryCode` field
    #[serde(rename = "ip-api")]
    IpApiCom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoProviderConfig {
    pub url: String,
    pub kind: GeoProviderKind,
}

fn default_geo_providers() -> Vec<GeoProviderConfig> {
    vec![
        GeoProviderConfig {
            url: "https://ipapi.co/json/".to_string(),
            kind: GeoProviderKind::IpapiCo,
        },
        GeoProviderConfig {
            url: "http://ip-api.com/json/".to_string(),
            kind: GeoProviderKind::IpApiCom,
        },
    ]
}

#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Settings I/O error: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Settings format error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Currency
    #[serde(rename = "currency.ratesUrl")]
    pub rates_url: String,

    #[serde(rename = "currency.cacheHours")]
    pub cache_hours: u64,

    /// Skips geolocation when set
    #[serde(rename = "currency.homeCurrency")]
    pub home_currency: Option<String>,

    #[serde(rename = "currency.geoProviders")]
    pub geo_providers: Vec<GeoProviderConfig>,

    // AI fallback
    #[serde(rename = "ai.enabled")]
    pub ai_enabled: bool,

    /// No endpoint = no AI fallback
    #[serde(rename = "ai.endpoint")]
    pub ai_endpoint: Option<String>,

    #[serde(rename = "ai.debounceMs")]
    pub ai_debounce_ms: u64,

    #[serde(rename = "ai.minChars")]
    pub ai_min_chars: usize,

    #[serde(rename = "ai.maxChars")]
    pub ai_max_chars: usize,

    // Network
    #[serde(rename = "http.timeoutSecs")]
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rates_url: "https://open.er-api.com/v6/latest/USD".to_string(),
            cache_hours: 24,
            home_currency: None,
            geo_providers: default_geo_providers(),
            ai_enabled: true,
            ai_endpoint: None,
            ai_debounce_ms: 3000,
            ai_min_chars: 5,
            ai_max_chars: 1000,
            http_timeout_secs: 15,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::config_dir().join("settings.json")
    }

    /// Load settings from the default location, then apply env overrides
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::config_path());
        settings.apply_env_overrides();
        settings
    }

    /// Load settings from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("Error parsing {}: {}; using defaults", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Environment overrides for headless use
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get("TYPECALC_AI_ENDPOINT") {
            self.ai_endpoint = Some(endpoint);
        }
        if let Some(url) = get("TYPECALC_RATES_URL") {
            self.rates_url = url;
        }
        if let Some(code) = get("TYPECALC_HOME_CURRENCY") {
            self.home_currency = Some(code.trim().to_uppercase());
        }
    }

    /// Rate cache freshness window in seconds
    pub fn cache_max_age_secs(&self) -> u64 {
        self.cache_hours * 3600
    }
}
