use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const ENV_LLM_HOSTNAME: &str = "OUTFIT_LLM_HOSTNAME";
pub const ENV_LLM_MODEL: &str = "OUTFIT_LLM_MODEL";
pub const ENV_PUSHOVER_API_TOKEN: &str = "OUTFIT_PUSHOVER_API_TOKEN";
pub const ENV_PUSHOVER_USER_KEY: &str = "OUTFIT_PUSHOVER_USER_KEY";

/// The fixed point the advisory is produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone the provider reports hourly times in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl LocationConfig {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let location = Self { latitude, longitude, timezone: default_timezone() };
        location.validate()?;
        Ok(location)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            bail!("Latitude {} is out of range (expected -90..=90).", self.latitude);
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            bail!("Longitude {} is out of range (expected -180..=180).", self.longitude);
        }
        if self.timezone.trim().is_empty() {
            bail!("Location timezone must not be empty.");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    /// Number of days of hourly data requested from the provider.
    pub forecast_days: u8,
    /// Upper bound on the number of hourly points fed to the generator.
    pub hours_ahead: usize,
    pub timeout_secs: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            forecast_days: 1,
            hours_ahead: 1,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the text generation host, e.g. `http://localhost:11434`.
    pub hostname: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { hostname: None, model: "llama3.2:1b".to_string(), timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub api_token: Option<String>,
    pub user_key: Option<String>,
    pub title: String,
    pub sound: String,
    pub priority: i8,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            user_key: None,
            title: "Clothing Suggestion".to_string(),
            sound: "falling".to_string(),
            priority: 0,
            base_url: "https://api.pushover.net".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [location]
/// latitude = 51.406
/// longitude = 0.015
///
/// [generator]
/// hostname = "http://localhost:11434"
///
/// [notification]
/// api_token = "..."
/// user_key = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub location: Option<LocationConfig>,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl Config {
    /// Load config from the platform config directory, or return an empty default.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "outfit", "outfit-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay secrets and the generation host from the environment.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty(ENV_LLM_HOSTNAME) {
            self.generator.hostname = Some(host);
        }
        if let Some(model) = non_empty(ENV_LLM_MODEL) {
            self.generator.model = model;
        }
        if let Some(token) = non_empty(ENV_PUSHOVER_API_TOKEN) {
            self.notification.api_token = Some(token);
        }
        if let Some(user) = non_empty(ENV_PUSHOVER_USER_KEY) {
            self.notification.user_key = Some(user);
        }
        self
    }

    pub fn location(&self) -> Result<&LocationConfig> {
        self.location.as_ref().ok_or_else(|| {
            anyhow!(
                "No location configured.\n\
                 Hint: run `outfit configure` and enter the latitude and longitude."
            )
        })
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        let timezone = self
            .location
            .as_ref()
            .map(|l| l.timezone.clone())
            .unwrap_or_else(default_timezone);
        let location = LocationConfig { latitude, longitude, timezone };
        location.validate()?;
        self.location = Some(location);
        Ok(())
    }

    pub fn generator_hostname(&self) -> Result<&str> {
        self.generator
            .hostname
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No text generation host configured.\n\
                     Hint: run `outfit configure` or set {ENV_LLM_HOSTNAME}."
                )
            })
    }

    /// Returns `(api_token, user_key)` for the notification endpoint.
    pub fn notification_credentials(&self) -> Result<(&str, &str)> {
        let token = self.notification.api_token.as_deref().filter(|t| !t.is_empty());
        let user = self.notification.user_key.as_deref().filter(|u| !u.is_empty());

        match (token, user) {
            (Some(token), Some(user)) => Ok((token, user)),
            _ => Err(anyhow!(
                "Notification credentials are incomplete.\n\
                 Hint: run `outfit configure` or set {ENV_PUSHOVER_API_TOKEN} and {ENV_PUSHOVER_USER_KEY}."
            )),
        }
    }

    /// Check everything a full run needs.
    pub fn validate(&self) -> Result<()> {
        self.location()?.validate()?;

        if self.forecast.hours_ahead == 0 {
            bail!("forecast.hours_ahead must be at least 1.");
        }
        if !(1..=16).contains(&self.forecast.forecast_days) {
            bail!(
                "forecast.forecast_days must be between 1 and 16, got {}.",
                self.forecast.forecast_days
            );
        }
        if self.generator.model.trim().is_empty() {
            bail!("generator.model must not be empty.");
        }

        self.generator_hostname()?;
        self.notification_credentials()?;
        Ok(())
    }
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}
