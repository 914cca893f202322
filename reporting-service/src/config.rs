use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use anyhow::{bail, Context};
use sems_client::ApiClient;
use serde::Deserialize;
use time::UtcOffset;

use crate::export::format::CurrencyFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Overridden by `SEMS_API_TOKEN` when set.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub meter_id: Option<i64>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Csv,
    Sample,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub fallback_to_sample: bool,
    #[serde(default = "default_sample_days")]
    pub sample_days: u32,
}

fn default_true() -> bool {
    true
}

fn default_sample_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub max_age_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_age_secs: 300 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub utc_offset_hours: i8,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u8 {
    2
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 0,
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
        }
    }
}

impl ReportConfig {
    pub fn offset(&self) -> anyhow::Result<UtcOffset> {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0)
            .with_context(|| format!("invalid report.utc_offset_hours {}", self.utc_offset_hours))
    }

    pub fn currency(&self) -> CurrencyFormat {
        CurrencyFormat {
            symbol: self.currency_symbol.clone(),
            decimals: self.currency_decimals,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: Option<ApiConfig>,
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var("REPORTING_CONFIG").unwrap_or_else(|_| "reporting-config.toml".to_string());
        let contents =
            fs::read_to_string(&path).with_context(|| format!("failed to read config file {path}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.source.kind {
            SourceKind::Http if self.api.is_none() => {
                bail!("source.kind = \"http\" requires an [api] section")
            }
            SourceKind::Csv if self.source.csv_path.is_none() => {
                bail!("source.kind = \"csv\" requires source.csv_path")
            }
            _ => {}
        }
        self.report.offset()?;
        Ok(())
    }

    /// API token, preferring the `SEMS_API_TOKEN` environment variable.
    pub fn api_token(&self) -> Option<String> {
        env::var("SEMS_API_TOKEN")
            .ok()
            .or_else(|| self.api.as_ref().and_then(|a| a.token.clone()))
    }

    /// Client for the `[api]` section, if there is one.
    pub fn api_client(&self) -> anyhow::Result<Option<ApiClient>> {
        let Some(api) = &self.api else {
            return Ok(None);
        };

        let token = self.api_token().unwrap_or_default();
        if token.is_empty() {
            tracing::warn!("no SEMS API token configured, requests will be unauthenticated");
        }

        let client = ApiClient::new(&api.base_url, token, Duration::from_millis(api.timeout_ms))?;
        Ok(Some(client))
    }
}
