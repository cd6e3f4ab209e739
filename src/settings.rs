// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![allow(clippy::shadow_reuse)]

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";
pub const ENV_PREFIX: &str = "TLD_SCRAPER";

const DEFAULT_USER_AGENT: &str = "tld-scraper github.com/iop-alliance/tld-scraper";
const DEFAULT_RETRIES: u32 = 4;
/// One minute; with a backoff base of 3,
/// this results in delays of 1, 3, 9 and 27 minutes.
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 60_000;
const DEFAULT_AGREEMENT_CONCURRENCY: usize = 5;

const DEFAULT_ROOT_ZONE_URL: &str = "https://www.internic.net/domain/root.zone";
const DEFAULT_IANA_URL: &str = "https://www.iana.org/domains/root/db";
const DEFAULT_AGREEMENT_BASE_URL: &str = "https://www.icann.org/en/registry-agreements/details";
const DEFAULT_STATUS_PERIODS_URL: &str = "https://newgtlds.icann.org/sites/default/files/sunrise-claims-periods/sunrise-claims-periods.xlsx";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load the basic/low-level configuration data: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid setting '{0}': {1}")]
    Invalid(&'static str, String),
}

fn parse_default_url(url: &str) -> Url {
    Url::parse(url).unwrap_or_else(|err| panic!("Invalid built-in URL '{url}': {err}"))
}

fn default_root_zone_url() -> Url {
    parse_default_url(DEFAULT_ROOT_ZONE_URL)
}

fn default_iana_url() -> Url {
    parse_default_url(DEFAULT_IANA_URL)
}

fn default_agreement_base_url() -> Url {
    parse_default_url(DEFAULT_AGREEMENT_BASE_URL)
}

fn default_status_periods_url() -> Url {
    parse_default_url(DEFAULT_STATUS_PERIODS_URL)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

const fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

const fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

const fn default_agreement_concurrency() -> usize {
    DEFAULT_AGREEMENT_CONCURRENCY
}

/// Where to fetch the upstream documents from.
#[derive(Serialize, Deserialize, Debug, Clone, TypedBuilder)]
pub struct Sources {
    /// DNS root zone transfer (plain text).
    #[serde(default = "default_root_zone_url")]
    #[builder(default = default_root_zone_url())]
    pub root_zone_url: Url,
    /// IANA root zone database (HTML).
    #[serde(default = "default_iana_url")]
    #[builder(default = default_iana_url())]
    pub iana_url: Url,
    /// Base of the ICANN per-gTLD registry agreement landing pages;
    /// the (ASCII) gTLD is appended as the last path segment.
    #[serde(default = "default_agreement_base_url")]
    #[builder(default = default_agreement_base_url())]
    pub agreement_base_url: Url,
    /// ICANN sunrise/claims periods export (HTML, despite its extension).
    #[serde(default = "default_status_periods_url")]
    #[builder(default = default_status_periods_url())]
    pub status_periods_url: Url,
}

impl Default for Sources {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, TypedBuilder)]
pub struct Settings {
    #[serde(default = "default_user_agent")]
    #[builder(default = default_user_agent())]
    pub user_agent: String,
    /// Number of retries for a single fetch.
    #[serde(default = "default_retries")]
    #[builder(default = DEFAULT_RETRIES)]
    pub retries: u32,
    /// Delay before the first retry in milliseconds (ms);
    /// each further retry waits three times as long as the previous one.
    #[serde(default = "default_retry_base_delay_ms")]
    #[builder(default = DEFAULT_RETRY_BASE_DELAY_MS)]
    pub retry_base_delay_ms: u64,
    /// Total timeout per request in milliseconds (ms)
    #[serde(default)]
    #[builder(default)]
    pub timeout_ms: Option<u64>,
    /// Minimal time between two requests in milliseconds (ms)
    #[serde(default)]
    #[builder(default)]
    pub min_request_interval_ms: Option<u64>,
    /// Maximum number of registry agreement lookups running at the same time.
    #[serde(default = "default_agreement_concurrency")]
    #[builder(default = DEFAULT_AGREEMENT_CONCURRENCY)]
    pub agreement_concurrency: usize,
    #[serde(default)]
    #[builder(default)]
    pub sources: Sources,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Settings {
    /// # Errors
    ///
    /// - a setting has a value that can not work
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.agreement_concurrency == 0 {
            return Err(SettingsError::Invalid(
                "agreement_concurrency",
                "has to be at least 1".to_owned(),
            ));
        }
        if self.sources.agreement_base_url.cannot_be_a_base() {
            return Err(SettingsError::Invalid(
                "sources.agreement_base_url",
                format!("'{}' can not be a base URL", self.sources.agreement_base_url),
            ));
        }
        Ok(self)
    }
}

/// Loads the settings, with increasing precedence from:
///
/// 1. built-in defaults
/// 2. the config file (optional; YAML, TOML or JSON)
/// 3. environment variables, e.g. `TLD_SCRAPER_RETRIES=2`
///    or `TLD_SCRAPER_SOURCES__IANA_URL=...`
///
/// # Errors
///
/// - the config loader fails to build
/// - settings failed to load and deserialize
/// - settings are invalid
pub fn load(config_file: Option<&str>) -> Result<Settings, SettingsError> {
    let (config_file, required) = match config_file {
        Some(config_file) => (config_file, true),
        None => (DEFAULT_CONFIG_FILE, false),
    };
    let settings_loader = Config::builder()
        .add_source(config::File::with_name(config_file).required(required))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings_loader.try_deserialize::<Settings>()?;

    tracing::debug!("{settings:#?}");

    settings.validate()
}
