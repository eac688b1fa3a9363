//! Run configuration. Everything the lookups need is carried explicitly in [AuditConfig] and
//! [UsageWindow] instead of living in globals.

use std::{fmt::Debug, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::{Days, NaiveDate};
use reqwest::Url;

use crate::utils::{clock::Clock, time::date_to_query_name};

pub const DEFAULT_APPLICATION: &str = "Docker.app";
pub const DEFAULT_WINDOW_DAYS: u32 = 365;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Clone)]
pub struct AuditConfig {
    /// Root of the classic API, e.g. `https://example.jamfcloud.com/JSSResource/`.
    pub api_base: Url,
    /// Bearer token sent with every request.
    pub credential: String,
    /// Application name as reported by inventory, e.g. `Docker.app`.
    pub target_app: String,
    pub window_days: u32,
    /// Maximum number of usage requests in flight.
    pub concurrency: usize,
    /// [None] waits forever.
    pub timeout: Option<Duration>,
}

impl AuditConfig {
    pub fn new(
        api_base: &str,
        credential: impl Into<String>,
        target_app: impl Into<String>,
        window_days: u32,
    ) -> Result<Self> {
        let config = Self {
            api_base: parse_api_base(api_base)?,
            credential: credential.into(),
            target_app: target_app.into(),
            window_days,
            concurrency: 1,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_concurrency(self, concurrency: usize) -> Result<Self> {
        let config = Self {
            concurrency,
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    fn validate(&self) -> Result<()> {
        if self.target_app.trim().is_empty() {
            bail!("Application name can't be empty");
        }
        if self.credential.is_empty() {
            bail!("API token can't be empty");
        }
        if self.window_days == 0 {
            bail!("Usage window should be at least 1 day");
        }
        if self.concurrency == 0 {
            bail!("Concurrency should be at least 1");
        }
        Ok(())
    }
}

impl Debug for AuditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditConfig")
            .field("api_base", &self.api_base.as_str())
            .field("credential", &"<redacted>")
            .field("target_app", &self.target_app)
            .field("window_days", &self.window_days)
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_api_base(value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| anyhow!("Invalid API url {value}: {e}"))?;
    if url.cannot_be_a_base() {
        bail!("API url {value} can't be used as a base for requests");
    }
    Ok(url)
}

/// Inclusive range of days usage is requested for. Computed once per run so every device is
/// queried with the same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
}

impl UsageWindow {
    pub fn ending_on(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(days.into()))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end, days }
    }

    pub fn from_clock(clock: &impl Clock, days: u32) -> Self {
        Self::ending_on(clock.today(), days)
    }

    /// Range in the form the usage endpoint expects: `2024-01-01_2024-12-31`.
    pub fn to_query_segment(&self) -> String {
        format!(
            "{}_{}",
            date_to_query_name(self.start),
            date_to_query_name(self.end)
        )
    }
}
