//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default so a partial (or missing) file still yields
//! a runnable server; `validate` rejects values the engine cannot run with.

use anyhow::{bail, Context, Result};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::types::round2;

/// Keeps `wager * multiplier` far inside `Decimal` range.
const MAX_WAGER_LIMIT: Decimal = dec!(1000000000000000);

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// When the crash point of the current round may be shown to callers.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrashPointDisclosure {
    /// Hidden until the round has crashed.
    #[default]
    OnSettle,
    /// Returned by the start response and every state read.
    Always,
}

/// Round engine tuning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    /// Per-tick multiplier growth (1.01 = +1% per tick).
    pub growth_factor: f64,
    pub history_capacity: usize,
    pub default_wager: f64,
    /// Largest wager a round accepts. Larger requests fall back to the default.
    pub max_wager: f64,
    pub crash_point_disclosure: CrashPointDisclosure,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            growth_factor: 1.01,
            history_capacity: 10,
            default_wager: 10.0,
            max_wager: 1_000_000.0,
            crash_point_disclosure: CrashPointDisclosure::OnSettle,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Growth factor as a decimal, trimmed of float noise.
    pub fn growth_decimal(&self) -> Decimal {
        Decimal::from_f64(self.growth_factor)
            .map(|d| d.round_dp(6))
            .unwrap_or(Decimal::ONE)
    }

    pub fn default_wager_decimal(&self) -> Decimal {
        Decimal::from_f64(self.default_wager)
            .map(|d| d.round_dp(2))
            .unwrap_or(Decimal::TEN)
    }

    pub fn max_wager_decimal(&self) -> Decimal {
        Decimal::from_f64(self.max_wager)
            .map(|d| d.round_dp(2))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            bail!("engine.tick_interval_ms must be greater than zero");
        }
        // The first tick from 1.00x must move the two-decimal multiplier.
        if !self.growth_factor.is_finite() || round2(self.growth_decimal()) <= Decimal::ONE {
            bail!(
                "engine.growth_factor must be at least 1.005 (got {})",
                self.growth_factor
            );
        }
        if self.history_capacity == 0 {
            bail!("engine.history_capacity must be at least 1");
        }
        if !self.default_wager.is_finite() || self.default_wager_decimal() <= Decimal::ZERO {
            bail!(
                "engine.default_wager must be positive (got {})",
                self.default_wager
            );
        }
        let max_wager = self.max_wager_decimal();
        if !self.max_wager.is_finite() || max_wager < self.default_wager_decimal() {
            bail!(
                "engine.max_wager must be at least engine.default_wager (got {})",
                self.max_wager
            );
        }
        if max_wager > MAX_WAGER_LIMIT {
            bail!(
                "engine.max_wager must not exceed {MAX_WAGER_LIMIT} (got {})",
                self.max_wager
            );
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()
    }
}
