//! Deployment configuration.
//!
//! Typed configuration loaded from a YAML file, with environment
//! variable overrides for the handful of knobs operators change per
//! deployment. Everything has a default; a missing file is a valid
//! deployment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::database::{resolve_database_path, DatabaseConfig};
use crate::error::{Error, Result};
use crate::pool::PoolConfig;

/// Default low-stock threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

/// Top-level deployment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseSection,
    /// Connection pool settings.
    #[serde(default)]
    pub pool: PoolSection,
    /// Facility day boundaries.
    #[serde(default)]
    pub facility: FacilitySection,
    /// Device stock settings.
    #[serde(default)]
    pub stock: StockSection,
}

/// Database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    /// Path to the database file. Defaults to the standard resolution
    /// (`AULA_DATA_DIR` or `~/.aula`).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Connection pool settings.
///
/// The tier shares describe how capacity is planned to split between
/// caller classes; only the `system` share has a mechanical effect, as
/// headroom reserved for [`crate::pool::PoolGuard::acquire_reserved`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSection {
    /// Total number of pooled connections.
    pub capacity: usize,
    /// In-use ratio at which the breaker opens.
    pub saturation_threshold: f64,
    /// First backoff delay in milliseconds.
    pub backoff_base_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub backoff_max_ms: u64,
    /// Retries after the first failed acquisition.
    pub max_retries: u32,
    /// Planned capacity split between caller classes.
    #[serde(default)]
    pub tiers: TierShares,
}

impl Default for PoolSection {
    fn default() -> Self {
        let defaults = PoolConfig::default();
        Self {
            capacity: defaults.capacity,
            saturation_threshold: defaults.saturation_threshold,
            backoff_base_ms: u64::try_from(defaults.backoff_base.as_millis()).unwrap_or(500),
            backoff_max_ms: u64::try_from(defaults.backoff_max.as_millis()).unwrap_or(5000),
            max_retries: defaults.max_retries,
            tiers: TierShares::default(),
        }
    }
}

/// Planned capacity shares per caller class. Must not sum above 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierShares {
    /// Interactive dashboard and form traffic.
    pub ui: f64,
    /// Background agents (notification and import jobs).
    pub agent: f64,
    /// Maintenance and administrative work; reserved as headroom.
    pub system: f64,
}

impl Default for TierShares {
    fn default() -> Self {
        Self {
            ui: 0.6,
            agent: 0.3,
            system: 0.1,
        }
    }
}

/// Facility day boundaries, `HH:MM`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilitySection {
    /// Start of the bookable day.
    pub day_start: String,
    /// End of the bookable day.
    pub day_end: String,
}

impl Default for FacilitySection {
    fn default() -> Self {
        Self {
            day_start: "07:30".into(),
            day_end: "16:30".into(),
        }
    }
}

/// Device stock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockSection {
    /// Promisable count below which a category is flagged low.
    pub low_stock_threshold: u32,
}

impl Default for StockSection {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

fn parse_day_bound(field: &'static str, text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| Error::validation(field, format!("'{text}' is not a valid HH:MM time")))
}

impl EngineConfig {
    /// Loads configuration from a YAML file, applying environment
    /// overrides and validating the result.
    ///
    /// When `path` is `None`, `AULA_CONFIG` is consulted; if that is
    /// unset too, defaults are used. An explicitly named file must
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unreadable or invalid
    /// files and [`Error::Validation`] for out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var("AULA_CONFIG").ok().map(PathBuf::from),
        };

        let mut config = match resolved {
            Some(file) => {
                let text = std::fs::read_to_string(&file).map_err(|e| Error::Configuration {
                    path: file.clone(),
                    message: format!("cannot read file: {e}"),
                })?;
                Self::from_yaml(&text).map_err(|e| match e {
                    Error::Validation { field, message } => Error::Configuration {
                        path: file.clone(),
                        message: format!("{field}: {message}"),
                    },
                    other => other,
                })?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from YAML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the YAML does not match the
    /// schema.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::validation("config", e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("AULA_POOL_CAPACITY") {
            self.pool.capacity = value.parse().map_err(|_| {
                Error::validation("AULA_POOL_CAPACITY", format!("'{value}' is not a number"))
            })?;
        }
        if let Ok(value) = std::env::var("AULA_LOW_STOCK_THRESHOLD") {
            self.stock.low_stock_threshold = value.parse().map_err(|_| {
                Error::validation(
                    "AULA_LOW_STOCK_THRESHOLD",
                    format!("'{value}' is not a number"),
                )
            })?;
        }
        Ok(())
    }

    /// Validates all sections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let shares = &self.pool.tiers;
        for (name, value) in [
            ("tiers.ui", shares.ui),
            ("tiers.agent", shares.agent),
            ("tiers.system", shares.system),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::validation(name, "must be within [0, 1]"));
            }
        }
        if shares.ui + shares.agent + shares.system > 1.0 + f64::EPSILON {
            return Err(Error::validation("tiers", "shares must not sum above 1"));
        }

        let (start, end) = self.day_bounds()?;
        if start >= end {
            return Err(Error::validation(
                "facility.day_start",
                "must be before facility.day_end",
            ));
        }

        self.pool_config().validate()
    }

    /// The facility day boundaries as times of day.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either bound is malformed.
    pub fn day_bounds(&self) -> Result<(NaiveTime, NaiveTime)> {
        Ok((
            parse_day_bound("facility.day_start", &self.facility.day_start)?,
            parse_day_bound("facility.day_end", &self.facility.day_end)?,
        ))
    }

    /// Builds the pool configuration.
    ///
    /// The `system` tier share is rounded down to whole connections
    /// and reserved as headroom.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let headroom = (self.pool.tiers.system * self.pool.capacity as f64).floor() as usize;
        PoolConfig {
            capacity: self.pool.capacity,
            saturation_threshold: self.pool.saturation_threshold,
            backoff_base: Duration::from_millis(self.pool.backoff_base_ms),
            backoff_max: Duration::from_millis(self.pool.backoff_max_ms),
            max_retries: self.pool.max_retries,
            reserved_headroom: headroom.min(self.pool.capacity.saturating_sub(1)),
        }
    }

    /// Builds the database configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is configured and the default
    /// location cannot be resolved.
    pub fn database_config(&self) -> Result<DatabaseConfig> {
        let path = match &self.database.path {
            Some(p) => p.clone(),
            None => resolve_database_path()?,
        };
        Ok(DatabaseConfig::new(path)
            .with_busy_timeout(Duration::from_millis(self.database.busy_timeout_ms)))
    }
}
