//! Utility functions for CLI operations.
//!
//! Shared helpers for configuration loading, database access, time
//! range parsing, and output formatting.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime, Utc};

use aula::{Database, DatabaseConfig, EngineConfig, TimeRange};

use crate::error::CliError;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Enable verbose output.
    #[allow(dead_code)]
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,

    /// Explicit configuration file.
    pub config_file: Option<PathBuf>,

    /// Fail instead of creating a missing database.
    pub no_auto_init: bool,
}

/// Load deployment configuration.
pub fn load_configuration(global: &GlobalOptions) -> Result<EngineConfig, CliError> {
    EngineConfig::load(global.config_file.as_deref()).map_err(|e| CliError::Config(e.to_string()))
}

/// Resolve the database path from global options.
pub fn resolve_database_path(
    global: &GlobalOptions,
    config: &EngineConfig,
) -> Result<PathBuf, CliError> {
    if let Some(ref data_dir) = global.data_dir {
        return Ok(data_dir.join("aula.db"));
    }
    config
        .database_config()
        .map(|db| db.path)
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Open the database, honoring `--no-auto-init`.
pub fn open_database(global: &GlobalOptions, config: &EngineConfig) -> Result<Database, CliError> {
    let db_path = resolve_database_path(global, config)?;

    if !db_path.exists() && global.no_auto_init {
        return Err(CliError::NoDatabase);
    }

    let db_config = DatabaseConfig::new(db_path).with_busy_timeout(
        std::time::Duration::from_millis(config.database.busy_timeout_ms),
    );
    Database::open(db_config).map_err(CliError::from)
}

/// Parse a `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_time(text: &str) -> Result<NaiveTime, CliError> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| CliError::InvalidArguments(format!("'{text}' is not a valid HH:MM time")))
}

/// Build an occupancy range from CLI date and time arguments.
///
/// Missing times fall back to the configured facility day bounds, and
/// a missing end date means a single-day range.
pub fn parse_period(
    config: &EngineConfig,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> Result<TimeRange, CliError> {
    let (day_start, day_end) = config
        .day_bounds()
        .map_err(|e| CliError::Config(e.to_string()))?;
    let start = match start_time {
        Some(text) => parse_time(text)?,
        None => day_start,
    };
    let end = match end_time {
        Some(text) => parse_time(text)?,
        None => day_end,
    };
    TimeRange::from_dates_with_hours(start_date, end_date.unwrap_or(start_date), start, end)
        .map_err(|e| CliError::InvalidArguments(e.to_string()))
}

/// Resolve a room argument, accepting a row id or a room name.
pub fn resolve_room(db: &Database, reference: &str) -> Result<aula::Room, CliError> {
    let found = match reference.parse::<i64>() {
        Ok(id) => db.room(id).map_err(CliError::from)?,
        Err(_) => db.room_by_name(reference).map_err(CliError::from)?,
    };
    found.ok_or_else(|| CliError::InvalidArguments(format!("no room matches '{reference}'")))
}

/// Resolve a device argument, accepting a row id or a serial number.
pub fn resolve_device(db: &Database, reference: &str) -> Result<aula::Device, CliError> {
    let found = match reference.parse::<i64>() {
        Ok(id) => db.device(id).map_err(CliError::from)?,
        Err(_) => db.device_by_serial(reference).map_err(CliError::from)?,
    };
    found.ok_or_else(|| CliError::InvalidArguments(format!("no device matches '{reference}'")))
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format a range for table output.
pub fn format_period(period: &TimeRange) -> String {
    format!(
        "{} .. {}",
        period.start().format("%Y-%m-%d %H:%M"),
        period.end().format("%Y-%m-%d %H:%M")
    )
}
