//! Stock command implementation.
//!
//! Reports promisable stock for a device category on one facility
//! day, flagging categories below the configured threshold.

use chrono::NaiveDate;
use clap::Args;

use aula::assignment;

use crate::error::CliError;
use crate::utils::{load_configuration, open_database, today, GlobalOptions};

/// Check promisable stock for a device category.
#[derive(Args)]
pub struct StockCommand {
    /// Device category to check
    #[arg(value_name = "CATEGORY")]
    category: String,

    /// Day to check (defaults to today)
    #[arg(long, value_name = "DATE")]
    date: Option<NaiveDate>,

    /// Override the configured low-stock threshold
    #[arg(long, value_name = "N")]
    threshold: Option<u32>,
}

impl StockCommand {
    /// Execute the stock command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db = open_database(global, &config)?;
        let date = self.date.unwrap_or_else(today);
        let threshold = self.threshold.unwrap_or(config.stock.low_stock_threshold);

        let level = assignment::low_stock_check(&db, &self.category, date, threshold)?;
        if level.low {
            println!(
                "LOW: {} {}(s) promisable on {date} (threshold {})",
                level.available, level.category, level.threshold
            );
            return Err(CliError::Conflict(format!(
                "{} stock is below threshold",
                level.category
            )));
        }
        if !global.quiet {
            println!(
                "{} {}(s) promisable on {date}",
                level.available, level.category
            );
        }
        Ok(())
    }
}
