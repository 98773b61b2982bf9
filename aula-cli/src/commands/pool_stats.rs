//! Pool-stats command implementation.
//!
//! Opens a pool with the configured sizing and reports its snapshot.
//! Useful as a smoke check that the configuration and database are
//! both usable.

use clap::Args;

use aula::pool::PoolGuard;
use aula::DatabaseConfig;

use crate::error::CliError;
use crate::utils::{load_configuration, resolve_database_path, GlobalOptions};

/// Show connection pool statistics.
#[derive(Args)]
pub struct PoolStatsCommand {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl PoolStatsCommand {
    /// Execute the pool-stats command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let db_path = resolve_database_path(global, &config)?;
        if !db_path.exists() && global.no_auto_init {
            return Err(CliError::NoDatabase);
        }

        let pool = PoolGuard::new(config.pool_config(), DatabaseConfig::new(db_path))?;
        let stats = pool.stats();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats)
                    .map_err(|e| CliError::Config(e.to_string()))?
            );
        } else {
            println!("capacity:     {}", stats.capacity);
            println!("in use:       {}", stats.in_use);
            println!("idle:         {}", stats.idle);
            println!("saturation:   {:.2}", stats.saturation);
            println!("breaker open: {}", stats.breaker_open);
        }
        Ok(())
    }
}
