//! Init command implementation.
//!
//! Explicitly initializes the aula data directory and database.

use std::path::PathBuf;

use clap::Parser;

use aula::database::default_data_dir;
use aula::{Database, DatabaseConfig};

use crate::error::CliError;
use crate::utils::GlobalOptions;

/// Initialize the aula data directory and database.
#[derive(Parser)]
#[command(about = "Initialize the aula data directory and database")]
pub struct InitCommand {
    /// Data directory to initialize
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Overwrite an existing database
    #[arg(long)]
    overwrite: bool,
}

impl InitCommand {
    /// Execute the init command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // Priority: command flag > global flag > default
        let data_dir = self
            .data_dir
            .or_else(|| global.data_dir.clone())
            .or_else(|| default_data_dir().ok())
            .ok_or_else(|| {
                CliError::Config(
                    "Could not determine data directory (home directory not found)".to_string(),
                )
            })?;

        let db_path = data_dir.join("aula.db");
        if db_path.exists() {
            if self.overwrite {
                std::fs::remove_file(&db_path)?;
            } else {
                return Err(CliError::InvalidArguments(format!(
                    "database already exists (use --overwrite to replace): {}",
                    db_path.display()
                )));
            }
        }

        Database::open(DatabaseConfig::new(&db_path))?;

        if !global.quiet {
            println!("Initialized aula database: {}", db_path.display());
        }
        Ok(())
    }
}
