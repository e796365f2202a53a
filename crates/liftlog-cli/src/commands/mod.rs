pub mod config;
pub mod process;
pub mod summary;

use clap::Args;
use liftlog_core::{Config, WeekStart, WeightUnit};
use std::path::PathBuf;

/// Flags shared by every command that runs the pipeline.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config file to use instead of ~/.config/liftlog/config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Weekday that starts a training week (e.g. Mon, sun)
    #[arg(long)]
    pub week_start: Option<WeekStart>,
    /// Unit for rows without a unit column (kg or lb)
    #[arg(long)]
    pub default_unit: Option<WeightUnit>,
    /// Unit for volumes and summaries (kg or lb)
    #[arg(long)]
    pub output_unit: Option<WeightUnit>,
    /// Accepted date format, repeatable; replaces the configured list
    #[arg(long = "date-format")]
    pub date_formats: Vec<String>,
    /// Field delimiter; sniffed from the header when unset
    #[arg(long)]
    pub delimiter: Option<char>,
}

impl ConfigArgs {
    /// Load the config file and apply command-line overrides on top.
    pub fn load(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(day) = self.week_start {
            config.week_start_weekday = day;
        }
        if let Some(unit) = self.default_unit {
            config.default_unit = unit;
        }
        if let Some(unit) = self.output_unit {
            config.output_unit = unit;
        }
        if !self.date_formats.is_empty() {
            config.date_formats = self.date_formats.clone();
        }
        if self.delimiter.is_some() {
            config.delimiter = self.delimiter;
        }
        config.validate()?;
        Ok(config)
    }
}
