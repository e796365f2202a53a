use clap::Args;
use liftlog_core::{OutputPaths, Pipeline};
use std::path::PathBuf;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Workout export to read
    pub input: PathBuf,
    /// Cleaned per-set output file
    #[arg(long)]
    pub out: PathBuf,
    /// Weekly volume and session count output
    #[arg(long)]
    pub weekly_out: Option<PathBuf>,
    /// Per-day totals output
    #[arg(long)]
    pub daily_out: Option<PathBuf>,
    /// Per-day, per-exercise breakdown output
    #[arg(long)]
    pub sessions_out: Option<PathBuf>,
    /// Per-exercise lifetime stats and personal records output
    #[arg(long)]
    pub exercises_out: Option<PathBuf>,
    /// Exercises ranked by estimated one-rep max
    #[arg(long)]
    pub records_out: Option<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ProcessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(args.config.load()?)?;
    let outputs = OutputPaths {
        sets: args.out,
        weekly: args.weekly_out,
        daily: args.daily_out,
        sessions: args.sessions_out,
        exercises: args.exercises_out,
        records: args.records_out,
    };

    let summary = pipeline.run(&args.input, &outputs)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", summary.skip_summary());
    for skipped in &summary.skipped {
        println!("  line {}: {}: {}", skipped.line, skipped.field, skipped.reason);
    }
    for path in &summary.written {
        println!("wrote {}", path.display());
    }
    Ok(())
}
