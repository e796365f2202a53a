use clap::Args;
use liftlog_core::Pipeline;
use serde_json::json;
use std::path::PathBuf;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Workout export to read
    pub input: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SummaryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(args.config.load()?)?;
    let run = pipeline.normalize_path(&args.input)?;
    let report = pipeline.aggregate(&run.sets);

    if args.json {
        let body = json!({
            "total_rows": run.total_rows,
            "kept": run.sets.len(),
            "skipped": run.skipped,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    print!("{}", pipeline.aggregator().render_report(&report));
    println!("\n{}", run.skip_summary());
    Ok(())
}
