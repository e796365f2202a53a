//! Statistics module for liftlog
//!
//! This module aggregates normalized sets into weekly volume and frequency,
//! per-day totals, a per-day breakdown by exercise, and per-exercise
//! lifetime volume with personal records.
//! All groupings use ordered maps, so identical input always produces
//! identical output.

mod daily;
mod exercise;
mod session;
mod weekly;

pub use daily::{daily_summaries, DailySummary};
pub use exercise::{
    epley_one_rep_max, exercise_stats, is_better_record, rank_by_one_rep_max,
    ExerciseLifetimeStat,
};
pub use session::{exercise_sessions, ExerciseSession};
pub use weekly::{week_start, weekly_summaries, WeeklySummary};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{WeightUnit, WorkoutSet};
use crate::storage::Config;

/// Everything computed from one run's sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Unit of every volume and weight figure in the report
    pub output_unit: WeightUnit,
    /// Chronological weekly summaries
    pub weekly: Vec<WeeklySummary>,
    /// Chronological daily summaries
    pub daily: Vec<DailySummary>,
    /// Per-day, per-exercise breakdown ordered by date then name
    pub sessions: Vec<ExerciseSession>,
    /// Normalized exercise name -> lifetime stats
    pub exercises: BTreeMap<String, ExerciseLifetimeStat>,
}

impl AggregateReport {
    /// Sum of all weekly volumes.
    pub fn total_volume(&self) -> f64 {
        self.weekly.iter().map(|w| w.total_volume).sum()
    }

    /// Exercises by best estimated one-rep max, highest first.
    pub fn one_rep_max_ranking(&self) -> Vec<&ExerciseLifetimeStat> {
        rank_by_one_rep_max(&self.exercises)
    }
}

/// Computes an [`AggregateReport`] for a fixed anchor weekday and unit.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    pub week_start: Weekday,
    pub output_unit: WeightUnit,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Aggregator {
    pub fn new(config: &Config) -> Self {
        Self {
            week_start: config.week_start_weekday.weekday(),
            output_unit: config.output_unit,
        }
    }

    pub fn aggregate(&self, sets: &[WorkoutSet]) -> AggregateReport {
        AggregateReport {
            output_unit: self.output_unit,
            weekly: weekly_summaries(sets, self.week_start, self.output_unit),
            daily: daily_summaries(sets, self.output_unit),
            sessions: exercise_sessions(sets, self.output_unit),
            exercises: exercise_stats(sets, self.output_unit),
        }
    }

    /// Render a plain-text report.
    pub fn render_report(&self, report: &AggregateReport) -> String {
        let unit = report.output_unit;
        let mut output = String::new();
        output.push_str("\nWeekly Volume\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');

        if report.weekly.is_empty() {
            output.push_str("No data available.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<12} {:>16} {:>10}\n",
            "Week", "Volume", "Sessions"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for week in &report.weekly {
            output.push_str(&format!(
                "{:<12} {:>13.1} {} {:>10}\n",
                week.week_start_date, week.total_volume, unit, week.session_count
            ));
        }

        output.push_str("\nPersonal Records\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>12} {:>5} {:>12} {:>10}\n",
            "Exercise", "Weight", "Reps", "Date", "Est. 1RM"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for stat in report.exercises.values() {
            let pr = &stat.personal_record;
            output.push_str(&format!(
                "{:<24} {:>9.1} {} {:>5} {:>12} {:>7.1} {}\n",
                truncate(&stat.display_name, 24),
                pr.weight,
                pr.unit,
                pr.reps,
                pr.date,
                stat.estimated_one_rep_max,
                unit
            ));
        }

        output.push_str("\nTop Estimated 1RMs\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{:<4} {:<24} {:>12} {:>12} {:>5}\n",
            "#", "Exercise", "Est. 1RM", "Best", "Reps"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for (rank, stat) in report
            .one_rep_max_ranking()
            .into_iter()
            .take(TOP_ONE_REP_MAX_ROWS)
            .enumerate()
        {
            output.push_str(&format!(
                "{:<4} {:<24} {:>9.1} {} {:>9.1} {} {:>5}\n",
                rank + 1,
                truncate(&stat.display_name, 24),
                stat.estimated_one_rep_max,
                unit,
                stat.best_weight,
                unit,
                stat.best_reps
            ));
        }

        output
    }
}

/// Rows shown in the plain-text one-rep max table.
const TOP_ONE_REP_MAX_ROWS: usize = 20;

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
