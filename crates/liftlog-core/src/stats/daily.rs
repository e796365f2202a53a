//! Per-day training totals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{WeightUnit, WorkoutSet};

/// Totals for one training day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_volume: f64,
    pub set_count: u32,
    pub total_reps: u64,
    /// Distinct normalized exercise names
    pub exercise_count: u32,
    /// Longest workout duration logged that day, in minutes. Exports repeat
    /// the workout's duration on each of its sets.
    pub duration_min: Option<f64>,
}

#[derive(Default)]
struct DayTotals {
    volume: f64,
    sets: u32,
    reps: u64,
    exercises: BTreeSet<String>,
    duration: Option<f64>,
}

/// Chronological per-day summaries.
pub fn daily_summaries(sets: &[WorkoutSet], unit: WeightUnit) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for set in sets {
        let day = days.entry(set.date).or_default();
        day.volume += set.volume_in(unit);
        day.sets += 1;
        day.reps += u64::from(set.reps);
        day.exercises.insert(set.exercise_key());
        if let Some(minutes) = set.duration_min {
            day.duration = Some(day.duration.map_or(minutes, |d| d.max(minutes)));
        }
    }

    days.into_iter()
        .map(|(date, day)| DailySummary {
            date,
            total_volume: day.volume,
            set_count: day.sets,
            total_reps: day.reps,
            exercise_count: day.exercises.len() as u32,
            duration_min: day.duration,
        })
        .collect()
}
