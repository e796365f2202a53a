//! Per-exercise lifetime totals and personal records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{WeightUnit, WorkoutSet};

/// Relative tolerance for treating two converted weights as equal.
const WEIGHT_EPSILON: f64 = 1e-9;

/// Lifetime statistics for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLifetimeStat {
    /// Normalized grouping key (lowercase, single-spaced)
    pub exercise_name: String,
    /// First spelling seen in the input
    pub display_name: String,
    /// Sum of weight x reps in the report's output unit
    pub lifetime_volume: f64,
    pub set_count: u32,
    pub total_reps: u64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Heaviest set; ties go to more reps, then the earlier date
    pub personal_record: WorkoutSet,
    /// Best Epley estimate across all sets, in the output unit
    pub estimated_one_rep_max: f64,
    /// Heaviest weight lifted, in the output unit
    pub best_weight: f64,
    /// Most reps in a single set, at any weight
    pub best_reps: u32,
}

/// Epley one-rep max estimate: `weight * (1 + reps / 30)`.
pub fn epley_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps == 0 {
        return 0.0;
    }
    weight * (1.0 + f64::from(reps) / 30.0)
}

fn compare_weight(a: f64, b: f64) -> Ordering {
    if (a - b).abs() <= WEIGHT_EPSILON * a.abs().max(b.abs()).max(1.0) {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Whether `candidate` beats the current record `best`. Earlier input wins
/// a full tie, so the result does not depend on hash or sort order.
pub fn is_better_record(candidate: &WorkoutSet, best: &WorkoutSet) -> bool {
    let by_weight = compare_weight(
        candidate.weight_in(WeightUnit::Kg),
        best.weight_in(WeightUnit::Kg),
    );
    by_weight
        .then_with(|| candidate.reps.cmp(&best.reps))
        .then_with(|| best.date.cmp(&candidate.date))
        == Ordering::Greater
}

/// Lifetime stats keyed by normalized exercise name.
pub fn exercise_stats(
    sets: &[WorkoutSet],
    unit: WeightUnit,
) -> BTreeMap<String, ExerciseLifetimeStat> {
    let mut stats: BTreeMap<String, ExerciseLifetimeStat> = BTreeMap::new();

    for set in sets {
        let volume = set.volume_in(unit);
        let one_rep_max = epley_one_rep_max(set.weight_in(unit), set.reps);

        match stats.get_mut(&set.exercise_key()) {
            Some(stat) => {
                stat.lifetime_volume += volume;
                stat.set_count += 1;
                stat.total_reps += u64::from(set.reps);
                stat.first_date = stat.first_date.min(set.date);
                stat.last_date = stat.last_date.max(set.date);
                stat.estimated_one_rep_max = stat.estimated_one_rep_max.max(one_rep_max);
                stat.best_weight = stat.best_weight.max(set.weight_in(unit));
                stat.best_reps = stat.best_reps.max(set.reps);
                if is_better_record(set, &stat.personal_record) {
                    stat.personal_record = set.clone();
                }
            }
            None => {
                let key = set.exercise_key();
                stats.insert(
                    key.clone(),
                    ExerciseLifetimeStat {
                        exercise_name: key,
                        display_name: set.exercise_name.clone(),
                        lifetime_volume: volume,
                        set_count: 1,
                        total_reps: u64::from(set.reps),
                        first_date: set.date,
                        last_date: set.date,
                        personal_record: set.clone(),
                        estimated_one_rep_max: one_rep_max,
                        best_weight: set.weight_in(unit),
                        best_reps: set.reps,
                    },
                );
            }
        }
    }

    stats
}

/// Exercises ranked by best estimated one-rep max, highest first. Equal
/// estimates keep name order.
pub fn rank_by_one_rep_max(
    stats: &BTreeMap<String, ExerciseLifetimeStat>,
) -> Vec<&ExerciseLifetimeStat> {
    let mut ranked: Vec<&ExerciseLifetimeStat> = stats.values().collect();
    ranked.sort_by(|a, b| b.estimated_one_rep_max.total_cmp(&a.estimated_one_rep_max));
    ranked
}
