//! Per-day, per-exercise breakdown.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{WeightUnit, WorkoutSet};

/// What was done for one exercise on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    pub date: NaiveDate,
    /// Normalized grouping key
    pub exercise_name: String,
    /// First spelling seen that day
    pub display_name: String,
    /// Heaviest set of the day, in the output unit
    pub top_set_weight: f64,
    pub set_count: u32,
    pub total_reps: u64,
    pub volume: f64,
}

/// Sessions ordered by date, then normalized exercise name.
pub fn exercise_sessions(sets: &[WorkoutSet], unit: WeightUnit) -> Vec<ExerciseSession> {
    let mut sessions: BTreeMap<(NaiveDate, String), ExerciseSession> = BTreeMap::new();

    for set in sets {
        let key = (set.date, set.exercise_key());
        let weight = set.weight_in(unit);
        match sessions.get_mut(&key) {
            Some(session) => {
                session.top_set_weight = session.top_set_weight.max(weight);
                session.set_count += 1;
                session.total_reps += u64::from(set.reps);
                session.volume += set.volume_in(unit);
            }
            None => {
                let session = ExerciseSession {
                    date: set.date,
                    exercise_name: key.1.clone(),
                    display_name: set.exercise_name.clone(),
                    top_set_weight: weight,
                    set_count: 1,
                    total_reps: u64::from(set.reps),
                    volume: set.volume_in(unit),
                };
                sessions.insert(key, session);
            }
        }
    }

    sessions.into_values().collect()
}
