//! Weekly training volume and session frequency.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{WeightUnit, WorkoutSet};

/// Volume and frequency for one anchored week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// First day of the week (the anchor weekday)
    pub week_start_date: NaiveDate,
    /// Sum of weight x reps in the report's output unit
    pub total_volume: f64,
    /// Distinct training days in the week
    pub session_count: u32,
}

/// Most recent `anchor` weekday on or before `date`.
pub fn week_start(date: NaiveDate, anchor: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - anchor.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}

/// Chronological weekly summaries.
pub fn weekly_summaries(
    sets: &[WorkoutSet],
    anchor: Weekday,
    unit: WeightUnit,
) -> Vec<WeeklySummary> {
    let mut weeks: BTreeMap<NaiveDate, (f64, BTreeSet<NaiveDate>)> = BTreeMap::new();
    for set in sets {
        let entry = weeks.entry(week_start(set.date, anchor)).or_default();
        entry.0 += set.volume_in(unit);
        entry.1.insert(set.date);
    }

    weeks
        .into_iter()
        .map(|(week_start_date, (total_volume, days))| WeeklySummary {
            week_start_date,
            total_volume,
            session_count: days.len() as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set(date: NaiveDate, weight: f64, unit: WeightUnit, reps: u32) -> WorkoutSet {
        WorkoutSet {
            exercise_name: "Squat".to_string(),
            date,
            weight,
            unit,
            reps,
            duration_min: None,
        }
    }

    #[test]
    fn monday_starts_a_new_week() {
        // 2024-01-01 is a Monday, 2023-12-31 a Sunday
        assert_eq!(week_start(ymd(2024, 1, 1), Weekday::Mon), ymd(2024, 1, 1));
        assert_eq!(week_start(ymd(2023, 12, 31), Weekday::Mon), ymd(2023, 12, 25));
        assert_eq!(week_start(ymd(2024, 1, 7), Weekday::Mon), ymd(2024, 1, 1));
    }

    #[test]
    fn sunday_anchor() {
        assert_eq!(week_start(ymd(2023, 12, 31), Weekday::Sun), ymd(2023, 12, 31));
        assert_eq!(week_start(ymd(2024, 1, 6), Weekday::Sun), ymd(2023, 12, 31));
        assert_eq!(week_start(ymd(2024, 1, 7), Weekday::Sun), ymd(2024, 1, 7));
    }

    #[test]
    fn sunday_and_monday_land_in_different_weeks() {
        let sets = vec![
            set(ymd(2023, 12, 31), 100.0, WeightUnit::Kg, 5),
            set(ymd(2024, 1, 1), 100.0, WeightUnit::Kg, 3),
        ];
        let weeks = weekly_summaries(&sets, Weekday::Mon, WeightUnit::Kg);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start_date, ymd(2023, 12, 25));
        assert_eq!(weeks[0].total_volume, 500.0);
        assert_eq!(weeks[1].week_start_date, ymd(2024, 1, 1));
        assert_eq!(weeks[1].total_volume, 300.0);
    }

    #[test]
    fn sessions_count_distinct_days() {
        let sets = vec![
            set(ymd(2024, 1, 3), 50.0, WeightUnit::Kg, 10),
            set(ymd(2024, 1, 1), 50.0, WeightUnit::Kg, 10),
            set(ymd(2024, 1, 1), 60.0, WeightUnit::Kg, 8),
        ];
        let weeks = weekly_summaries(&sets, Weekday::Mon, WeightUnit::Kg);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].session_count, 2);
        assert_eq!(weeks[0].total_volume, 500.0 + 500.0 + 480.0);
    }

    #[test]
    fn mixed_units_are_converted_before_summing() {
        let sets = vec![
            set(ymd(2024, 1, 1), 100.0, WeightUnit::Kg, 1),
            set(ymd(2024, 1, 2), 220.462, WeightUnit::Lb, 1),
        ];
        let kg = weekly_summaries(&sets, Weekday::Mon, WeightUnit::Kg);
        assert!((kg[0].total_volume - 200.0).abs() < 1e-9);
        let lb = weekly_summaries(&sets, Weekday::Mon, WeightUnit::Lb);
        assert!((lb[0].total_volume - 440.924).abs() < 1e-9);
    }

    #[test]
    fn weeks_are_chronological_regardless_of_input_order() {
        let sets = vec![
            set(ymd(2024, 2, 14), 10.0, WeightUnit::Kg, 1),
            set(ymd(2024, 1, 2), 10.0, WeightUnit::Kg, 1),
            set(ymd(2024, 1, 20), 10.0, WeightUnit::Kg, 1),
        ];
        let starts: Vec<NaiveDate> = weekly_summaries(&sets, Weekday::Mon, WeightUnit::Kg)
            .into_iter()
            .map(|w| w.week_start_date)
            .collect();
        assert_eq!(starts, vec![ymd(2024, 1, 1), ymd(2024, 1, 15), ymd(2024, 2, 12)]);
    }
}
