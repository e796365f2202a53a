//! Canonical workout types shared by every pipeline stage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationReason;

/// Pounds per kilogram.
pub const LB_PER_KG: f64 = 2.20462;

/// Unit a weight is recorded or reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    /// Convert `value` expressed in `self` into `target`.
    pub fn convert(self, value: f64, target: WeightUnit) -> f64 {
        match (self, target) {
            (WeightUnit::Kg, WeightUnit::Lb) => value * LB_PER_KG,
            (WeightUnit::Lb, WeightUnit::Kg) => value / LB_PER_KG,
            _ => value,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightUnit {
    type Err = ValidationReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Lb),
            _ => Err(ValidationReason::UnknownUnit(s.trim().to_string())),
        }
    }
}

/// Fields of a [`WorkoutSet`] that export columns can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ExerciseName,
    Date,
    Weight,
    Unit,
    Reps,
    Duration,
}

impl CanonicalField {
    /// Fields every export must provide a column for.
    pub const REQUIRED: [CanonicalField; 4] = [
        CanonicalField::ExerciseName,
        CanonicalField::Date,
        CanonicalField::Weight,
        CanonicalField::Reps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::ExerciseName => "exercise_name",
            CanonicalField::Date => "date",
            CanonicalField::Weight => "weight",
            CanonicalField::Unit => "unit",
            CanonicalField::Reps => "reps",
            CanonicalField::Duration => "duration",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated, logged set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub exercise_name: String,
    pub date: NaiveDate,
    pub weight: f64,
    pub unit: WeightUnit,
    pub reps: u32,
    /// Length of the workout this set belongs to, in minutes
    #[serde(default)]
    pub duration_min: Option<f64>,
}

impl WorkoutSet {
    pub fn weight_in(&self, unit: WeightUnit) -> f64 {
        self.unit.convert(self.weight, unit)
    }

    /// weight x reps, expressed in `unit`.
    pub fn volume_in(&self, unit: WeightUnit) -> f64 {
        self.weight_in(unit) * f64::from(self.reps)
    }

    /// Grouping key for this set's exercise.
    pub fn exercise_key(&self) -> String {
        normalize_exercise_name(&self.exercise_name)
    }
}

/// Lowercase, trim and collapse inner whitespace so that
/// `" Bench  Press"` and `"bench press"` group together.
pub fn normalize_exercise_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(weight: f64, unit: WeightUnit, reps: u32) -> WorkoutSet {
        WorkoutSet {
            exercise_name: "Squat".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            weight,
            unit,
            reps,
            duration_min: None,
        }
    }

    #[test]
    fn unit_parsing_accepts_common_spellings() {
        assert_eq!("KG".parse::<WeightUnit>().unwrap(), WeightUnit::Kg);
        assert_eq!(" lbs ".parse::<WeightUnit>().unwrap(), WeightUnit::Lb);
        assert_eq!("Pounds".parse::<WeightUnit>().unwrap(), WeightUnit::Lb);
        assert_eq!(
            "stone".parse::<WeightUnit>(),
            Err(ValidationReason::UnknownUnit("stone".to_string()))
        );
    }

    #[test]
    fn conversion_uses_fixed_factor() {
        assert!((WeightUnit::Kg.convert(100.0, WeightUnit::Lb) - 220.462).abs() < 1e-9);
        assert!((WeightUnit::Lb.convert(220.462, WeightUnit::Kg) - 100.0).abs() < 1e-9);
        assert_eq!(WeightUnit::Kg.convert(42.5, WeightUnit::Kg), 42.5);
    }

    #[test]
    fn volume_is_converted_before_multiplying() {
        let s = set(100.0, WeightUnit::Kg, 5);
        assert_eq!(s.volume_in(WeightUnit::Kg), 500.0);
        assert!((s.volume_in(WeightUnit::Lb) - 1102.31).abs() < 1e-6);
    }

    #[test]
    fn exercise_names_normalize() {
        assert_eq!(normalize_exercise_name("  Bench   Press "), "bench press");
        assert_eq!(normalize_exercise_name("bench press"), "bench press");
    }

    #[test]
    fn canonical_field_serializes_snake_case() {
        let json = serde_json::to_string(&CanonicalField::ExerciseName).unwrap();
        assert_eq!(json, "\"exercise_name\"");
    }
}
