//! Conversion of raw export rows into canonical [`WorkoutSet`]s.
//!
//! Every rejected row yields a [`ValidationError`] naming the field and
//! the reason. Nothing is coerced: an empty weight is "missing", not zero.

mod parse;

pub use parse::{parse_date, parse_duration, parse_reps, parse_weight};

use crate::error::{ValidationError, ValidationReason};
use crate::ingest::{RawRecord, ResolvedColumns};
use crate::model::{CanonicalField, WeightUnit, WorkoutSet};
use crate::storage::Config;

/// Validates rows read through a particular resolved header.
#[derive(Debug, Clone)]
pub struct Normalizer {
    columns: ResolvedColumns,
    default_unit: WeightUnit,
    date_formats: Vec<String>,
}

impl Normalizer {
    pub fn new(config: &Config, columns: ResolvedColumns) -> Self {
        Self {
            columns,
            default_unit: config.default_unit,
            date_formats: config.date_formats.clone(),
        }
    }

    /// Validate one row.
    ///
    /// A row with zero reps is kept as a note only when it carries weight;
    /// zero weight and zero reps is rejected.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn normalize(&self, record: &RawRecord) -> Result<WorkoutSet, ValidationError> {
        let exercise_name = self.required(record, CanonicalField::ExerciseName)?.to_string();

        let date = parse_date(self.required(record, CanonicalField::Date)?, &self.date_formats)
            .map_err(|reason| ValidationError::new(CanonicalField::Date, reason))?;

        let weight = parse_weight(self.required(record, CanonicalField::Weight)?)
            .map_err(|reason| ValidationError::new(CanonicalField::Weight, reason))?;

        let reps = parse_reps(self.required(record, CanonicalField::Reps)?)
            .map_err(|reason| ValidationError::new(CanonicalField::Reps, reason))?;

        let unit = match self.value(record, CanonicalField::Unit) {
            Some(raw) => raw
                .parse::<WeightUnit>()
                .map_err(|reason| ValidationError::new(CanonicalField::Unit, reason))?,
            None => self.default_unit,
        };

        let duration_min = self
            .value(record, CanonicalField::Duration)
            .map(parse_duration)
            .transpose()
            .map_err(|reason| ValidationError::new(CanonicalField::Duration, reason))?;

        if reps == 0 && weight <= 0.0 {
            return Err(ValidationError::new(
                CanonicalField::Reps,
                ValidationReason::ZeroWeightAndReps,
            ));
        }

        Ok(WorkoutSet {
            exercise_name,
            date,
            weight,
            unit,
            reps,
            duration_min,
        })
    }

    fn value<'r>(&self, record: &'r RawRecord, field: CanonicalField) -> Option<&'r str> {
        self.columns
            .column(field)
            .and_then(|column| record.get(column))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn required<'r>(
        &self,
        record: &'r RawRecord,
        field: CanonicalField,
    ) -> Result<&'r str, ValidationError> {
        self.value(record, field)
            .ok_or_else(|| ValidationError::new(field, ValidationReason::Missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    const HEADER: [&str; 5] = ["Exercise Name", "Date", "Weight", "Reps", "Unit"];

    fn normalizer(config: &Config) -> Normalizer {
        let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
        let columns = ResolvedColumns::resolve(&header, config).unwrap();
        Normalizer::new(config, columns)
    }

    fn row(values: [&str; 5]) -> RawRecord {
        let fields: IndexMap<String, String> = HEADER
            .iter()
            .zip(values)
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        RawRecord::new(2, fields)
    }

    #[test]
    fn valid_row_becomes_workout_set() {
        let n = normalizer(&Config::default());
        let set = n.normalize(&row(["Bench Press", "2024-01-01", "100", "5", "kg"])).unwrap();
        assert_eq!(
            set,
            WorkoutSet {
                exercise_name: "Bench Press".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                weight: 100.0,
                unit: WeightUnit::Kg,
                reps: 5,
                duration_min: None,
            }
        );
    }

    #[test]
    fn explicit_unit_column_wins_over_default() {
        let n = normalizer(&Config::default());
        let set = n.normalize(&row(["Squat", "2024-01-01", "225", "5", "LBS"])).unwrap();
        assert_eq!(set.unit, WeightUnit::Lb);
    }

    #[test]
    fn empty_unit_uses_configured_default() {
        let cfg = Config {
            default_unit: WeightUnit::Lb,
            ..Config::default()
        };
        let set = normalizer(&cfg)
            .normalize(&row(["Squat", "2024-01-01", "225", "5", ""]))
            .unwrap();
        assert_eq!(set.unit, WeightUnit::Lb);
    }

    #[test]
    fn zero_reps_with_weight_is_kept() {
        let n = normalizer(&Config::default());
        let set = n.normalize(&row(["Squat", "2024-01-01", "60", "0", "kg"])).unwrap();
        assert_eq!(set.reps, 0);
        assert_eq!(set.weight, 60.0);
    }

    #[test]
    fn zero_weight_and_reps_is_rejected() {
        let n = normalizer(&Config::default());
        let err = n.normalize(&row(["Squat", "2024-01-01", "0", "0", "kg"])).unwrap_err();
        assert_eq!(err.reason, ValidationReason::ZeroWeightAndReps);
        assert_eq!(err.reason.to_string(), "zero weight and reps");
    }

    #[test]
    fn bodyweight_sets_with_reps_are_kept() {
        let n = normalizer(&Config::default());
        let set = n.normalize(&row(["Pull Up", "2024-01-01", "0", "10", ""])).unwrap();
        assert_eq!(set.reps, 10);
        assert_eq!(set.weight, 0.0);
    }

    #[test]
    fn each_field_reports_its_own_error() {
        let n = normalizer(&Config::default());
        let cases = [
            (["", "2024-01-01", "100", "5", "kg"], CanonicalField::ExerciseName, ValidationReason::Missing),
            (["Squat", "Jan 1st", "100", "5", "kg"], CanonicalField::Date, ValidationReason::UnparseableDate("Jan 1st".to_string())),
            (["Squat", "2024-01-01", "", "5", "kg"], CanonicalField::Weight, ValidationReason::Missing),
            (["Squat", "2024-01-01", "abc", "5", "kg"], CanonicalField::Weight, ValidationReason::NonNumeric("abc".to_string())),
            (["Squat", "2024-01-01", "-20", "5", "kg"], CanonicalField::Weight, ValidationReason::Negative("-20".to_string())),
            (["Squat", "2024-01-01", "100", "-1", "kg"], CanonicalField::Reps, ValidationReason::Negative("-1".to_string())),
            (["Squat", "2024-01-01", "100", "5", "stone"], CanonicalField::Unit, ValidationReason::UnknownUnit("stone".to_string())),
        ];
        for (values, field, reason) in cases {
            let err = n.normalize(&row(values)).unwrap_err();
            assert_eq!(err, ValidationError::new(field, reason), "row {values:?}");
        }
    }

    fn duration_row(duration: &str) -> Result<WorkoutSet, ValidationError> {
        let cfg = Config::default();
        let header: Vec<String> = ["Exercise Name", "Date", "Weight", "Reps", "Duration"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let columns = ResolvedColumns::resolve(&header, &cfg).unwrap();
        let fields: IndexMap<String, String> = header
            .iter()
            .cloned()
            .zip(["Squat", "2024-01-01", "100", "5", duration].map(String::from))
            .collect();
        Normalizer::new(&cfg, columns).normalize(&RawRecord::new(2, fields))
    }

    #[test]
    fn duration_column_is_parsed_into_minutes() {
        assert_eq!(duration_row("1h 5min").unwrap().duration_min, Some(65.0));
        assert_eq!(duration_row("01:05:00").unwrap().duration_min, Some(65.0));
        assert_eq!(duration_row("").unwrap().duration_min, None);
    }

    #[test]
    fn unparseable_duration_rejects_row() {
        let err = duration_row("soon").unwrap_err();
        assert_eq!(err.field, CanonicalField::Duration);
        assert_eq!(err.reason, ValidationReason::UnparseableDuration("soon".to_string()));
    }

    #[test]
    fn export_without_unit_column_uses_default() {
        let cfg = Config::default();
        let header: Vec<String> = ["Exercise Name", "Date", "Weight", "Reps"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let columns = ResolvedColumns::resolve(&header, &cfg).unwrap();
        let n = Normalizer::new(&cfg, columns);
        let fields: IndexMap<String, String> = header
            .iter()
            .cloned()
            .zip(["Deadlift", "2024-02-01 18:00:00", "140", "3"].map(String::from))
            .collect();
        let set = n.normalize(&RawRecord::new(2, fields)).unwrap();
        assert_eq!(set.unit, WeightUnit::Kg);
        assert_eq!(set.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
