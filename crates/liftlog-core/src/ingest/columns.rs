//! Resolution of export headers against the configured column mapping.

use std::collections::BTreeMap;

use crate::error::MalformedSourceError;
use crate::model::CanonicalField;
use crate::storage::Config;

const ALL_FIELDS: [CanonicalField; 6] = [
    CanonicalField::ExerciseName,
    CanonicalField::Date,
    CanonicalField::Weight,
    CanonicalField::Unit,
    CanonicalField::Reps,
    CanonicalField::Duration,
];

/// Matching key for a header cell: lowercase, without whitespace,
/// underscores or a leading byte-order mark.
pub fn header_key(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical field -> header cell of the export it is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    by_field: BTreeMap<CanonicalField, String>,
}

impl ResolvedColumns {
    /// Resolve `header` against `config.columns`.
    ///
    /// For each field the first mapped source column (in mapping order)
    /// present in the header wins.
    ///
    /// # Errors
    ///
    /// [`MalformedSourceError::MissingHeader`] when the first row looks like
    /// data rather than column names, [`MalformedSourceError::MissingColumn`]
    /// when a required field has no column.
    pub fn resolve(header: &[String], config: &Config) -> Result<Self, MalformedSourceError> {
        let keyed: Vec<(String, &String)> =
            header.iter().map(|cell| (header_key(cell), cell)).collect();

        let mut by_field = BTreeMap::new();
        for field in ALL_FIELDS {
            let found = config.columns_for(field).into_iter().find_map(|candidate| {
                let wanted = header_key(candidate);
                keyed
                    .iter()
                    .find(|(key, _)| *key == wanted)
                    .map(|(_, cell)| (*cell).clone())
            });
            if let Some(cell) = found {
                by_field.insert(field, cell);
            }
        }

        if by_field.is_empty() && looks_like_data_row(header) {
            return Err(MalformedSourceError::MissingHeader);
        }

        for field in CanonicalField::REQUIRED {
            if !by_field.contains_key(&field) {
                return Err(MalformedSourceError::MissingColumn {
                    field,
                    candidates: config.columns_for(field).join(", "),
                    header: header.join(", "),
                });
            }
        }

        Ok(Self { by_field })
    }

    pub fn column(&self, field: CanonicalField) -> Option<&str> {
        self.by_field.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.by_field.iter().map(|(field, column)| (*field, column.as_str()))
    }
}

/// A first row containing a bare number is data, not a header.
fn looks_like_data_row(cells: &[String]) -> bool {
    cells.iter().any(|cell| {
        let cell = cell.trim();
        !cell.is_empty() && cell.replace(',', ".").parse::<f64>().is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn header_key_ignores_case_spaces_and_underscores() {
        assert_eq!(header_key(" Exercise Name "), "exercisename");
        assert_eq!(header_key("exercise_name"), "exercisename");
        assert_eq!(header_key("\u{feff}DATE"), "date");
    }

    #[test]
    fn resolves_strong_export_header() {
        let cfg = Config::default();
        let h = header(&["Date", "Workout Name", "Exercise Name", "Set Order", "Weight", "Reps"]);
        let cols = ResolvedColumns::resolve(&h, &cfg).unwrap();
        assert_eq!(cols.column(CanonicalField::ExerciseName), Some("Exercise Name"));
        assert_eq!(cols.column(CanonicalField::Date), Some("Date"));
        assert_eq!(cols.column(CanonicalField::Unit), None);
    }

    #[test]
    fn resolves_messy_capitalization() {
        let cfg = Config::default();
        let h = header(&["EXERCISE_NAME", " date ", "weight", "UNIT", "reps"]);
        let cols = ResolvedColumns::resolve(&h, &cfg).unwrap();
        assert_eq!(cols.column(CanonicalField::ExerciseName), Some("EXERCISE_NAME"));
        assert_eq!(cols.column(CanonicalField::Unit), Some("UNIT"));
    }

    #[test]
    fn earlier_alias_wins() {
        let cfg = Config::default();
        let h = header(&["Exercise", "Exercise Name", "Start Time", "Date", "Weight", "Reps"]);
        let cols = ResolvedColumns::resolve(&h, &cfg).unwrap();
        assert_eq!(cols.column(CanonicalField::ExerciseName), Some("Exercise Name"));
        assert_eq!(cols.column(CanonicalField::Date), Some("Date"));
    }

    #[test]
    fn missing_required_column_fails() {
        let cfg = Config::default();
        let h = header(&["Exercise Name", "Date", "Weight"]);
        let err = ResolvedColumns::resolve(&h, &cfg).unwrap_err();
        assert!(matches!(
            err,
            MalformedSourceError::MissingColumn { field: CanonicalField::Reps, .. }
        ));
    }

    #[test]
    fn data_row_in_header_position_is_missing_header() {
        let cfg = Config::default();
        let h = header(&["Bench Press", "2024-01-01", "100", "5", "kg"]);
        let err = ResolvedColumns::resolve(&h, &cfg).unwrap_err();
        assert!(matches!(err, MalformedSourceError::MissingHeader));
    }
}
