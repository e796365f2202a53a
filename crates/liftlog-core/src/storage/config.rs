//! TOML-based pipeline configuration.
//!
//! Holds every option a run depends on:
//! - Week anchoring (`week_start_weekday`)
//! - Units (`default_unit` for rows without a unit, `output_unit` for volumes)
//! - Accepted date formats, tried in order
//! - Optional field delimiter (sniffed from the header when unset)
//! - Column mapping from export headers to canonical fields
//!
//! Configuration is stored at `~/.config/liftlog/config.toml`.

use chrono::format::{Item, StrftimeItems};
use chrono::Weekday;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::data_dir;
use crate::error::ConfigError;
use crate::model::{CanonicalField, WeightUnit};

/// Weekday that starts a training week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekStart {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Mon => Weekday::Mon,
            WeekStart::Tue => Weekday::Tue,
            WeekStart::Wed => Weekday::Wed,
            WeekStart::Thu => Weekday::Thu,
            WeekStart::Fri => Weekday::Fri,
            WeekStart::Sat => Weekday::Sat,
            WeekStart::Sun => Weekday::Sun,
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for WeekStart {
    type Err = ConfigError;

    /// Accepts `Mon`, `monday`, `SUN`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day: Weekday = s.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "week_start_weekday".to_string(),
            message: format!("'{s}' is not a weekday"),
        })?;
        Ok(match day {
            Weekday::Mon => WeekStart::Mon,
            Weekday::Tue => WeekStart::Tue,
            Weekday::Wed => WeekStart::Wed,
            Weekday::Thu => WeekStart::Thu,
            Weekday::Fri => WeekStart::Fri,
            Weekday::Sat => WeekStart::Sat,
            Weekday::Sun => WeekStart::Sun,
        })
    }
}

/// Pipeline configuration.
///
/// Serialized to/from TOML at `~/.config/liftlog/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_week_start")]
    pub week_start_weekday: WeekStart,
    /// Unit assumed for rows whose unit column is absent or empty.
    #[serde(default = "default_unit")]
    pub default_unit: WeightUnit,
    /// Unit every volume and aggregate is reported in.
    #[serde(default = "default_unit")]
    pub output_unit: WeightUnit,
    /// strftime-style formats, highest priority first.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    /// Field delimiter; sniffed from the header line when unset.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Source column -> canonical field. Earlier entries win when several
    /// columns of one export map to the same field.
    #[serde(default = "default_columns")]
    pub columns: IndexMap<String, CanonicalField>,
}

// Default functions
fn default_week_start() -> WeekStart {
    WeekStart::Mon
}
fn default_unit() -> WeightUnit {
    WeightUnit::Kg
}
fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d.%m.%Y",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_columns() -> IndexMap<String, CanonicalField> {
    [
        ("Exercise Name", CanonicalField::ExerciseName),
        ("Exercise", CanonicalField::ExerciseName),
        ("Date", CanonicalField::Date),
        ("Workout Date", CanonicalField::Date),
        ("Start Time", CanonicalField::Date),
        ("Weight", CanonicalField::Weight),
        ("Weight (kg)", CanonicalField::Weight),
        ("Weight Unit", CanonicalField::Unit),
        ("Unit", CanonicalField::Unit),
        ("Reps", CanonicalField::Reps),
        ("Rep", CanonicalField::Reps),
        ("Duration", CanonicalField::Duration),
        ("Total Time", CanonicalField::Duration),
        ("Workout Duration (min)", CanonicalField::Duration),
    ]
    .into_iter()
    .map(|(column, field)| (column.to_string(), field))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            week_start_weekday: default_week_start(),
            default_unit: default_unit(),
            output_unit: default_unit(),
            date_formats: default_date_formats(),
            delimiter: None,
            columns: default_columns(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // An empty value clears optional settings such as `delimiter`.
                    _ if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result is validated
    /// before it replaces `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check the options a run cannot proceed without.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.date_formats.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "date_formats".to_string(),
                message: "at least one date format is required".to_string(),
            });
        }
        for format in &self.date_formats {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::InvalidValue {
                    key: "date_formats".to_string(),
                    message: format!("invalid format string '{format}'"),
                });
            }
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' {
                return Err(ConfigError::InvalidValue {
                    key: "delimiter".to_string(),
                    message: format!("'{}' cannot be used as a delimiter", delimiter.escape_default()),
                });
            }
        }

        for field in CanonicalField::REQUIRED {
            if !self.columns.values().any(|mapped| *mapped == field) {
                return Err(ConfigError::InvalidValue {
                    key: "columns".to_string(),
                    message: format!("no source column is mapped to '{field}'"),
                });
            }
        }
        Ok(())
    }

    /// Source columns mapped to `field`, in priority order.
    pub fn columns_for(&self, field: CanonicalField) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, mapped)| **mapped == field)
            .map(|(column, _)| column.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.week_start_weekday, WeekStart::Mon);
        assert_eq!(cfg.default_unit, WeightUnit::Kg);
        assert_eq!(cfg.output_unit, WeightUnit::Kg);
        assert_eq!(cfg.date_formats[0], "%Y-%m-%d %H:%M:%S");
        assert!(cfg.delimiter.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_falls_back_to_field_defaults() {
        let cfg: Config = toml::from_str("output_unit = \"lb\"\nweek_start_weekday = \"Sun\"\n").unwrap();
        assert_eq!(cfg.output_unit, WeightUnit::Lb);
        assert_eq!(cfg.week_start_weekday, WeekStart::Sun);
        assert_eq!(cfg.default_unit, WeightUnit::Kg);
        assert_eq!(cfg.columns, default_columns());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("output_unit").as_deref(), Some("kg"));
        assert_eq!(cfg.get("week_start_weekday").as_deref(), Some("Mon"));
        assert_eq!(cfg.get("columns.Reps").as_deref(), Some("reps"));
        assert!(cfg.get("missing_key").is_none());
    }

    #[test]
    fn set_updates_enum_values() {
        let mut cfg = Config::default();
        cfg.set("output_unit", "lb").unwrap();
        cfg.set("week_start_weekday", "Sun").unwrap();
        assert_eq!(cfg.output_unit, WeightUnit::Lb);
        assert_eq!(cfg.week_start_weekday, WeekStart::Sun);
    }

    #[test]
    fn set_updates_delimiter_from_null() {
        let mut cfg = Config::default();
        cfg.set("delimiter", ";").unwrap();
        assert_eq!(cfg.delimiter, Some(';'));
    }

    #[test]
    fn set_empty_delimiter_restores_sniffing() {
        let mut cfg = Config::default();
        cfg.set("delimiter", ";").unwrap();
        cfg.set("delimiter", "").unwrap();
        assert_eq!(cfg.delimiter, None);
        assert_eq!(cfg.get("delimiter").as_deref(), Some("null"));
    }

    #[test]
    fn set_empty_required_value_is_rejected() {
        let mut cfg = Config::default();
        let result = cfg.set("output_unit", "");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.output_unit, WeightUnit::Kg);
    }

    #[test]
    fn duration_aliases_are_optional_columns() {
        let cfg = Config::default();
        assert_eq!(
            cfg.columns_for(CanonicalField::Duration),
            vec!["Duration", "Total Time", "Workout Duration (min)"]
        );
        let mut without = cfg.clone();
        without.columns.retain(|_, field| *field != CanonicalField::Duration);
        assert!(without.validate().is_ok());
    }

    #[test]
    fn set_accepts_json_for_lists() {
        let mut cfg = Config::default();
        cfg.set("date_formats", r#"["%d/%m/%Y", "%Y-%m-%d"]"#).unwrap();
        assert_eq!(cfg.date_formats, vec!["%d/%m/%Y", "%Y-%m-%d"]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_unit_and_keeps_previous_value() {
        let mut cfg = Config::default();
        let result = cfg.set("default_unit", "stone");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.default_unit, WeightUnit::Kg);
    }

    #[test]
    fn validate_rejects_empty_date_formats() {
        let cfg = Config {
            date_formats: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "date_formats"
        ));
    }

    #[test]
    fn validate_rejects_mapping_without_required_field() {
        let mut cfg = Config::default();
        cfg.columns.retain(|_, field| *field != CanonicalField::Reps);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("reps"));
    }

    #[test]
    fn validate_rejects_bad_format_string() {
        let cfg = Config {
            date_formats: vec!["%Y-%Q".to_string()],
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn columns_for_keeps_mapping_order() {
        let cfg = Config::default();
        assert_eq!(
            cfg.columns_for(CanonicalField::Date),
            vec!["Date", "Workout Date", "Start Time"]
        );
    }

    #[test]
    fn week_start_parses_names() {
        assert_eq!("monday".parse::<WeekStart>().unwrap(), WeekStart::Mon);
        assert_eq!("SUN".parse::<WeekStart>().unwrap(), WeekStart::Sun);
        assert!("someday".parse::<WeekStart>().is_err());
    }

    #[test]
    fn save_and_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("output_unit", "lb").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
    }
}
