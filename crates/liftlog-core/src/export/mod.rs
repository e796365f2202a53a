//! Flat-file output for normalized sets and summaries.
//!
//! Files are written to a temporary file next to the destination and
//! renamed over it on commit, so a reader never sees a half-written file.
//! An [`OutputBatch`] stages every requested file before committing any.
//! Rows use the run's delimiter and a date format the run's configuration
//! reads back, so a written sets file can be fed through the pipeline again.

use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ConfigError, IoWriteError};
use crate::model::{WeightUnit, WorkoutSet};
use crate::normalize::parse_date;
use crate::stats::{DailySummary, ExerciseLifetimeStat, ExerciseSession, WeeklySummary};
use crate::storage::Config;

pub const SETS_HEADER: [&str; 6] = ["exercise_name", "date", "weight", "unit", "reps", "duration"];
pub const WEEKLY_HEADER: [&str; 3] = ["week_start_date", "total_volume", "session_count"];
pub const DAILY_HEADER: [&str; 6] = [
    "date",
    "total_volume",
    "set_count",
    "total_reps",
    "exercise_count",
    "duration_min",
];
pub const SESSIONS_HEADER: [&str; 7] = [
    "date",
    "exercise_name",
    "display_name",
    "top_set_weight",
    "set_count",
    "total_reps",
    "volume",
];
pub const EXERCISE_HEADER: [&str; 10] = [
    "exercise_name",
    "display_name",
    "lifetime_volume",
    "set_count",
    "total_reps",
    "pr_weight",
    "pr_unit",
    "pr_reps",
    "pr_date",
    "estimated_one_rep_max",
];
pub const RECORDS_HEADER: [&str; 7] = [
    "rank",
    "exercise_name",
    "display_name",
    "estimated_one_rep_max",
    "best_weight",
    "unit",
    "best_reps",
];

const ISO_DATE: &str = "%Y-%m-%d";

/// Dates a candidate write format must read back unchanged. Day and month
/// are distinguishable in all but the first.
const SAMPLE_DATES: [(i32, u32, u32); 4] = [(2024, 1, 2), (2024, 2, 13), (2023, 12, 31), (1999, 11, 5)];

/// Delimiter and date format used for every written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFormat {
    delimiter: u8,
    date_format: String,
}

impl Default for WriteFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_format: ISO_DATE.to_string(),
        }
    }
}

impl WriteFormat {
    /// Pick the configured delimiter (`,` when sniffing) and the first date
    /// format, ISO preferred, that the configured `date_formats` parse back
    /// to the same day.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the delimiter is not a single
    /// ASCII byte or no format survives a write/read cycle.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let delimiter = match config.delimiter {
            None => b',',
            Some(c) => u8::try_from(c)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "delimiter".to_string(),
                    message: format!("'{}' cannot be used as a delimiter", c.escape_default()),
                })?,
        };

        let date_format = std::iter::once(ISO_DATE)
            .chain(config.date_formats.iter().map(String::as_str))
            .find(|format| reads_back(format, &config.date_formats))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "date_formats".to_string(),
                message: "no format can write dates that read back unchanged".to_string(),
            })?
            .to_string();

        Ok(Self {
            delimiter,
            date_format,
        })
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    fn format_date(&self, date: NaiveDate) -> csv::Result<String> {
        format_date(date, &self.date_format).ok_or_else(|| {
            csv::Error::from(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot format {date} with '{}'", self.date_format),
            ))
        })
    }
}

fn format_date(date: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.and_time(NaiveTime::MIN).format(format)).ok()?;
    Some(out)
}

fn reads_back(format: &str, accepted: &[String]) -> bool {
    SAMPLE_DATES
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .all(|date| {
            format_date(date, format)
                .is_some_and(|text| parse_date(&text, accepted).ok() == Some(date))
        })
}

/// Output files written to temporary locations, awaiting [`commit`](Self::commit).
///
/// Dropping a batch without committing removes every staged file and
/// leaves the destinations untouched.
#[derive(Default)]
pub struct OutputBatch {
    format: WriteFormat,
    staged: Vec<(PathBuf, NamedTempFile)>,
}

impl OutputBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: WriteFormat) -> Self {
        Self {
            format,
            staged: Vec::new(),
        }
    }

    /// Stage the sets file, one row per set in input order.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] if the destination is read-only or the
    /// temporary file cannot be created or written.
    pub fn stage_sets(&mut self, path: &Path, sets: &[WorkoutSet]) -> Result<(), IoWriteError> {
        let format = self.format.clone();
        self.stage(path, &SETS_HEADER, |writer| {
            for set in sets {
                writer.write_record([
                    set.exercise_name.clone(),
                    format.format_date(set.date)?,
                    set.weight.to_string(),
                    set.unit.as_str().to_string(),
                    set.reps.to_string(),
                    optional(set.duration_min),
                ])?;
            }
            Ok(())
        })
    }

    /// Stage the weekly summary file.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] if the destination is read-only or the
    /// temporary file cannot be created or written.
    pub fn stage_weekly(
        &mut self,
        path: &Path,
        weekly: &[WeeklySummary],
    ) -> Result<(), IoWriteError> {
        let format = self.format.clone();
        self.stage(path, &WEEKLY_HEADER, |writer| {
            for week in weekly {
                writer.write_record([
                    format.format_date(week.week_start_date)?,
                    week.total_volume.to_string(),
                    week.session_count.to_string(),
                ])?;
            }
            Ok(())
        })
    }

    /// Stage the daily summary file.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] if the destination is read-only or the
    /// temporary file cannot be created or written.
    pub fn stage_daily(&mut self, path: &Path, daily: &[DailySummary]) -> Result<(), IoWriteError> {
        let format = self.format.clone();
        self.stage(path, &DAILY_HEADER, |writer| {
            for day in daily {
                writer.write_record([
                    format.format_date(day.date)?,
                    day.total_volume.to_string(),
                    day.set_count.to_string(),
                    day.total_reps.to_string(),
                    day.exercise_count.to_string(),
                    optional(day.duration_min),
                ])?;
            }
            Ok(())
        })
    }

    /// Stage the per-day, per-exercise breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] if the destination is read-only or the
    /// temporary file cannot be created or written.
    pub fn stage_sessions(
        &mut self,
        path: &Path,
        sessions: &[ExerciseSession],
    ) -> Result<(), IoWriteError> {
        let format = self.format.clone();
        self.stage(path, &SESSIONS_HEADER, |writer| {
            for session in sessions {
                writer.write_record([
                    format.format_date(session.date)?,
                    session.exercise_name.clone(),
                    session.display_name.clone(),
                    session.top_set_weight.to_string(),
                    session.set_count.to_string(),
                    session.total_reps.to_string(),
                    session.volume.to_string(),
                ])?;
            }
            Ok(())
        })
    }

    /// Stage the per-exercise file, ordered by normalized name.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] if the destination is read-only or the
    /// temporary file cannot be created or written.
    pub fn stage_exercises(
        &mut self,
        path: &Path,
        exercises: &BTreeMap<String, ExerciseLifetimeStat>,
    ) -> Result<(), IoWriteError> {
        let format = self.format.clone();
        self.stage(path, &EXERCISE_HEADER, |writer| {
            for stat in exercises.values() {
                let pr = &stat.personal_record;
                writer.write_record([
                    stat.exercise_name.clone(),
                    stat.display_name.clone(),
                    stat.lifetime_volume.to_string(),
                    stat.set_count.to_string(),
                    stat.total_reps.to_string(),
                    pr.weight.to_string(),
                    pr.unit.as_str().to_string(),
                    pr.reps.to_string(),
                    format.format_date(pr.date)?,
                    stat.estimated_one_rep_max.to_string(),
                ])?;
            }
            Ok(())
        })
    }

    /// Stage the estimated one-rep max ranking, best first.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] if the destination is read-only or the
    /// temporary file cannot be created or written.
    pub fn stage_records(
        &mut self,
        path: &Path,
        ranked: &[&ExerciseLifetimeStat],
        unit: WeightUnit,
    ) -> Result<(), IoWriteError> {
        self.stage(path, &RECORDS_HEADER, |writer| {
            for (rank, stat) in ranked.iter().enumerate() {
                writer.write_record([
                    (rank + 1).to_string(),
                    stat.exercise_name.clone(),
                    stat.display_name.clone(),
                    stat.estimated_one_rep_max.to_string(),
                    stat.best_weight.to_string(),
                    unit.as_str().to_string(),
                    stat.best_reps.to_string(),
                ])?;
            }
            Ok(())
        })
    }

    /// Destinations staged so far.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.staged.iter().map(|(path, _)| path.as_path())
    }

    /// Move every staged file over its destination, in staging order.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] for the first destination that cannot be
    /// replaced; files not yet committed are removed.
    pub fn commit(self) -> Result<Vec<PathBuf>, IoWriteError> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (path, temp) in self.staged {
            temp.persist(&path)
                .map_err(|e| IoWriteError::new(&path, e.error))?;
            debug!(path = %path.display(), "committed output");
            written.push(path);
        }
        Ok(written)
    }

    fn stage<F>(&mut self, path: &Path, header: &[&str], rows: F) -> Result<(), IoWriteError>
    where
        F: FnOnce(&mut csv::Writer<&mut File>) -> csv::Result<()>,
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let fail = |source: io::Error| IoWriteError::new(path, source);

        // A rename would replace a read-only file, so refuse it up front.
        let existing = match fs::metadata(path) {
            Ok(meta) => Some(meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(fail(e)),
        };
        if let Some(meta) = &existing {
            if meta.permissions().readonly() {
                return Err(fail(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "destination is read-only",
                )));
            }
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(".liftlog-").suffix(".tmp");
        // New files get the usual 0666-minus-umask mode.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut temp = builder.tempfile_in(dir).map_err(fail)?;

        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.format.delimiter)
                .from_writer(temp.as_file_mut());
            writer
                .write_record(header)
                .map_err(|e| fail(io::Error::from(e)))?;
            rows(&mut writer).map_err(|e| fail(io::Error::from(e)))?;
            writer.flush().map_err(fail)?;
        }
        if let Some(meta) = existing {
            temp.as_file()
                .set_permissions(meta.permissions())
                .map_err(fail)?;
        }
        temp.as_file().sync_all().map_err(fail)?;

        debug!(path = %path.display(), temp = %temp.path().display(), "staged output");
        self.staged.push((path.to_path_buf(), temp));
        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the sets file on its own.
///
/// # Errors
///
/// Returns [`IoWriteError`] if the destination cannot be written.
pub fn write_sets(path: &Path, sets: &[WorkoutSet], format: &WriteFormat) -> Result<(), IoWriteError> {
    let mut batch = OutputBatch::with_format(format.clone());
    batch.stage_sets(path, sets)?;
    batch.commit()?;
    Ok(())
}

/// Write the weekly summary file on its own.
///
/// # Errors
///
/// Returns [`IoWriteError`] if the destination cannot be written.
pub fn write_weekly(
    path: &Path,
    weekly: &[WeeklySummary],
    format: &WriteFormat,
) -> Result<(), IoWriteError> {
    let mut batch = OutputBatch::with_format(format.clone());
    batch.stage_weekly(path, weekly)?;
    batch.commit()?;
    Ok(())
}
