//! End-to-end batch run: ingest, normalize, aggregate, write.
//!
//! Fatal errors ([`MalformedSourceError`], [`IoWriteError`]) abort the run.
//! Rows failing validation are skipped and returned in the run's skip log.
//! Outputs are only touched after the whole input has been read.

use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ConfigError, IoWriteError, MalformedSourceError, Result, ValidationError};
use crate::export::{OutputBatch, WriteFormat};
use crate::ingest::RowIngestor;
use crate::model::{CanonicalField, WorkoutSet};
use crate::normalize::Normalizer;
use crate::stats::{AggregateReport, Aggregator};
use crate::storage::Config;

/// A row dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// 1-based line in the source
    pub line: u64,
    pub field: CanonicalField,
    /// Human-readable reason, e.g. "zero weight and reps"
    pub reason: String,
    #[serde(skip)]
    pub error: ValidationError,
}

impl SkippedRecord {
    pub fn new(line: u64, error: ValidationError) -> Self {
        Self {
            line,
            field: error.field,
            reason: error.reason.to_string(),
            error,
        }
    }
}

/// Valid sets of one export plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRun {
    /// Valid sets in input order
    pub sets: Vec<WorkoutSet>,
    pub skipped: Vec<SkippedRecord>,
    /// Data rows read, blank lines excluded
    pub total_rows: usize,
}

impl NormalizedRun {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// "N of M rows skipped"
    pub fn skip_summary(&self) -> String {
        format!("{} of {} rows skipped", self.skipped_count(), self.total_rows)
    }
}

/// Destinations for a batch run. Only `sets` is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPaths {
    pub sets: PathBuf,
    pub weekly: Option<PathBuf>,
    pub daily: Option<PathBuf>,
    pub sessions: Option<PathBuf>,
    pub exercises: Option<PathBuf>,
    /// Exercises ranked by estimated one-rep max
    pub records: Option<PathBuf>,
}

impl OutputPaths {
    pub fn new(sets: impl Into<PathBuf>) -> Self {
        Self {
            sets: sets.into(),
            ..Self::default()
        }
    }
}

/// Result of [`Pipeline::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub kept: usize,
    pub skipped: Vec<SkippedRecord>,
    pub written: Vec<PathBuf>,
    pub report: AggregateReport,
}

impl RunSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// "N of M rows skipped"
    pub fn skip_summary(&self) -> String {
        format!("{} of {} rows skipped", self.skipped_count(), self.total_rows)
    }
}

/// One configured pipeline. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    aggregator: Aggregator,
    format: WriteFormat,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let aggregator = Aggregator::new(&config);
        let format = WriteFormat::from_config(&config)?;
        Ok(Self {
            config,
            aggregator,
            format,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Delimiter and date format of every written file.
    pub fn write_format(&self) -> &WriteFormat {
        &self.format
    }

    /// Ingest and normalize the export at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSourceError`] if the export cannot be read as a table.
    pub fn normalize_path(&self, path: &Path) -> Result<NormalizedRun, MalformedSourceError> {
        let ingestor = RowIngestor::open(path, &self.config)?;
        self.normalize_rows(ingestor)
    }

    /// Ingest and normalize delimited text from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSourceError`] if the text cannot be read as a table.
    pub fn normalize_reader<R: Read>(&self, reader: R) -> Result<NormalizedRun, MalformedSourceError> {
        let ingestor = RowIngestor::from_reader(reader, &self.config)?;
        self.normalize_rows(ingestor)
    }

    /// Drain an ingestor, validating each row.
    ///
    /// # Errors
    ///
    /// Returns the first [`MalformedSourceError`] the ingestor yields.
    pub fn normalize_rows<R: Read>(
        &self,
        ingestor: RowIngestor<R>,
    ) -> Result<NormalizedRun, MalformedSourceError> {
        let normalizer = Normalizer::new(&self.config, ingestor.columns().clone());
        let mut run = NormalizedRun::default();

        for record in ingestor {
            let record = record?;
            run.total_rows += 1;
            match normalizer.normalize(&record) {
                Ok(set) => run.sets.push(set),
                Err(error) => {
                    warn!(
                        line = record.line(),
                        field = %error.field,
                        reason = %error.reason,
                        "skipping row"
                    );
                    run.skipped.push(SkippedRecord::new(record.line(), error));
                }
            }
        }

        info!(
            rows = run.total_rows,
            kept = run.sets.len(),
            skipped = run.skipped_count(),
            "normalized export"
        );
        Ok(run)
    }

    pub fn aggregate(&self, sets: &[WorkoutSet]) -> AggregateReport {
        let report = self.aggregator.aggregate(sets);
        info!(
            weeks = report.weekly.len(),
            exercises = report.exercises.len(),
            unit = %report.output_unit,
            "aggregated sets"
        );
        report
    }

    /// Stage every requested output, then commit them together.
    ///
    /// # Errors
    ///
    /// Returns [`IoWriteError`] for the first output that cannot be written.
    pub fn write(
        &self,
        sets: &[WorkoutSet],
        report: &AggregateReport,
        outputs: &OutputPaths,
    ) -> Result<Vec<PathBuf>, IoWriteError> {
        let mut batch = OutputBatch::with_format(self.format.clone());
        batch.stage_sets(&outputs.sets, sets)?;
        if let Some(path) = &outputs.weekly {
            batch.stage_weekly(path, &report.weekly)?;
        }
        if let Some(path) = &outputs.daily {
            batch.stage_daily(path, &report.daily)?;
        }
        if let Some(path) = &outputs.sessions {
            batch.stage_sessions(path, &report.sessions)?;
        }
        if let Some(path) = &outputs.exercises {
            batch.stage_exercises(path, &report.exercises)?;
        }
        if let Some(path) = &outputs.records {
            batch.stage_records(path, &report.one_rep_max_ranking(), report.output_unit)?;
        }
        let written = batch.commit()?;
        info!(files = written.len(), "wrote outputs");
        Ok(written)
    }

    /// Full batch run over `input`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::MalformedSource`] before any output is
    /// touched, or [`crate::CoreError::IoWrite`] if an output cannot be written.
    pub fn run(&self, input: &Path, outputs: &OutputPaths) -> Result<RunSummary> {
        let run = self.normalize_path(input)?;
        let report = self.aggregate(&run.sets);
        let written = self.write(&run.sets, &report, outputs)?;

        Ok(RunSummary {
            total_rows: run.total_rows,
            kept: run.sets.len(),
            skipped: run.skipped,
            written,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationReason;

    fn pipeline() -> Pipeline {
        Pipeline::new(Config::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = Config {
            date_formats: Vec::new(),
            ..Config::default()
        };
        assert!(Pipeline::new(cfg).is_err());
    }

    #[test]
    fn write_format_follows_config() {
        let cfg = Config {
            delimiter: Some('\t'),
            date_formats: vec!["%m/%d/%Y".to_string()],
            ..Config::default()
        };
        let pipeline = Pipeline::new(cfg).unwrap();
        assert_eq!(pipeline.write_format().delimiter(), b'\t');
        assert_eq!(pipeline.write_format().date_format(), "%m/%d/%Y");
    }

    #[test]
    fn collects_skip_log_and_counts() {
        let text = "\
Exercise Name,Date,Weight,Reps
Squat,2024-01-01,100,5
Squat,2024-01-01,0,0
Squat,not a date,100,5
Bench,2024-01-02,80,8
";
        let run = pipeline().normalize_reader(text.as_bytes()).unwrap();
        assert_eq!(run.total_rows, 4);
        assert_eq!(run.sets.len(), 2);
        assert_eq!(run.skipped_count(), 2);
        assert_eq!(run.skipped[0].line, 3);
        assert_eq!(run.skipped[0].reason, "zero weight and reps");
        assert_eq!(run.skipped[1].line, 4);
        assert_eq!(run.skipped[1].field, CanonicalField::Date);
        assert_eq!(
            run.skipped[1].error.reason,
            ValidationReason::UnparseableDate("not a date".to_string())
        );
        assert_eq!(run.skip_summary(), "2 of 4 rows skipped");
    }

    #[test]
    fn keeps_input_order() {
        let text = "Exercise,Date,Weight,Reps\nB,2024-01-05,1,1\nA,2024-01-01,1,1\nC,2024-01-03,1,1\n";
        let run = pipeline().normalize_reader(text.as_bytes()).unwrap();
        let names: Vec<&str> = run.sets.iter().map(|s| s.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn skipped_record_serializes_reason_text() {
        let record = SkippedRecord::new(
            7,
            ValidationError::new(CanonicalField::Reps, ValidationReason::ZeroWeightAndReps),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["line"], 7);
        assert_eq!(json["field"], "reps");
        assert_eq!(json["reason"], "zero weight and reps");
        assert!(json.get("error").is_none());
    }
}
