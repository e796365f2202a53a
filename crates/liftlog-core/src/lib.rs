//! # liftlog Core Library
//!
//! This library turns raw workout-log exports (Strong app CSV and similar
//! per-set exports) into a cleaned set table and training summaries. The
//! `liftlog` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Ingest**: single-pass reader that tolerates messy headers, padding,
//!   blank lines and `;`-delimited decimal-comma files
//! - **Normalize**: typed validation of each row into a [`WorkoutSet`]
//! - **Stats**: weekly volume/frequency, daily totals, per-day exercise
//!   sessions, lifetime volume, personal records and estimated 1RM ranking
//! - **Export**: atomic flat-file output in the run's delimiter and date format
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Pipeline`]: Runs ingest -> normalize -> aggregate -> write
//! - [`Config`]: Pipeline configuration management
//! - [`Aggregator`]: Summary computation

pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod stats;
pub mod storage;

pub use error::{
    ConfigError, CoreError, IoWriteError, MalformedSourceError, ValidationError, ValidationReason,
};
pub use export::{OutputBatch, WriteFormat};
pub use ingest::{RawRecord, RowIngestor};
pub use model::{CanonicalField, WeightUnit, WorkoutSet};
pub use normalize::Normalizer;
pub use pipeline::{NormalizedRun, OutputPaths, Pipeline, RunSummary, SkippedRecord};
pub use stats::{AggregateReport, Aggregator, DailySummary, ExerciseLifetimeStat, WeeklySummary};
pub use storage::{Config, WeekStart};
