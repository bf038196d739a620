//! Batch validation for plan and detail saves.
//!
//! Validation is fail-fast: the first violation aborts the entire batch
//! before anything is serialized or sent, and exactly one error surfaces at
//! a time. Every row-level error carries the 1-based display row and the
//! offending field so a front end can flag and scroll to it.

pub mod detail;
pub mod plan;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::sequence::SequenceError;

pub use detail::{DetailBatchOutcome, validate_detail_batch};
pub use plan::{PlanBatchOutcome, validate_plan_batch};

/// Pattern an advised date must match: `DD-MMM-YYYY`, tolerating `/` as the
/// separator and one- or two-digit days.
static ADVISED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}[-/][A-Za-z]{3}[-/]\d{4}$").expect("date pattern is valid")
});

/// True when `text` is a well-formed advised date.
pub fn advised_date_ok(text: &str) -> bool {
    ADVISED_DATE_RE.is_match(text)
}

/// The field a validation error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StepNumber,
    AdvisedDetails,
    AdvisedDate,
    Status,
    DetailNumber,
    ActualTreatment,
}

/// Errors raised while validating a plan or detail batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate step number {value} at row {row}")]
    DuplicateStep { row: usize, value: u16 },

    #[error("step number {value} at row {row} is out of range (1-999)")]
    StepOutOfRange { row: usize, value: u16 },

    #[error("row {row} has data but no step number")]
    EmptyStep { row: usize },

    #[error("row {row} has advised details but no advised date")]
    EmptyAdvisedDate { row: usize },

    #[error("row {row} advised date {value:?} is not in DD-MMM-YYYY form")]
    DateFormat { row: usize, value: String },

    #[error("row {row} has advised details but no status selected")]
    EmptyStatus { row: usize },

    #[error("row {row} has a step number but no advised details")]
    EmptyAdviceDetail { row: usize },

    #[error("no plan rows to save")]
    EmptyPlan,

    #[error("detail number {value} at row {row} is out of range (1-999)")]
    DetailOutOfRange { row: usize, value: u16 },

    #[error("duplicate detail {parent}/{number} at row {row}")]
    DuplicateDetail {
        row: usize,
        parent: u16,
        number: u16,
    },

    #[error("row {row} has a detail number but no actual treatment")]
    EmptyTreatment { row: usize },

    #[error("no detail rows to save")]
    EmptyDetail,
}

impl ValidationError {
    /// The 1-based display row this error points at, if it is row-level.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::DuplicateStep { row, .. }
            | Self::StepOutOfRange { row, .. }
            | Self::EmptyStep { row }
            | Self::EmptyAdvisedDate { row }
            | Self::DateFormat { row, .. }
            | Self::EmptyStatus { row }
            | Self::EmptyAdviceDetail { row }
            | Self::DetailOutOfRange { row, .. }
            | Self::DuplicateDetail { row, .. }
            | Self::EmptyTreatment { row } => Some(*row),
            Self::EmptyPlan | Self::EmptyDetail => None,
        }
    }

    /// The offending field, if the error is tied to one.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::DuplicateStep { .. } | Self::StepOutOfRange { .. } | Self::EmptyStep { .. } => {
                Some(Field::StepNumber)
            }
            Self::EmptyAdvisedDate { .. } | Self::DateFormat { .. } => Some(Field::AdvisedDate),
            Self::EmptyStatus { .. } => Some(Field::Status),
            Self::EmptyAdviceDetail { .. } => Some(Field::AdvisedDetails),
            Self::DetailOutOfRange { .. } | Self::DuplicateDetail { .. } => {
                Some(Field::DetailNumber)
            }
            Self::EmptyTreatment { .. } => Some(Field::ActualTreatment),
            Self::EmptyPlan | Self::EmptyDetail => None,
        }
    }
}

impl From<SequenceError> for ValidationError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::StepOutOfRange { row, value } => Self::StepOutOfRange { row, value },
            SequenceError::DuplicateStep { row, value } => Self::DuplicateStep { row, value },
        }
    }
}
