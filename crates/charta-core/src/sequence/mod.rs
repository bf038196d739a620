//! Step-number range and uniqueness checks.
//!
//! Step numbers live in 1–999 and must be unique among the non-blank rows
//! of a batch. The uniqueness scan walks rows in their given order, so the
//! earlier of two duplicates wins and the violation is reported against the
//! later row.

use thiserror::Error;

use crate::model::PlanStep;

/// Inclusive upper bound for step and detail numbers.
pub const MAX_STEP_NUMBER: u16 = 999;

/// Errors raised by the sequence checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("step number {value} at row {row} is out of range (1-{MAX_STEP_NUMBER})")]
    StepOutOfRange { row: usize, value: u16 },

    #[error("duplicate step number {value} at row {row}")]
    DuplicateStep { row: usize, value: u16 },
}

/// Non-authoritative default step number for a newly added row: one past
/// the current row count.
pub fn suggest_next(rows: &[PlanStep]) -> u16 {
    (rows.len() as u16).saturating_add(1)
}

/// Range check for a single step number. `row` is the 1-based display row
/// used in the error.
pub fn check_range(row: usize, n: u16) -> Result<(), SequenceError> {
    if (1..=MAX_STEP_NUMBER).contains(&n) {
        Ok(())
    } else {
        Err(SequenceError::StepOutOfRange { row, value: n })
    }
}

/// Pairwise uniqueness scan over the non-blank step numbers of `rows`.
///
/// Fails on the first duplicate encountered in row order; the reported row
/// is the later of the pair.
pub fn check_unique(rows: &[PlanStep]) -> Result<(), SequenceError> {
    let mut seen: Vec<u16> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(n) = row.step_number else { continue };
        if seen.contains(&n) {
            return Err(SequenceError::DuplicateStep {
                row: idx + 1,
                value: n,
            });
        }
        seen.push(n);
    }
    Ok(())
}
