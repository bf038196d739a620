//! Plan-batch validation: the save-time rule evaluation for plan rows.
//!
//! Evaluation order, short-circuiting on the first failure across the
//! entire batch:
//!
//! 1. Global pairwise step-number duplicate check.
//! 2. Per row, in order: missing-step, range, then -- for rows that count
//!    (non-blank advised details) -- date presence, date format, status;
//!    rows with a step number but no advised details are rejected.
//! 3. At least one row must have been accepted.

use crate::codec::{self, PlanRecord};
use crate::model::{PlanStep, StepStatus};
use crate::sequence;

use super::{ValidationError, advised_date_ok};

/// Result of a successful plan-batch validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanBatchOutcome {
    /// 0-based indices of the accepted rows, in row order.
    pub accepted: Vec<usize>,
    /// The accepted rows encoded in wire form, ready for the backend.
    pub wire: String,
}

/// Acceptance predicate shared with detail-batch validation: the row
/// carries an in-range step number, advised details, a well-formed advised
/// date, and a selected status.
pub(crate) fn plan_row_accepts(row: &PlanStep) -> bool {
    matches!(row.step_number, Some(n) if (1..=sequence::MAX_STEP_NUMBER).contains(&n))
        && row.counts()
        && advised_date_ok(row.advised_date.trim())
        && row.status != StepStatus::Unselected
}

/// Validate a plan batch and serialize the accepted rows.
pub fn validate_plan_batch(rows: &[PlanStep]) -> Result<PlanBatchOutcome, ValidationError> {
    sequence::check_unique(rows)?;

    let mut accepted = Vec::new();
    let mut records = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let display_row = idx + 1;
        let advised_date = row.advised_date.trim();

        match row.step_number {
            None => {
                // A blank step number is only tolerable on a fully untouched
                // row.
                if row.counts() || !advised_date.is_empty() || row.status != StepStatus::Unselected
                {
                    return Err(ValidationError::EmptyStep { row: display_row });
                }
            }
            Some(n) => {
                sequence::check_range(display_row, n)?;

                if row.counts() {
                    if advised_date.is_empty() {
                        return Err(ValidationError::EmptyAdvisedDate { row: display_row });
                    }
                    if !advised_date_ok(advised_date) {
                        return Err(ValidationError::DateFormat {
                            row: display_row,
                            value: row.advised_date.clone(),
                        });
                    }
                    if row.status == StepStatus::Unselected {
                        return Err(ValidationError::EmptyStatus { row: display_row });
                    }
                    accepted.push(idx);
                    records.push(PlanRecord::from(row));
                } else {
                    return Err(ValidationError::EmptyAdviceDetail { row: display_row });
                }
            }
        }
    }

    if accepted.is_empty() {
        return Err(ValidationError::EmptyPlan);
    }

    Ok(PlanBatchOutcome {
        accepted,
        wire: codec::encode_plan(&records),
    })
}
