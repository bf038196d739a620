//! Detail-batch validation: the save-time rule evaluation for the detail
//! popup, covering both its plan rows and its detail rows.
//!
//! Phases, short-circuiting on the first failure:
//!
//! 1. Pairwise step-number duplicate check across the plan rows shown in
//!    the popup (separate from the main plan batch).
//! 2. Per detail row: detail-number range check.
//! 3. Pairwise (parent, detail-number) composite uniqueness across all
//!    detail rows where both are present.
//! 4. Per detail row: a detail number requires an actual treatment.
//! 5. At least one accepted plan row and at least one accepted detail row.

use crate::codec::{self, DetailRecord, PlanRecord};
use crate::model::{DetailStep, PlanStep};
use crate::sequence;

use super::ValidationError;
use super::plan::plan_row_accepts;

/// Result of a successful detail-batch validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailBatchOutcome {
    /// 0-based indices of the accepted plan rows.
    pub accepted_plan: Vec<usize>,
    /// 0-based indices of the accepted detail rows.
    pub accepted_details: Vec<usize>,
    /// Accepted plan rows in wire form.
    pub plan_wire: String,
    /// Accepted detail rows in wire form.
    pub detail_wire: String,
}

/// Validate the detail popup's plan and detail rows and serialize both
/// accepted sets.
pub fn validate_detail_batch(
    plan_rows: &[PlanStep],
    detail_rows: &[DetailStep],
) -> Result<DetailBatchOutcome, ValidationError> {
    // 1. Parent step numbers must be unique within the popup.
    sequence::check_unique(plan_rows)?;

    // 2. Range check every detail number present.
    for (idx, row) in detail_rows.iter().enumerate() {
        if let Some(n) = row.detail_number {
            if !(1..=sequence::MAX_STEP_NUMBER).contains(&n) {
                return Err(ValidationError::DetailOutOfRange {
                    row: idx + 1,
                    value: n,
                });
            }
        }
    }

    // 3. Composite (parent, number) uniqueness across the batch.
    let mut seen: Vec<(u16, u16)> = Vec::new();
    for (idx, row) in detail_rows.iter().enumerate() {
        let (Some(parent), Some(number)) = (row.parent_step, row.detail_number) else {
            continue;
        };
        if seen.contains(&(parent, number)) {
            return Err(ValidationError::DuplicateDetail {
                row: idx + 1,
                parent,
                number,
            });
        }
        seen.push((parent, number));
    }

    // 4. A detail number without a treatment is incomplete.
    for (idx, row) in detail_rows.iter().enumerate() {
        if row.detail_number.is_some() && row.actual_treatment.trim().is_empty() {
            return Err(ValidationError::EmptyTreatment { row: idx + 1 });
        }
    }

    // 5. Both sides of the popup must contribute at least one accepted row.
    let accepted_plan: Vec<usize> = plan_rows
        .iter()
        .enumerate()
        .filter(|(_, row)| plan_row_accepts(row))
        .map(|(idx, _)| idx)
        .collect();
    if accepted_plan.is_empty() {
        return Err(ValidationError::EmptyPlan);
    }

    let accepted_details: Vec<usize> = detail_rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.parent_step.is_some()
                && row.detail_number.is_some()
                && !row.actual_treatment.trim().is_empty()
        })
        .map(|(idx, _)| idx)
        .collect();
    if accepted_details.is_empty() {
        return Err(ValidationError::EmptyDetail);
    }

    let plan_records: Vec<PlanRecord> = accepted_plan
        .iter()
        .map(|&idx| PlanRecord::from(&plan_rows[idx]))
        .collect();
    let detail_records: Vec<DetailRecord> = accepted_details
        .iter()
        .map(|&idx| DetailRecord::from(&detail_rows[idx]))
        .collect();

    Ok(DetailBatchOutcome {
        accepted_plan,
        accepted_details,
        plan_wire: codec::encode_plan(&plan_records),
        detail_wire: codec::encode_detail(&detail_records),
    })
}
