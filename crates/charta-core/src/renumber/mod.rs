//! Reindex-by-position pass run after a pre-persistence plan-row delete.
//!
//! Walks rows in their current render order -- not by numeric value -- and
//! reassigns `step_number := position + 1` (1-based) on every row that
//! carries data. Blank filler rows stay blank. The pass only runs while
//! nothing for the visit has been persisted yet; once the backend holds
//! rows, existing numbers are left untouched.

use crate::model::PlanStep;

/// Reassign step numbers to match current render order.
///
/// Rows are numbered by position among *all* rows, so a blank filler row
/// still occupies its slot; it just is not stamped.
pub fn reindex_by_position(rows: &mut [PlanStep]) {
    for (idx, row) in rows.iter_mut().enumerate() {
        if row.is_blank() {
            continue;
        }
        let new_number = (idx as u16) + 1;
        if row.step_number != Some(new_number) {
            tracing::debug!(
                row_id = %row.id,
                old = ?row.step_number,
                new = new_number,
                "step renumbered by position"
            );
        }
        row.step_number = Some(new_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RowId, StepStatus};

    fn row(id: u64, step: u16) -> PlanStep {
        let mut r = PlanStep::new(RowId(id));
        r.step_number = Some(step);
        r.advised_details = format!("advice {step}");
        r.status = StepStatus::Confirmed;
        r
    }

    #[test]
    fn renumbers_to_render_position_after_delete() {
        // Three rows numbered 1,2,3; the middle one is deleted before any
        // persistence. Remaining rows become 1,2.
        let mut rows = vec![row(0, 1), row(1, 2), row(2, 3)];
        rows.remove(1);
        reindex_by_position(&mut rows);
        let numbers: Vec<u16> = rows.iter().filter_map(|r| r.step_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn position_wins_over_prior_labels() {
        let mut rows = vec![row(0, 40), row(1, 7), row(2, 12)];
        reindex_by_position(&mut rows);
        let numbers: Vec<u16> = rows.iter().filter_map(|r| r.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn blank_filler_rows_stay_blank() {
        let mut rows = vec![row(0, 5), PlanStep::new(RowId(1)), row(2, 9)];
        reindex_by_position(&mut rows);
        assert_eq!(rows[0].step_number, Some(1));
        assert_eq!(rows[1].step_number, None);
        // The blank row still holds its slot: the third row is numbered 3.
        assert_eq!(rows[2].step_number, Some(3));
    }
}
