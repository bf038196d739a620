//! Ordered collection of plan-step rows.

use crate::codec::PlanRecord;
use crate::model::{IdGenerator, PlanStep, StepStatus};
use crate::sequence;

use super::StoreError;

/// Number of rows the plan popup shows when it opens; persisted rows fill
/// in from the top and blank rows pad the rest.
pub const PAGE_ROWS: usize = 10;

/// Ordered collection of plan-step rows with its own id generator.
#[derive(Debug, Default)]
pub struct PlanStore {
    rows: Vec<PlanStep>,
    ids: IdGenerator,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store the way the popup opens: persisted records first
    /// (marked persisted, step numbers frozen), padded with blank rows up
    /// to a page.
    pub fn open_with(records: &[PlanRecord]) -> Self {
        let mut store = Self::new();
        for record in records.iter().take(PAGE_ROWS) {
            let id = store.ids.mint();
            let mut row = PlanStep::new(id);
            row.step_number = record.step_number;
            row.advised_details = record.advised_details.clone();
            row.op_sequence = record.op_sequence.clone();
            row.advised_date = record.advised_date.clone();
            row.status = record.status;
            row.comment = record.comment.clone();
            row.persisted = true;
            row.step_locked = record.step_number.is_some();
            // A row that was saved as confirmed stays out of detail
            // selection forever.
            row.detail_selection_disabled = record.status == StepStatus::Confirmed;
            store.rows.push(row);
        }
        while store.rows.len() < PAGE_ROWS {
            let id = store.ids.mint();
            store.rows.push(PlanStep::new(id));
        }
        store
    }

    pub fn rows(&self) -> &[PlanStep] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PlanStep> {
        self.rows.get(index)
    }

    /// Append a fresh row carrying the non-authoritative default step
    /// number (row count + 1). Returns its index.
    pub fn add_row(&mut self) -> usize {
        let suggested = sequence::suggest_next(&self.rows);
        let id = self.ids.mint();
        let mut row = PlanStep::new(id);
        row.step_number = Some(suggested);
        self.rows.push(row);
        self.rows.len() - 1
    }

    fn editable_row(&mut self, index: usize) -> Result<&mut PlanStep, StoreError> {
        let row = self
            .rows
            .get_mut(index)
            .ok_or(StoreError::RowNotFound { index })?;
        if !row.fields_editable() {
            return Err(StoreError::RowImmutable { index });
        }
        Ok(row)
    }

    /// Set the step number; rejected once a save has accepted the row.
    pub fn set_step_number(
        &mut self,
        index: usize,
        step: Option<u16>,
    ) -> Result<(), StoreError> {
        let row = self.editable_row(index)?;
        if row.step_locked {
            return Err(StoreError::StepImmutable { index });
        }
        row.step_number = step;
        Ok(())
    }

    pub fn set_advised_details(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.editable_row(index)?.advised_details = text.into();
        Ok(())
    }

    pub fn set_op_sequence(
        &mut self,
        index: usize,
        slot: usize,
        code: impl Into<String>,
    ) -> Result<(), StoreError> {
        let row = self.editable_row(index)?;
        if slot >= row.op_sequence.len() {
            return Err(StoreError::RowNotFound { index });
        }
        row.op_sequence[slot] = code.into();
        Ok(())
    }

    pub fn set_advised_date(
        &mut self,
        index: usize,
        date: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.editable_row(index)?.advised_date = date.into();
        Ok(())
    }

    pub fn set_comment(&mut self, index: usize, text: impl Into<String>) -> Result<(), StoreError> {
        self.editable_row(index)?.comment = text.into();
        Ok(())
    }

    /// Raw mutable access for the state machine; status transitions keep
    /// their own rules.
    pub(crate) fn row_mut(&mut self, index: usize) -> Result<&mut PlanStep, StoreError> {
        self.rows
            .get_mut(index)
            .ok_or(StoreError::RowNotFound { index })
    }

    /// Remove a row unconditionally and return it. Policy checks happen
    /// before this is called.
    pub fn remove(&mut self, index: usize) -> Result<PlanStep, StoreError> {
        if index >= self.rows.len() {
            return Err(StoreError::RowNotFound { index });
        }
        let row = self.rows.remove(index);
        tracing::debug!(row_id = %row.id, step = ?row.step_number, "plan row removed");
        Ok(row)
    }

    /// Freeze the step numbers of rows a validation pass accepted. Runs
    /// before the persistence call; the numbers stay frozen even if the
    /// call then fails.
    pub fn freeze_steps(&mut self, accepted: &[usize]) {
        for &idx in accepted {
            if let Some(row) = self.rows.get_mut(idx) {
                row.step_locked = true;
            }
        }
    }

    /// Mark rows as existing on the backend after a successful save.
    pub fn mark_persisted(&mut self, accepted: &[usize]) {
        for &idx in accepted {
            if let Some(row) = self.rows.get_mut(idx) {
                row.persisted = true;
            }
        }
    }

    pub(crate) fn rows_mut_slice(&mut self) -> &mut [PlanStep] {
        &mut self.rows
    }
}
