//! Ordered collections backing the detail popup: the plan rows selected
//! for detailing plus the detail rows entered under them.

use crate::model::{DetailStep, IdGenerator, PlanStep};

use super::StoreError;

/// Row stores for the detail popup.
#[derive(Debug, Default)]
pub struct DetailStore {
    plan_rows: Vec<PlanStep>,
    detail_rows: Vec<DetailStep>,
    ids: IdGenerator,
}

impl DetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the popup for a set of plan rows (clones; the main store keeps
    /// the originals).
    pub fn open_for(&mut self, parents: Vec<PlanStep>) {
        self.plan_rows = parents;
        self.detail_rows.clear();
    }

    pub fn plan_rows(&self) -> &[PlanStep] {
        &self.plan_rows
    }

    pub fn detail_rows(&self) -> &[DetailStep] {
        &self.detail_rows
    }

    /// Append a fresh detail row stamped with the visit date. Returns its
    /// index.
    pub fn add_row(&mut self, visit_date: impl Into<String>) -> usize {
        let id = self.ids.mint();
        self.detail_rows.push(DetailStep::new(id, visit_date));
        self.detail_rows.len() - 1
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut DetailStep, StoreError> {
        self.detail_rows
            .get_mut(index)
            .ok_or(StoreError::RowNotFound { index })
    }

    pub fn set_parent_step(&mut self, index: usize, step: Option<u16>) -> Result<(), StoreError> {
        self.row_mut(index)?.parent_step = step;
        Ok(())
    }

    pub fn set_detail_number(
        &mut self,
        index: usize,
        number: Option<u16>,
    ) -> Result<(), StoreError> {
        self.row_mut(index)?.detail_number = number;
        Ok(())
    }

    pub fn set_actual_treatment(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.row_mut(index)?.actual_treatment = text.into();
        Ok(())
    }

    pub fn set_remark(&mut self, index: usize, text: impl Into<String>) -> Result<(), StoreError> {
        self.row_mut(index)?.remark = text.into();
        Ok(())
    }

    /// Detail rows delete unconditionally, whatever the parent's status.
    pub fn remove_row(&mut self, index: usize) -> Result<DetailStep, StoreError> {
        if index >= self.detail_rows.len() {
            return Err(StoreError::RowNotFound { index });
        }
        let row = self.detail_rows.remove(index);
        tracing::debug!(row_id = %row.id, parent = ?row.parent_step, "detail row removed");
        Ok(row)
    }

    /// Cascade helper: drop every detail row under the given parent step.
    /// Returns how many rows were removed.
    pub fn remove_children_of(&mut self, parent: u16) -> usize {
        let before = self.detail_rows.len();
        self.detail_rows.retain(|r| r.parent_step != Some(parent));
        before - self.detail_rows.len()
    }

    /// Mark the accepted rows of a successful save.
    pub fn mark_saved(&mut self, accepted_details: &[usize]) {
        for &idx in accepted_details {
            if let Some(row) = self.detail_rows.get_mut(idx) {
                row.persisted = true;
            }
        }
    }

    pub(crate) fn plan_rows_mut_slice(&mut self) -> &mut [PlanStep] {
        &mut self.plan_rows
    }
}
