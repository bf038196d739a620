//! The workflow orchestrator: composes the stores, validation, codec,
//! attachment checks, the status state machine, and the renumber policy
//! into the open/save/delete use cases of a visit session.
//!
//! One orchestrator instance is one interactive session. Every mutating
//! method takes `&mut self` and every persistence call is awaited before
//! returning, so no overlapping mutation can occur while a call is
//! pending. Validation failures abort a save before any network traffic;
//! transport failures surface classified and leave the local rows intact.

use std::sync::Arc;

use crate::attach::{self, AttachmentError};
use crate::backend::{
    LoadedVisit, PersistenceBackend, SaveDetailRequest, SavePlanRequest, TransportError,
};
use crate::codec::{self, CodecError, DetailRecord};
use crate::model::{Attachment, AttachmentOrigin, StatusOption, StepStatus, VisitKey};
use crate::renumber;
use crate::state::{LockConfirmation, StateError, StepStateMachine};
use crate::store::{DetailStore, PlanStore, StoreError};
use crate::validate::{self, ValidationError};

/// Errors surfaced by workflow operations. Exactly one at a time; all are
/// recoverable within the session.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("backend returned malformed data: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("row {index} cannot be selected for detailing")]
    NotSelectable { index: usize },

    #[error("no attachment named {name:?}")]
    AttachmentNotFound { name: String },
}

/// Prepend the synthetic `--Select--` entry to a provider response. The
/// placeholder is always first, whatever the backend returned.
pub fn prepend_placeholder(provided: Vec<StatusOption>) -> Vec<StatusOption> {
    let mut options = Vec::with_capacity(provided.len() + 1);
    options.push(StatusOption::placeholder());
    options.extend(provided);
    options
}

/// A visit session over the treatment-plan workflow.
pub struct TreatmentWorkflow {
    key: VisitKey,
    backend: Arc<dyn PersistenceBackend>,
    plan: PlanStore,
    details: DetailStore,
    /// Detail rows already persisted for the visit, rehydrated into the
    /// popup when their parent is selected.
    loaded_details: Vec<DetailRecord>,
    /// Filenames of attachments the backend already holds.
    persisted_attachments: Vec<String>,
    /// Locally staged attachment batch; replaced wholesale on each
    /// selection.
    staged_attachments: Vec<Attachment>,
    /// Set by the load and by every successful save; gates renumbering.
    anything_persisted: bool,
}

impl std::fmt::Debug for TreatmentWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreatmentWorkflow")
            .field("key", &self.key)
            .field("backend", &"<dyn PersistenceBackend>")
            .field("plan", &self.plan)
            .field("details", &self.details)
            .field("loaded_details", &self.loaded_details)
            .field("persisted_attachments", &self.persisted_attachments)
            .field("staged_attachments", &self.staged_attachments)
            .field("anything_persisted", &self.anything_persisted)
            .finish()
    }
}

impl TreatmentWorkflow {
    /// Open a visit: fetch persisted rows, fill the plan page, and record
    /// whether anything is already persisted.
    pub async fn open(
        backend: Arc<dyn PersistenceBackend>,
        key: VisitKey,
    ) -> Result<Self, WorkflowError> {
        let LoadedVisit {
            plan_wire,
            detail_wire,
            attachment_names,
        } = backend.load_visit(&key).await?;

        let plan_records = codec::decode_plan(&plan_wire)?;
        let loaded_details = codec::decode_detail(&detail_wire)?;
        let anything_persisted = !plan_records.is_empty();

        tracing::info!(
            patient = %key.patient_id,
            visit = %key.visit_number,
            plan_rows = plan_records.len(),
            detail_rows = loaded_details.len(),
            attachments = attachment_names.len(),
            "visit opened"
        );

        Ok(Self {
            key,
            backend,
            plan: PlanStore::open_with(&plan_records),
            details: DetailStore::new(),
            loaded_details,
            persisted_attachments: attachment_names,
            staged_attachments: Vec::new(),
            anything_persisted,
        })
    }

    pub fn key(&self) -> &VisitKey {
        &self.key
    }

    pub fn plan(&self) -> &PlanStore {
        &self.plan
    }

    pub fn plan_mut(&mut self) -> &mut PlanStore {
        &mut self.plan
    }

    pub fn details(&self) -> &DetailStore {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut DetailStore {
        &mut self.details
    }

    pub fn anything_persisted(&self) -> bool {
        self.anything_persisted
    }

    pub fn staged_attachments(&self) -> &[Attachment] {
        &self.staged_attachments
    }

    pub fn persisted_attachments(&self) -> &[String] {
        &self.persisted_attachments
    }

    // -----------------------------------------------------------------
    // Plan rows
    // -----------------------------------------------------------------

    /// The explicit row-level save action that drives the status state
    /// machine.
    pub fn set_status(
        &mut self,
        index: usize,
        to: StepStatus,
        confirm: LockConfirmation,
    ) -> Result<(), WorkflowError> {
        let row = self.plan.row_mut(index)?;
        StepStateMachine::transition(row, to, confirm)?;
        Ok(())
    }

    /// Validate the plan batch, serialize the accepted rows, and persist
    /// them together with the staged attachment batch.
    pub async fn save_plan(&mut self) -> Result<(), WorkflowError> {
        let outcome = validate::validate_plan_batch(self.plan.rows())?;

        // Accepted step numbers are immutable from this point, even if the
        // transport call below fails.
        self.plan.freeze_steps(&outcome.accepted);

        let request = SavePlanRequest {
            key: self.key.clone(),
            plan_wire: outcome.wire,
            attachment_names: self
                .staged_attachments
                .iter()
                .map(|a| a.file_name.trim().to_owned())
                .collect(),
        };

        self.backend.save_plan(&request).await?;

        self.plan.mark_persisted(&outcome.accepted);
        self.anything_persisted = true;
        for name in request.attachment_names {
            self.persisted_attachments.push(name);
        }
        self.staged_attachments.clear();

        tracing::info!(
            patient = %self.key.patient_id,
            visit = %self.key.visit_number,
            accepted = outcome.accepted.len(),
            "plan batch saved"
        );
        Ok(())
    }

    /// Delete a plan row: policy check, backend delete for persisted rows,
    /// cascade to its detail rows, then the pre-persistence renumber pass.
    pub async fn delete_plan_row(&mut self, index: usize) -> Result<(), WorkflowError> {
        let row = self
            .plan
            .get(index)
            .ok_or(StoreError::RowNotFound { index })?;
        StepStateMachine::check_deletable(row)?;

        if row.persisted {
            if let Some(step) = row.step_number {
                self.backend.delete_plan_step(&self.key, step).await?;
            }
        }

        let removed = self.plan.remove(index)?;
        if let Some(step) = removed.step_number {
            let cascaded = self.details.remove_children_of(step);
            self.loaded_details.retain(|r| r.parent_step != Some(step));
            if cascaded > 0 {
                tracing::info!(step, cascaded, "cascaded detail rows removed");
            }
        }

        if !self.anything_persisted {
            renumber::reindex_by_position(self.plan.rows_mut_slice());
            renumber::reindex_by_position(self.details.plan_rows_mut_slice());
        }

        Ok(())
    }

    // -----------------------------------------------------------------
    // Detail rows
    // -----------------------------------------------------------------

    /// Open the detail popup for the given plan rows. Each index must be
    /// selectable (active status, never confirmed). Persisted detail rows
    /// under the selected parents are rehydrated into the popup.
    pub fn select_for_detail(&mut self, indices: &[usize]) -> Result<(), WorkflowError> {
        let mut parents = Vec::with_capacity(indices.len());
        for &index in indices {
            let row = self
                .plan
                .get(index)
                .ok_or(StoreError::RowNotFound { index })?;
            if !row.selector_enabled() {
                return Err(WorkflowError::NotSelectable { index });
            }
            parents.push(row.clone());
        }

        let selected_steps: Vec<u16> = parents.iter().filter_map(|r| r.step_number).collect();
        self.details.open_for(parents);

        let visit_date = self.visit_date_stamp();
        for record in &self.loaded_details {
            let Some(parent) = record.parent_step else {
                continue;
            };
            if !selected_steps.contains(&parent) {
                continue;
            }
            let idx = self.details.add_row(visit_date.clone());
            self.details.set_parent_step(idx, record.parent_step)?;
            self.details.set_detail_number(idx, record.detail_number)?;
            self.details
                .set_actual_treatment(idx, record.actual_treatment.clone())?;
            self.details.set_remark(idx, record.remark.clone())?;
            self.details.mark_saved(&[idx]);
        }

        Ok(())
    }

    /// Append a fresh detail row stamped with the visit date.
    pub fn add_detail_row(&mut self) -> usize {
        let stamp = self.visit_date_stamp();
        self.details.add_row(stamp)
    }

    /// Validate the detail popup and persist both its accepted row sets.
    pub async fn save_details(&mut self) -> Result<(), WorkflowError> {
        let outcome =
            validate::validate_detail_batch(self.details.plan_rows(), self.details.detail_rows())?;

        let request = SaveDetailRequest {
            key: self.key.clone(),
            plan_wire: outcome.plan_wire,
            detail_wire: outcome.detail_wire,
        };

        self.backend.save_details(&request).await?;

        self.details.mark_saved(&outcome.accepted_details);
        self.anything_persisted = true;

        tracing::info!(
            patient = %self.key.patient_id,
            visit = %self.key.visit_number,
            accepted = outcome.accepted_details.len(),
            "detail batch saved"
        );
        Ok(())
    }

    /// Delete a detail row. Deletion is unconditional regardless of the
    /// parent's status; persisted rows are removed on the backend first.
    pub async fn delete_detail_row(&mut self, index: usize) -> Result<(), WorkflowError> {
        let row = self
            .details
            .detail_rows()
            .get(index)
            .ok_or(StoreError::RowNotFound { index })?;

        if row.persisted {
            if let (Some(parent), Some(number)) = (row.parent_step, row.detail_number) {
                self.backend
                    .delete_detail_step(&self.key, parent, number)
                    .await?;
                self.loaded_details.retain(|r| {
                    !(r.parent_step == Some(parent) && r.detail_number == Some(number))
                });
            }
        }

        self.details.remove_row(index)?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Attachments
    // -----------------------------------------------------------------

    /// Validate a candidate attachment selection and replace -- not append
    /// to -- the staged batch.
    pub fn stage_attachments(&mut self, files: Vec<Attachment>) -> Result<(), WorkflowError> {
        attach::validate_batch(&files, &self.persisted_attachments)?;
        self.staged_attachments = files;
        Ok(())
    }

    /// Remove an attachment by its filename label: staged files drop
    /// locally, persisted files are deleted on the backend.
    pub async fn delete_attachment(&mut self, name: &str) -> Result<(), WorkflowError> {
        let name = name.trim();

        if let Some(pos) = self
            .staged_attachments
            .iter()
            .position(|a| a.file_name.trim() == name)
        {
            self.staged_attachments.remove(pos);
            return Ok(());
        }

        if let Some(pos) = self
            .persisted_attachments
            .iter()
            .position(|n| n.trim() == name)
        {
            self.backend.delete_attachment(&self.key, name).await?;
            self.persisted_attachments.remove(pos);
            return Ok(());
        }

        Err(WorkflowError::AttachmentNotFound {
            name: name.to_owned(),
        })
    }

    // -----------------------------------------------------------------
    // Status options
    // -----------------------------------------------------------------

    /// Fetch the status dropdown entries with the synthetic placeholder
    /// always prepended.
    pub async fn status_options(&self) -> Result<Vec<StatusOption>, WorkflowError> {
        let provided = self.backend.status_options().await?;
        Ok(prepend_placeholder(provided))
    }

    // -----------------------------------------------------------------

    /// Visit date stamped onto new detail rows: the key's visit date, or
    /// today when the key carries none.
    fn visit_date_stamp(&self) -> String {
        let date = self.key.visit_date.trim();
        if date.is_empty() {
            chrono::Local::now().format("%d-%b-%Y").to_string()
        } else {
            date.to_owned()
        }
    }

    /// Convenience for callers staging plain filenames.
    pub fn stage_attachment_names<I, S>(&mut self, names: I) -> Result<(), WorkflowError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files: Vec<Attachment> = names
            .into_iter()
            .map(|n| Attachment::new(n, AttachmentOrigin::New))
            .collect();
        self.stage_attachments(files)
    }
}
