//! Plan-step status state machine.
//!
//! Validates and executes status transitions for plan rows, enforcing the
//! allowed transition graph, the lock-confirmation requirement, and the
//! delete policy tied to the lifecycle.
//!
//! ```text
//! unselected -> confirmed | active | locked
//! confirmed  -> unselected | active | locked
//! active     -> unselected | confirmed | locked
//! locked     -> (terminal)
//! ```
//!
//! Transitions occur only through an explicit row-level save action, never
//! automatically. Entering `confirmed` permanently disables the row as a
//! detail-batch parent; entering `locked` requires explicit confirmation
//! and freezes every field on the row.

use thiserror::Error;

use crate::model::{PlanStep, StepStatus};

/// Whether the user confirmed the prompt shown before locking a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockConfirmation {
    Declined,
    Confirmed,
}

/// Errors raised by status transitions and the delete policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("step {step:?} is locked; its status can no longer change")]
    RowLocked { step: Option<u16> },

    #[error("locking a step requires explicit confirmation")]
    LockNotConfirmed,

    #[error("step {step} cannot be deleted while its status is {status}")]
    DeleteRejected { step: u16, status: StepStatus },
}

/// The plan-step state machine.
pub struct StepStateMachine;

impl StepStateMachine {
    /// Check whether a transition from `from` to `to` is a valid edge in
    /// the state graph. `Locked` is terminal; everything else may move
    /// anywhere via a row save.
    pub fn is_valid_transition(from: StepStatus, _to: StepStatus) -> bool {
        from != StepStatus::Locked
    }

    /// Execute a status transition on a row.
    ///
    /// - Rejects any transition out of `Locked`.
    /// - Entering `Locked` requires [`LockConfirmation::Confirmed`].
    /// - Entering `Confirmed` sets the sticky selector-disable flag.
    pub fn transition(
        row: &mut PlanStep,
        to: StepStatus,
        confirm: LockConfirmation,
    ) -> Result<(), StateError> {
        if !Self::is_valid_transition(row.status, to) {
            return Err(StateError::RowLocked {
                step: row.step_number,
            });
        }

        if to == StepStatus::Locked && confirm != LockConfirmation::Confirmed {
            return Err(StateError::LockNotConfirmed);
        }

        let from = row.status;
        row.status = to;
        if to == StepStatus::Confirmed {
            row.detail_selection_disabled = true;
        }

        tracing::info!(
            row_id = %row.id,
            step = ?row.step_number,
            %from,
            %to,
            "plan step status changed"
        );
        Ok(())
    }

    /// Delete policy: a row with a step number cannot be deleted while its
    /// status is `Active` or `Locked`.
    pub fn check_deletable(row: &PlanStep) -> Result<(), StateError> {
        match (row.status, row.step_number) {
            (StepStatus::Active | StepStatus::Locked, Some(step)) => {
                Err(StateError::DeleteRejected {
                    step,
                    status: row.status,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RowId;

    fn row_with_status(status: StepStatus) -> PlanStep {
        let mut row = PlanStep::new(RowId(0));
        row.step_number = Some(1);
        row.status = status;
        row
    }

    #[test]
    fn locked_is_terminal() {
        for to in [
            StepStatus::Unselected,
            StepStatus::Confirmed,
            StepStatus::Active,
            StepStatus::Locked,
        ] {
            assert!(!StepStateMachine::is_valid_transition(
                StepStatus::Locked,
                to
            ));
        }
    }

    #[test]
    fn unlocked_states_move_freely() {
        for from in [
            StepStatus::Unselected,
            StepStatus::Confirmed,
            StepStatus::Active,
        ] {
            for to in [
                StepStatus::Unselected,
                StepStatus::Confirmed,
                StepStatus::Active,
                StepStatus::Locked,
            ] {
                assert!(StepStateMachine::is_valid_transition(from, to));
            }
        }
    }

    #[test]
    fn transition_out_of_locked_is_rejected() {
        let mut row = row_with_status(StepStatus::Locked);
        let err = StepStateMachine::transition(
            &mut row,
            StepStatus::Active,
            LockConfirmation::Confirmed,
        )
        .unwrap_err();
        assert_eq!(err, StateError::RowLocked { step: Some(1) });
    }

    #[test]
    fn locking_requires_confirmation() {
        let mut row = row_with_status(StepStatus::Active);
        assert_eq!(
            StepStateMachine::transition(&mut row, StepStatus::Locked, LockConfirmation::Declined),
            Err(StateError::LockNotConfirmed)
        );
        assert_eq!(row.status, StepStatus::Active);

        StepStateMachine::transition(&mut row, StepStatus::Locked, LockConfirmation::Confirmed)
            .expect("confirmed lock should apply");
        assert_eq!(row.status, StepStatus::Locked);
    }

    #[test]
    fn confirming_disables_detail_selection_permanently() {
        let mut row = row_with_status(StepStatus::Unselected);
        StepStateMachine::transition(&mut row, StepStatus::Confirmed, LockConfirmation::Declined)
            .expect("should apply");
        assert!(row.detail_selection_disabled);

        // Moving back to Active does not re-enable selection.
        StepStateMachine::transition(&mut row, StepStatus::Active, LockConfirmation::Declined)
            .expect("should apply");
        assert!(!row.selector_enabled());
    }

    #[test]
    fn delete_policy_follows_status_and_step() {
        assert!(
            StepStateMachine::check_deletable(&row_with_status(StepStatus::Unselected)).is_ok()
        );
        assert!(StepStateMachine::check_deletable(&row_with_status(StepStatus::Confirmed)).is_ok());
        assert!(StepStateMachine::check_deletable(&row_with_status(StepStatus::Active)).is_err());
        assert!(StepStateMachine::check_deletable(&row_with_status(StepStatus::Locked)).is_err());

        // Without a step number the delete always proceeds.
        let mut no_step = row_with_status(StepStatus::Locked);
        no_step.step_number = None;
        assert!(StepStateMachine::check_deletable(&no_step).is_ok());
    }
}
