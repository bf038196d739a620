//! In-memory row stores for the plan popup and the detail popup.
//!
//! Each store owns its rows in render order plus the monotonic id
//! generator that mints row identities. Mutation goes through typed
//! setters that enforce the immutability rules (locked rows, accepted step
//! numbers); deletion policy is the caller's concern via
//! [`crate::state::StepStateMachine`].

pub mod detail;
pub mod plan;

use thiserror::Error;

pub use detail::DetailStore;
pub use plan::{PAGE_ROWS, PlanStore};

/// Errors raised by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no row at index {index}")]
    RowNotFound { index: usize },

    #[error("row {index} is locked and cannot be edited")]
    RowImmutable { index: usize },

    #[error("row {index} has a saved step number that can no longer change")]
    StepImmutable { index: usize },
}
