//! The `PersistenceBackend` trait -- the adapter interface for the remote
//! service that stores plans, details, and attachments.
//!
//! The trait is intentionally object-safe so the workflow can hold an
//! `Arc<dyn PersistenceBackend>` and tests can substitute a recording
//! mock. Every call is synchronous from the workflow's point of view: the
//! engine awaits the result before allowing any further mutation.

use async_trait::async_trait;

use crate::model::{StatusOption, VisitKey};

use super::types::{LoadedVisit, SaveDetailRequest, SavePlanRequest, TransportError};

/// Adapter interface for the persistence service.
///
/// Implementors translate each call into a backend request and classify
/// failures into [`TransportError`]; they never panic on transport
/// trouble.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Human-readable name for this backend (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch everything persisted for a visit: plan wire, detail wire, and
    /// attachment names.
    async fn load_visit(&self, key: &VisitKey) -> Result<LoadedVisit, TransportError>;

    /// Persist an accepted plan batch together with the staged attachment
    /// names.
    async fn save_plan(&self, request: &SavePlanRequest) -> Result<(), TransportError>;

    /// Persist an accepted detail batch.
    async fn save_details(&self, request: &SaveDetailRequest) -> Result<(), TransportError>;

    /// Delete one persisted plan step.
    async fn delete_plan_step(&self, key: &VisitKey, step: u16) -> Result<(), TransportError>;

    /// Delete one persisted detail step.
    async fn delete_detail_step(
        &self,
        key: &VisitKey,
        parent: u16,
        number: u16,
    ) -> Result<(), TransportError>;

    /// Delete one persisted attachment by its filename label.
    async fn delete_attachment(
        &self,
        key: &VisitKey,
        file_name: &str,
    ) -> Result<(), TransportError>;

    /// Fetch the status dropdown options, in backend order. The engine
    /// prepends the synthetic placeholder itself.
    async fn status_options(&self) -> Result<Vec<StatusOption>, TransportError>;
}

// Compile-time assertion: PersistenceBackend must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PersistenceBackend) {}
};
