//! Shared test utilities for charta integration tests.
//!
//! Provides [`MockBackend`], a recording in-memory implementation of
//! [`PersistenceBackend`]: tests script what a load returns and whether the
//! next call fails, then assert on the recorded request sequence.

use std::sync::Mutex;

use async_trait::async_trait;

use charta_core::backend::{
    LoadedVisit, PersistenceBackend, SaveDetailRequest, SavePlanRequest, TransportError,
};
use charta_core::model::{StatusOption, VisitKey};

/// One recorded backend call, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    LoadVisit,
    SavePlan(SavePlanRequest),
    SaveDetails(SaveDetailRequest),
    DeletePlanStep(u16),
    DeleteDetailStep { parent: u16, number: u16 },
    DeleteAttachment(String),
    StatusOptions,
}

#[derive(Debug, Default)]
struct MockState {
    loaded: LoadedVisit,
    options: Vec<StatusOption>,
    fail_next: Option<TransportError>,
    calls: Vec<BackendCall>,
}

/// Recording mock persistence backend.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script what [`PersistenceBackend::load_visit`] returns.
    pub fn with_loaded(loaded: LoadedVisit) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().loaded = loaded;
        backend
    }

    /// Script what [`PersistenceBackend::status_options`] returns.
    pub fn set_status_options(&self, options: Vec<StatusOption>) {
        self.state.lock().unwrap().options = options;
    }

    /// Make the next backend call fail with the given error.
    pub fn fail_next(&self, error: TransportError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: BackendCall) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load_visit(&self, _key: &VisitKey) -> Result<LoadedVisit, TransportError> {
        self.record(BackendCall::LoadVisit)?;
        Ok(self.state.lock().unwrap().loaded.clone())
    }

    async fn save_plan(&self, request: &SavePlanRequest) -> Result<(), TransportError> {
        self.record(BackendCall::SavePlan(request.clone()))
    }

    async fn save_details(&self, request: &SaveDetailRequest) -> Result<(), TransportError> {
        self.record(BackendCall::SaveDetails(request.clone()))
    }

    async fn delete_plan_step(&self, _key: &VisitKey, step: u16) -> Result<(), TransportError> {
        self.record(BackendCall::DeletePlanStep(step))
    }

    async fn delete_detail_step(
        &self,
        _key: &VisitKey,
        parent: u16,
        number: u16,
    ) -> Result<(), TransportError> {
        self.record(BackendCall::DeleteDetailStep { parent, number })
    }

    async fn delete_attachment(
        &self,
        _key: &VisitKey,
        file_name: &str,
    ) -> Result<(), TransportError> {
        self.record(BackendCall::DeleteAttachment(file_name.to_owned()))
    }

    async fn status_options(&self) -> Result<Vec<StatusOption>, TransportError> {
        self.record(BackendCall::StatusOptions)?;
        Ok(self.state.lock().unwrap().options.clone())
    }
}

/// A visit key with placeholder identifiers, for tests that don't care.
pub fn test_visit_key() -> VisitKey {
    VisitKey {
        patient_id: "PAT-001".to_owned(),
        doctor_id: "DOC-01".to_owned(),
        clinic_id: "CLN-A".to_owned(),
        shift: "morning".to_owned(),
        visit_number: "7".to_owned(),
        visit_date: "15-Mar-2024".to_owned(),
        user_id: "reception".to_owned(),
    }
}
