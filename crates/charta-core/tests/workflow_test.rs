//! End-to-end workflow tests against the recording mock backend: open,
//! save, delete, renumber, detailing, and attachment flows.

use std::sync::Arc;

use charta_core::backend::{LoadedVisit, TransportError, TransportKind};
use charta_core::model::{StatusOption, StepStatus};
use charta_core::state::LockConfirmation;
use charta_core::store::{PAGE_ROWS, StoreError};
use charta_core::validate::ValidationError;
use charta_core::workflow::{TreatmentWorkflow, WorkflowError};
use charta_test_utils::{BackendCall, MockBackend, test_visit_key};

async fn open_blank() -> (Arc<MockBackend>, TreatmentWorkflow) {
    let backend = Arc::new(MockBackend::new());
    let workflow = TreatmentWorkflow::open(backend.clone(), test_visit_key())
        .await
        .expect("open should succeed");
    (backend, workflow)
}

/// Fill one plan row through the typed setters.
fn fill_plan_row(
    workflow: &mut TreatmentWorkflow,
    index: usize,
    step: u16,
    advice: &str,
    date: &str,
) {
    let plan = workflow.plan_mut();
    plan.set_step_number(index, Some(step)).unwrap();
    plan.set_advised_details(index, advice).unwrap();
    plan.set_advised_date(index, date).unwrap();
}

// ---------------------------------------------------------------------------
// Open
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_fills_a_blank_page() {
    let (backend, workflow) = open_blank().await;
    assert_eq!(workflow.plan().len(), PAGE_ROWS);
    assert!(!workflow.anything_persisted());
    assert_eq!(backend.calls(), vec![BackendCall::LoadVisit]);
}

#[tokio::test]
async fn open_prefills_persisted_rows() {
    let loaded = LoadedVisit {
        plan_wire: "1#@Scaling#@ #@ #@ #@ #@01-Jan-2024#@2#@ ".to_owned(),
        detail_wire: String::new(),
        attachment_names: vec!["xray.pdf".to_owned()],
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let workflow = TreatmentWorkflow::open(backend, test_visit_key())
        .await
        .unwrap();

    assert!(workflow.anything_persisted());
    let first = &workflow.plan().rows()[0];
    assert_eq!(first.step_number, Some(1));
    assert_eq!(first.advised_details, "Scaling");
    assert_eq!(first.status, StepStatus::Active);
    assert!(first.persisted);
    assert_eq!(workflow.persisted_attachments(), ["xray.pdf".to_owned()]);
}

#[tokio::test]
async fn open_surfaces_malformed_wire() {
    let loaded = LoadedVisit {
        plan_wire: "1#@broken".to_owned(),
        ..Default::default()
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let err = TreatmentWorkflow::open(backend, test_visit_key())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Codec(_)));
}

// ---------------------------------------------------------------------------
// Plan save
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_plan_sends_wire_and_marks_rows() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "Scaling", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();

    workflow.save_plan().await.expect("save should succeed");

    let calls = backend.calls();
    let BackendCall::SavePlan(request) = &calls[1] else {
        panic!("expected a SavePlan call, got {calls:?}");
    };
    assert_eq!(
        request.plan_wire,
        "1#@Scaling#@ #@ #@ #@ #@01-Jan-2024#@2#@ "
    );

    let row = &workflow.plan().rows()[0];
    assert!(row.persisted);
    assert!(row.step_locked);
    assert!(workflow.anything_persisted());
}

#[tokio::test]
async fn validation_failure_never_reaches_the_backend() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();
    fill_plan_row(&mut workflow, 1, 1, "B", "02-Jan-2024");
    workflow
        .set_status(1, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();

    let err = workflow.save_plan().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::DuplicateStep { row: 2, value: 1 })
    ));
    // Only the initial load went out; no partial state was sent.
    assert_eq!(backend.calls(), vec![BackendCall::LoadVisit]);
}

#[tokio::test]
async fn transport_failure_is_recoverable() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "Scaling", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();

    backend.fail_next(TransportError::from_status(500, "backend down"));
    let err = workflow.save_plan().await.unwrap_err();
    match err {
        WorkflowError::Transport(t) => assert_eq!(t.kind, TransportKind::Server),
        other => panic!("expected a transport error, got {other}"),
    }

    // Rows were not marked persisted, and the same save succeeds once the
    // backend recovers.
    assert!(!workflow.plan().rows()[0].persisted);
    assert!(!workflow.anything_persisted());
    workflow.save_plan().await.expect("retry should succeed");
    assert!(workflow.plan().rows()[0].persisted);
}

#[tokio::test]
async fn accepted_step_numbers_freeze_even_when_transport_fails() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "Scaling", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();

    backend.fail_next(TransportError::new(TransportKind::Timeout, "timed out"));
    workflow.save_plan().await.unwrap_err();

    assert_eq!(
        workflow.plan_mut().set_step_number(0, Some(9)),
        Err(StoreError::StepImmutable { index: 0 })
    );
}

// ---------------------------------------------------------------------------
// Delete and renumber
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_rejected_for_active_and_locked_rows() {
    let (_backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();
    fill_plan_row(&mut workflow, 1, 2, "B", "01-Jan-2024");
    workflow
        .set_status(1, StepStatus::Locked, LockConfirmation::Confirmed)
        .unwrap();

    assert!(matches!(
        workflow.delete_plan_row(0).await.unwrap_err(),
        WorkflowError::State(_)
    ));
    assert!(matches!(
        workflow.delete_plan_row(1).await.unwrap_err(),
        WorkflowError::State(_)
    ));
}

#[tokio::test]
async fn delete_allowed_for_unselected_and_confirmed_rows() {
    let (_backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    fill_plan_row(&mut workflow, 1, 2, "B", "01-Jan-2024");
    workflow
        .set_status(1, StepStatus::Confirmed, LockConfirmation::Declined)
        .unwrap();

    workflow.delete_plan_row(1).await.expect("confirmed row");
    workflow.delete_plan_row(0).await.expect("unselected row");
}

#[tokio::test]
async fn pre_persistence_delete_renumbers_by_position() {
    let (_backend, mut workflow) = open_blank().await;
    // Three rendered rows numbered 1,2,3; nothing persisted yet.
    for (idx, step) in [(0usize, 1u16), (1, 2), (2, 3)] {
        fill_plan_row(&mut workflow, idx, step, "advice", "01-Jan-2024");
    }

    workflow.delete_plan_row(1).await.expect("should delete");

    let numbers: Vec<u16> = workflow
        .plan()
        .rows()
        .iter()
        .filter_map(|r| r.step_number)
        .collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn renumber_ignores_prior_labels() {
    let (_backend, mut workflow) = open_blank().await;
    for (idx, step) in [(0usize, 40u16), (1, 7), (2, 12)] {
        fill_plan_row(&mut workflow, idx, step, "advice", "01-Jan-2024");
    }

    workflow.delete_plan_row(2).await.expect("should delete");

    let numbers: Vec<u16> = workflow
        .plan()
        .rows()
        .iter()
        .filter_map(|r| r.step_number)
        .collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn post_persistence_delete_calls_backend_and_keeps_numbers() {
    let loaded = LoadedVisit {
        plan_wire: [
            "1#@A#@ #@ #@ #@ #@01-Jan-2024#@1#@ ",
            "2#@B#@ #@ #@ #@ #@01-Jan-2024#@1#@ ",
            "3#@C#@ #@ #@ #@ #@01-Jan-2024#@1#@ ",
        ]
        .join("@%&"),
        ..Default::default()
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let mut workflow = TreatmentWorkflow::open(backend.clone(), test_visit_key())
        .await
        .unwrap();

    workflow.delete_plan_row(1).await.expect("should delete");

    assert!(backend.calls().contains(&BackendCall::DeletePlanStep(2)));
    let numbers: Vec<u16> = workflow
        .plan()
        .rows()
        .iter()
        .filter_map(|r| r.step_number)
        .collect();
    // No renumbering once persistence has occurred.
    assert_eq!(numbers, vec![1, 3]);
}

#[tokio::test]
async fn plan_delete_cascades_to_detail_rows() {
    let (_backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();

    workflow.select_for_detail(&[0]).unwrap();
    let idx = workflow.add_detail_row();
    workflow.details_mut().set_parent_step(idx, Some(1)).unwrap();
    workflow
        .details_mut()
        .set_detail_number(idx, Some(1))
        .unwrap();
    workflow
        .details_mut()
        .set_actual_treatment(idx, "done")
        .unwrap();

    // The parent must leave Active before it can be deleted.
    workflow
        .set_status(0, StepStatus::Unselected, LockConfirmation::Declined)
        .unwrap();
    workflow.delete_plan_row(0).await.expect("should delete");

    assert!(workflow.details().detail_rows().is_empty());
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_active_rows_are_selectable_for_detail() {
    let (_backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Confirmed, LockConfirmation::Declined)
        .unwrap();

    let err = workflow.select_for_detail(&[0]).unwrap_err();
    assert!(matches!(err, WorkflowError::NotSelectable { index: 0 }));
}

#[tokio::test]
async fn detail_rows_carry_the_visit_date() {
    let (_backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();
    workflow.select_for_detail(&[0]).unwrap();

    let idx = workflow.add_detail_row();
    assert_eq!(
        workflow.details().detail_rows()[idx].visit_date,
        test_visit_key().visit_date
    );
}

#[tokio::test]
async fn save_details_sends_both_wires() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "Root canal", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();
    workflow.select_for_detail(&[0]).unwrap();

    let idx = workflow.add_detail_row();
    {
        let details = workflow.details_mut();
        details.set_parent_step(idx, Some(1)).unwrap();
        details.set_detail_number(idx, Some(1)).unwrap();
        details.set_actual_treatment(idx, "Access opening").unwrap();
    }

    workflow.save_details().await.expect("save should succeed");

    let calls = backend.calls();
    let BackendCall::SaveDetails(request) = calls.last().unwrap() else {
        panic!("expected a SaveDetails call, got {calls:?}");
    };
    assert_eq!(
        request.plan_wire,
        "1#@Root canal#@ #@ #@ #@ #@01-Jan-2024#@2#@ "
    );
    assert_eq!(request.detail_wire, "1#@1#@Access opening#@ ");
    assert!(workflow.details().detail_rows()[idx].persisted);
}

#[tokio::test]
async fn duplicate_detail_pair_aborts_the_save() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();
    workflow.select_for_detail(&[0]).unwrap();

    for treatment in ["T1", "T2"] {
        let idx = workflow.add_detail_row();
        let details = workflow.details_mut();
        details.set_parent_step(idx, Some(1)).unwrap();
        details.set_detail_number(idx, Some(10)).unwrap();
        details.set_actual_treatment(idx, treatment).unwrap();
    }

    let err = workflow.save_details().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::DuplicateDetail {
            row: 2,
            parent: 1,
            number: 10
        })
    ));
    assert_eq!(backend.calls(), vec![BackendCall::LoadVisit]);
}

#[tokio::test]
async fn persisted_details_rehydrate_on_selection() {
    let loaded = LoadedVisit {
        plan_wire: "1#@Root canal#@ #@ #@ #@ #@01-Jan-2024#@2#@ ".to_owned(),
        detail_wire: "1#@1#@Access opening#@ @%&2#@1#@Other parent#@ ".to_owned(),
        ..Default::default()
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let mut workflow = TreatmentWorkflow::open(backend, test_visit_key())
        .await
        .unwrap();

    workflow.select_for_detail(&[0]).unwrap();

    // Only the child of the selected parent comes back.
    let rows = workflow.details().detail_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].parent_step, Some(1));
    assert_eq!(rows[0].actual_treatment, "Access opening");
    assert!(rows[0].persisted);
}

#[tokio::test]
async fn detail_delete_is_unconditional_and_hits_backend_when_persisted() {
    let loaded = LoadedVisit {
        plan_wire: "1#@Root canal#@ #@ #@ #@ #@01-Jan-2024#@2#@ ".to_owned(),
        detail_wire: "1#@1#@Access opening#@ ".to_owned(),
        ..Default::default()
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let mut workflow = TreatmentWorkflow::open(backend.clone(), test_visit_key())
        .await
        .unwrap();
    workflow.select_for_detail(&[0]).unwrap();

    workflow.delete_detail_row(0).await.expect("should delete");

    assert!(backend.calls().contains(&BackendCall::DeleteDetailStep {
        parent: 1,
        number: 1
    }));
    assert!(workflow.details().detail_rows().is_empty());
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn staging_replaces_the_previous_selection() {
    let (_backend, mut workflow) = open_blank().await;
    workflow
        .stage_attachment_names(["a.pdf", "b.png"])
        .unwrap();
    workflow.stage_attachment_names(["c.doc"]).unwrap();

    let staged: Vec<&str> = workflow
        .staged_attachments()
        .iter()
        .map(|a| a.file_name.as_str())
        .collect();
    assert_eq!(staged, vec!["c.doc"]);
}

#[tokio::test]
async fn duplicate_against_persisted_attachment_is_rejected() {
    let loaded = LoadedVisit {
        attachment_names: vec!["xray.PDF".to_owned()],
        ..Default::default()
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let mut workflow = TreatmentWorkflow::open(backend, test_visit_key())
        .await
        .unwrap();

    let err = workflow
        .stage_attachment_names(["  xray.PDF  "])
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Attachment(_)));
}

#[tokio::test]
async fn staged_attachments_ride_along_with_the_plan_save() {
    let (backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");
    workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap();
    workflow.stage_attachment_names(["scan.jpg"]).unwrap();

    workflow.save_plan().await.expect("save should succeed");

    let calls = backend.calls();
    let BackendCall::SavePlan(request) = &calls[1] else {
        panic!("expected a SavePlan call");
    };
    assert_eq!(request.attachment_names, vec!["scan.jpg".to_owned()]);
    assert!(workflow.staged_attachments().is_empty());
    assert_eq!(workflow.persisted_attachments(), ["scan.jpg".to_owned()]);
}

#[tokio::test]
async fn delete_attachment_routes_by_origin() {
    let loaded = LoadedVisit {
        attachment_names: vec!["old.pdf".to_owned()],
        ..Default::default()
    };
    let backend = Arc::new(MockBackend::with_loaded(loaded));
    let mut workflow = TreatmentWorkflow::open(backend.clone(), test_visit_key())
        .await
        .unwrap();
    workflow.stage_attachment_names(["new.png"]).unwrap();

    // Staged: removed locally, no backend traffic.
    workflow.delete_attachment("new.png").await.unwrap();
    assert!(workflow.staged_attachments().is_empty());
    assert_eq!(backend.calls(), vec![BackendCall::LoadVisit]);

    // Persisted: backend call then local removal.
    workflow.delete_attachment("old.pdf").await.unwrap();
    assert!(
        backend
            .calls()
            .contains(&BackendCall::DeleteAttachment("old.pdf".to_owned()))
    );
    assert!(workflow.persisted_attachments().is_empty());

    // Unknown name.
    let err = workflow.delete_attachment("ghost.doc").await.unwrap_err();
    assert!(matches!(err, WorkflowError::AttachmentNotFound { .. }));
}

// ---------------------------------------------------------------------------
// Status options
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_options_always_start_with_the_placeholder() {
    let (backend, workflow) = open_blank().await;
    backend.set_status_options(vec![
        StatusOption {
            id: 1,
            description: "Confirmed".to_owned(),
        },
        StatusOption {
            id: 2,
            description: "Active".to_owned(),
        },
    ]);

    let options = workflow.status_options().await.unwrap();
    assert_eq!(options[0], StatusOption::placeholder());
    assert_eq!(options.len(), 3);
}

// ---------------------------------------------------------------------------
// Locking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn locked_row_freezes_every_field() {
    let (_backend, mut workflow) = open_blank().await;
    fill_plan_row(&mut workflow, 0, 1, "A", "01-Jan-2024");

    // Declined confirmation leaves the row unlocked.
    let err = workflow
        .set_status(0, StepStatus::Locked, LockConfirmation::Declined)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::State(_)));

    workflow
        .set_status(0, StepStatus::Locked, LockConfirmation::Confirmed)
        .unwrap();

    assert_eq!(
        workflow.plan_mut().set_advised_details(0, "changed"),
        Err(StoreError::RowImmutable { index: 0 })
    );
    let err = workflow
        .set_status(0, StepStatus::Active, LockConfirmation::Declined)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::State(_)));
}
