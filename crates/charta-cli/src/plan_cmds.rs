//! Handlers for `charta plan` subcommands.
//!
//! Implements:
//! - `charta plan validate <file>` -- offline batch validation
//! - `charta plan encode <file>`   -- print the wire form of a batch file
//! - `charta plan save <file> ...` -- validate and persist a batch
//! - `charta plan show ...`        -- load a visit and print its plan rows

use std::sync::Arc;

use anyhow::{Context, Result};

use charta_client::HttpBackend;
use charta_core::backend::{PersistenceBackend, SavePlanRequest};
use charta_core::batch::{self, Batch};
use charta_core::codec::{self, PlanRecord};
use charta_core::validate;
use charta_core::workflow::TreatmentWorkflow;

use crate::PlanCommands;
use crate::visit::VisitArgs;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, backend_url: &str) -> Result<()> {
    match command {
        PlanCommands::Validate { file } => cmd_validate(&file),
        PlanCommands::Encode { file } => cmd_encode(&file),
        PlanCommands::Save { file, visit } => cmd_save(&file, &visit, backend_url).await,
        PlanCommands::Show { visit } => cmd_show(&visit, backend_url).await,
    }
}

/// Read and parse a batch file from disk.
pub fn load_batch(path: &str) -> Result<Batch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file: {path}"))?;
    batch::parse_batch(&content).with_context(|| format!("failed to parse batch file: {path}"))
}

// -----------------------------------------------------------------------
// charta plan validate <file>
// -----------------------------------------------------------------------

fn cmd_validate(path: &str) -> Result<()> {
    let batch = load_batch(path)?;
    let outcome = validate::validate_plan_batch(&batch.plan_rows).map_err(describe)?;

    println!("Plan batch OK.");
    println!("  Rows:     {}", batch.plan_rows.len());
    println!("  Accepted: {}", outcome.accepted.len());
    Ok(())
}

/// Attach the row/field location to a validation error before it bubbles
/// up to main.
fn describe(err: charta_core::validate::ValidationError) -> anyhow::Error {
    match (err.row(), err.field()) {
        (Some(row), Some(field)) => {
            anyhow::anyhow!("{err} (row {row}, field {field:?})")
        }
        _ => anyhow::anyhow!("{err}"),
    }
}

// -----------------------------------------------------------------------
// charta plan encode <file>
// -----------------------------------------------------------------------

/// Encode every row as-is, without validation. Debug aid for inspecting
/// the wire format.
fn cmd_encode(path: &str) -> Result<()> {
    let batch = load_batch(path)?;
    let records: Vec<PlanRecord> = batch.plan_rows.iter().map(PlanRecord::from).collect();
    println!("{}", codec::encode_plan(&records));
    Ok(())
}

// -----------------------------------------------------------------------
// charta plan save <file>
// -----------------------------------------------------------------------

async fn cmd_save(path: &str, visit: &VisitArgs, backend_url: &str) -> Result<()> {
    let batch = load_batch(path)?;
    let outcome = validate::validate_plan_batch(&batch.plan_rows).map_err(describe)?;

    let backend = HttpBackend::new(backend_url)?;
    let request = SavePlanRequest {
        key: visit.to_key(),
        plan_wire: outcome.wire,
        attachment_names: Vec::new(),
    };
    backend
        .save_plan(&request)
        .await
        .context("plan save failed")?;
    tracing::info!(
        patient = %request.key.patient_id,
        visit = %request.key.visit_number,
        accepted = outcome.accepted.len(),
        "plan batch saved"
    );

    println!("Plan batch saved.");
    println!("  Patient:  {}", request.key.patient_id);
    println!("  Visit:    {}", request.key.visit_number);
    println!("  Accepted: {}", outcome.accepted.len());
    Ok(())
}

// -----------------------------------------------------------------------
// charta plan show
// -----------------------------------------------------------------------

async fn cmd_show(visit: &VisitArgs, backend_url: &str) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(backend_url)?);
    let workflow = TreatmentWorkflow::open(backend, visit.to_key()).await?;

    let rows: Vec<_> = workflow
        .plan()
        .rows()
        .iter()
        .filter(|r| !r.is_blank())
        .collect();

    if rows.is_empty() {
        println!("No plan rows persisted for this visit.");
        return Ok(());
    }

    // Compute column widths for a clean table.
    let step_w = 4;
    let advice_w = rows
        .iter()
        .map(|r| r.advised_details.len())
        .max()
        .unwrap_or(7)
        .max(7);
    let date_w = 11;
    let status_w = 10;

    println!(
        "{:<step_w$}  {:<advice_w$}  {:<date_w$}  {:<status_w$}  COMMENT",
        "STEP", "ADVISED", "DATE", "STATUS",
    );
    for row in &rows {
        let step = row
            .step_number
            .map(|n| n.to_string())
            .unwrap_or_default();
        println!(
            "{:<step_w$}  {:<advice_w$}  {:<date_w$}  {:<status_w$}  {}",
            step, row.advised_details, row.advised_date, row.status, row.comment,
        );
    }

    if !workflow.persisted_attachments().is_empty() {
        println!();
        println!("Attachments:");
        for name in workflow.persisted_attachments() {
            println!("  - {name}");
        }
    }

    Ok(())
}
