//! Handlers for `charta detail` subcommands.
//!
//! A detail batch file carries both the popup's plan rows (`[[steps]]`)
//! and its detail rows (`[[details]]`); both sides are validated and
//! serialized together, the way the detail popup saves.

use anyhow::{Context, Result};

use charta_client::HttpBackend;
use charta_core::backend::{PersistenceBackend, SaveDetailRequest};
use charta_core::codec::{self, DetailRecord};
use charta_core::validate;

use crate::DetailCommands;
use crate::plan_cmds::load_batch;
use crate::visit::VisitArgs;

/// Dispatch a `DetailCommands` variant to the appropriate handler.
pub async fn run_detail_command(command: DetailCommands, backend_url: &str) -> Result<()> {
    match command {
        DetailCommands::Validate { file } => cmd_validate(&file),
        DetailCommands::Encode { file } => cmd_encode(&file),
        DetailCommands::Save { file, visit } => cmd_save(&file, &visit, backend_url).await,
    }
}

fn cmd_validate(path: &str) -> Result<()> {
    let batch = load_batch(path)?;
    let outcome = validate::validate_detail_batch(&batch.plan_rows, &batch.detail_rows)?;

    println!("Detail batch OK.");
    println!("  Plan rows accepted:   {}", outcome.accepted_plan.len());
    println!("  Detail rows accepted: {}", outcome.accepted_details.len());
    Ok(())
}

fn cmd_encode(path: &str) -> Result<()> {
    let batch = load_batch(path)?;
    let records: Vec<DetailRecord> = batch.detail_rows.iter().map(DetailRecord::from).collect();
    println!("{}", codec::encode_detail(&records));
    Ok(())
}

async fn cmd_save(path: &str, visit: &VisitArgs, backend_url: &str) -> Result<()> {
    let batch = load_batch(path)?;
    let outcome = validate::validate_detail_batch(&batch.plan_rows, &batch.detail_rows)?;

    let backend = HttpBackend::new(backend_url)?;
    let request = SaveDetailRequest {
        key: visit.to_key(),
        plan_wire: outcome.plan_wire,
        detail_wire: outcome.detail_wire,
    };
    backend
        .save_details(&request)
        .await
        .context("detail save failed")?;

    println!("Detail batch saved.");
    println!("  Patient:  {}", request.key.patient_id);
    println!("  Visit:    {}", request.key.visit_number);
    println!("  Details:  {}", outcome.accepted_details.len());
    Ok(())
}
