//! TOML batch-file format for driving the engine from the CLI.
//!
//! A batch file holds `[[steps]]` tables (plan rows) and optional
//! `[[details]]` tables (detail rows), deserialized via `serde` + the
//! `toml` crate and converted into model rows with freshly minted ids.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DetailStep, IdGenerator, PlanStep, StepStatus};

/// Errors raised while reading a batch file.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("step row {row}: invalid status {value:?} (expected unselected, confirmed, active, or locked)")]
    BadStatus { row: usize, value: String },

    #[error("step row {row}: at most 4 operation codes are allowed")]
    TooManyOps { row: usize },
}

/// Top-level structure of a batch file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchToml {
    /// Plan rows, in render order.
    #[serde(default)]
    pub steps: Vec<StepToml>,
    /// Detail rows, in render order.
    #[serde(default)]
    pub details: Vec<DetailToml>,
}

/// A single `[[steps]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepToml {
    /// Step number, 1-999. Absent for a blank row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u16>,
    /// Advised treatment text.
    #[serde(default)]
    pub advice: String,
    /// Operation codes, up to four.
    #[serde(default)]
    pub ops: Vec<String>,
    /// Advised date in DD-MMM-YYYY form.
    #[serde(default)]
    pub date: String,
    /// Status name: unselected, confirmed, active, or locked.
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub comment: String,
}

/// A single `[[details]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetailToml {
    /// Step number of the parent plan row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u16>,
    /// Detail number, 1-999.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u16>,
    /// Treatment actually performed.
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub remark: String,
    /// Visit date; stamped by the caller when absent.
    #[serde(default)]
    pub visit_date: String,
}

fn default_status() -> String {
    "unselected".to_owned()
}

/// A parsed batch converted into model rows.
#[derive(Debug, Clone)]
pub struct Batch {
    pub plan_rows: Vec<PlanStep>,
    pub detail_rows: Vec<DetailStep>,
}

/// Parse a batch file and convert it into model rows.
pub fn parse_batch(content: &str) -> Result<Batch, BatchError> {
    let file: BatchToml = toml::from_str(content)?;
    let mut ids = IdGenerator::new();

    let mut plan_rows = Vec::with_capacity(file.steps.len());
    for (idx, entry) in file.steps.iter().enumerate() {
        let row_no = idx + 1;
        let status: StepStatus = entry
            .status
            .parse()
            .map_err(|_| BatchError::BadStatus {
                row: row_no,
                value: entry.status.clone(),
            })?;
        if entry.ops.len() > 4 {
            return Err(BatchError::TooManyOps { row: row_no });
        }

        let mut row = PlanStep::new(ids.mint());
        row.step_number = entry.step;
        row.advised_details = entry.advice.clone();
        for (slot, code) in entry.ops.iter().enumerate() {
            row.op_sequence[slot] = code.clone();
        }
        row.advised_date = entry.date.clone();
        row.status = status;
        row.comment = entry.comment.clone();
        plan_rows.push(row);
    }

    let mut detail_rows = Vec::with_capacity(file.details.len());
    for entry in &file.details {
        let mut row = DetailStep::new(ids.mint(), entry.visit_date.clone());
        row.parent_step = entry.parent;
        row.detail_number = entry.number;
        row.actual_treatment = entry.treatment.clone();
        row.remark = entry.remark.clone();
        detail_rows.push(row);
    }

    Ok(Batch {
        plan_rows,
        detail_rows,
    })
}
