//! Delimited wire codec for the backend persistence contract.
//!
//! A plan row is 9 fields joined by `#@`; a detail row is 4 fields with the
//! same token; rows are joined by `@%&`. Blank fields are written as a
//! single space so the field count survives the round trip. The format has
//! no escaping for its own delimiters inside free text -- it must stay
//! byte-compatible with the existing backend, so free-text fields simply
//! must not contain the reserved tokens.

use thiserror::Error;

use crate::model::{DetailStep, PlanStep, StepStatus};

/// Field separator within a row.
pub const FIELD_SEP: &str = "#@";
/// Row separator within a batch.
pub const ROW_SEP: &str = "@%&";
/// Sentinel written for blank fields to preserve the field count.
const BLANK: &str = " ";

const PLAN_FIELDS: usize = 9;
const DETAIL_FIELDS: usize = 4;

/// Errors raised while decoding a wire string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("row {row}: expected {expected} fields, found {found}")]
    FieldCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: invalid number {value:?}")]
    BadNumber { row: usize, value: String },

    #[error("row {row}: invalid status code {value:?}")]
    BadStatus { row: usize, value: String },
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// The wire-visible portion of a plan row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanRecord {
    pub step_number: Option<u16>,
    pub advised_details: String,
    pub op_sequence: [String; 4],
    pub advised_date: String,
    pub status: StepStatus,
    pub comment: String,
}

impl From<&PlanStep> for PlanRecord {
    fn from(row: &PlanStep) -> Self {
        Self {
            step_number: row.step_number,
            advised_details: row.advised_details.clone(),
            op_sequence: row.op_sequence.clone(),
            advised_date: row.advised_date.clone(),
            status: row.status,
            comment: row.comment.clone(),
        }
    }
}

/// The wire-visible portion of a detail row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailRecord {
    pub parent_step: Option<u16>,
    pub detail_number: Option<u16>,
    pub actual_treatment: String,
    pub remark: String,
}

impl From<&DetailStep> for DetailRecord {
    fn from(row: &DetailStep) -> Self {
        Self {
            parent_step: row.parent_step,
            detail_number: row.detail_number,
            actual_treatment: row.actual_treatment.clone(),
            remark: row.remark.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn field(text: &str) -> &str {
    if text.is_empty() { BLANK } else { text }
}

fn number_field(n: Option<u16>) -> String {
    match n {
        Some(n) => n.to_string(),
        None => BLANK.to_owned(),
    }
}

/// Encode a plan batch. An empty batch encodes to the empty string.
pub fn encode_plan(rows: &[PlanRecord]) -> String {
    let encoded: Vec<String> = rows
        .iter()
        .map(|r| {
            [
                number_field(r.step_number),
                field(&r.advised_details).to_owned(),
                field(&r.op_sequence[0]).to_owned(),
                field(&r.op_sequence[1]).to_owned(),
                field(&r.op_sequence[2]).to_owned(),
                field(&r.op_sequence[3]).to_owned(),
                field(&r.advised_date).to_owned(),
                r.status.code().to_string(),
                field(&r.comment).to_owned(),
            ]
            .join(FIELD_SEP)
        })
        .collect();
    encoded.join(ROW_SEP)
}

/// Encode a detail batch. An empty batch encodes to the empty string.
pub fn encode_detail(rows: &[DetailRecord]) -> String {
    let encoded: Vec<String> = rows
        .iter()
        .map(|r| {
            [
                number_field(r.parent_step),
                number_field(r.detail_number),
                field(&r.actual_treatment).to_owned(),
                field(&r.remark).to_owned(),
            ]
            .join(FIELD_SEP)
        })
        .collect();
    encoded.join(ROW_SEP)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn unblank(text: &str) -> String {
    if text == BLANK {
        String::new()
    } else {
        text.to_owned()
    }
}

fn parse_number(row: usize, text: &str) -> Result<Option<u16>, CodecError> {
    if text == BLANK || text.is_empty() {
        return Ok(None);
    }
    text.parse::<u16>()
        .map(Some)
        .map_err(|_| CodecError::BadNumber {
            row,
            value: text.to_owned(),
        })
}

/// Decode a plan batch: the exact inverse of [`encode_plan`].
pub fn decode_plan(wire: &str) -> Result<Vec<PlanRecord>, CodecError> {
    if wire.is_empty() {
        return Ok(Vec::new());
    }
    let mut rows = Vec::new();
    for (idx, raw) in wire.split(ROW_SEP).enumerate() {
        let row = idx + 1;
        let fields: Vec<&str> = raw.split(FIELD_SEP).collect();
        if fields.len() != PLAN_FIELDS {
            return Err(CodecError::FieldCount {
                row,
                expected: PLAN_FIELDS,
                found: fields.len(),
            });
        }
        let status_code: u8 = fields[7].trim().parse().map_err(|_| CodecError::BadStatus {
            row,
            value: fields[7].to_owned(),
        })?;
        let status = StepStatus::from_code(status_code).map_err(|_| CodecError::BadStatus {
            row,
            value: fields[7].to_owned(),
        })?;
        rows.push(PlanRecord {
            step_number: parse_number(row, fields[0])?,
            advised_details: unblank(fields[1]),
            op_sequence: [
                unblank(fields[2]),
                unblank(fields[3]),
                unblank(fields[4]),
                unblank(fields[5]),
            ],
            advised_date: unblank(fields[6]),
            status,
            comment: unblank(fields[8]),
        });
    }
    Ok(rows)
}

/// Decode a detail batch: the exact inverse of [`encode_detail`].
pub fn decode_detail(wire: &str) -> Result<Vec<DetailRecord>, CodecError> {
    if wire.is_empty() {
        return Ok(Vec::new());
    }
    let mut rows = Vec::new();
    for (idx, raw) in wire.split(ROW_SEP).enumerate() {
        let row = idx + 1;
        let fields: Vec<&str> = raw.split(FIELD_SEP).collect();
        if fields.len() != DETAIL_FIELDS {
            return Err(CodecError::FieldCount {
                row,
                expected: DETAIL_FIELDS,
                found: fields.len(),
            });
        }
        rows.push(DetailRecord {
            parent_step: parse_number(row, fields[0])?,
            detail_number: parse_number(row, fields[1])?,
            actual_treatment: unblank(fields[2]),
            remark: unblank(fields[3]),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
