//! Core entities: plan steps, detail steps, attachments, and the status
//! lifecycle they share.
//!
//! Row identity is minted by [`IdGenerator`], owned by the stores. Every
//! UI-facing affordance (selector enabled, fields editable, deletable) is
//! derived from entity state through the methods here; nothing writes those
//! affordances back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

/// Lifecycle status of a plan step.
///
/// Stored as a numeric code on the wire (`0..=3`). `Locked` is terminal:
/// every field of a locked row is immutable and the row cannot be deleted
/// while it carries a step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Unselected,
    Confirmed,
    Active,
    Locked,
}

impl StepStatus {
    /// Numeric wire code for this status.
    pub fn code(self) -> u8 {
        match self {
            Self::Unselected => 0,
            Self::Confirmed => 1,
            Self::Active => 2,
            Self::Locked => 3,
        }
    }

    /// Parse a numeric wire code.
    pub fn from_code(code: u8) -> Result<Self, StepStatusParseError> {
        match code {
            0 => Ok(Self::Unselected),
            1 => Ok(Self::Confirmed),
            2 => Ok(Self::Active),
            3 => Ok(Self::Locked),
            other => Err(StepStatusParseError(other.to_string())),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unselected => "unselected",
            Self::Confirmed => "confirmed",
            Self::Active => "active",
            Self::Locked => "locked",
        };
        f.write_str(s)
    }
}

impl FromStr for StepStatus {
    type Err = StepStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unselected" => Ok(Self::Unselected),
            "confirmed" => Ok(Self::Confirmed),
            "active" => Ok(Self::Active),
            "locked" => Ok(Self::Locked),
            other => Err(StepStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`StepStatus`] name or code.
#[derive(Debug, Clone)]
pub struct StepStatusParseError(pub String);

impl fmt::Display for StepStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step status: {:?}", self.0)
    }
}

impl std::error::Error for StepStatusParseError {}

// ---------------------------------------------------------------------------
// Row identity
// ---------------------------------------------------------------------------

/// Identity of a row within a store, stable across renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Monotonic row-id generator. Each store owns one; ids are never reused
/// within a session.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id.
    pub fn mint(&mut self) -> RowId {
        let id = RowId(self.next);
        self.next += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Plan step
// ---------------------------------------------------------------------------

/// One row of a treatment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: RowId,
    /// Step number, 1–999. `None` while the row is blank.
    pub step_number: Option<u16>,
    /// Advised treatment text. A non-blank value makes the row "count"
    /// toward the batch.
    pub advised_details: String,
    /// Optional short operation codes, up to four per step.
    pub op_sequence: [String; 4],
    /// Advised date in `DD-MMM-YYYY` form, owned as entered text.
    pub advised_date: String,
    pub status: StepStatus,
    pub comment: String,
    /// Sticky: set when the row enters `Confirmed`; the row can never again
    /// be chosen as the parent of a detail batch.
    pub detail_selection_disabled: bool,
    /// Set once a save accepts the row; the step number is immutable from
    /// then on.
    pub step_locked: bool,
    /// Whether this row exists on the backend.
    pub persisted: bool,
}

impl PlanStep {
    /// A fresh blank row.
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            step_number: None,
            advised_details: String::new(),
            op_sequence: Default::default(),
            advised_date: String::new(),
            status: StepStatus::Unselected,
            comment: String::new(),
            detail_selection_disabled: false,
            step_locked: false,
            persisted: false,
        }
    }

    /// True when every user-entered field is blank and the status is
    /// untouched.
    pub fn is_blank(&self) -> bool {
        self.step_number.is_none()
            && self.advised_details.trim().is_empty()
            && self.advised_date.trim().is_empty()
            && self.status == StepStatus::Unselected
    }

    /// True when the row counts toward the batch: it carries advised
    /// details.
    pub fn counts(&self) -> bool {
        !self.advised_details.trim().is_empty()
    }

    /// Whether any field on this row may still be edited.
    pub fn fields_editable(&self) -> bool {
        self.status != StepStatus::Locked
    }

    /// Whether the step number field specifically may be edited.
    pub fn step_editable(&self) -> bool {
        self.fields_editable() && !self.step_locked
    }

    /// Whether this row may be chosen as the parent for a new detail batch.
    pub fn selector_enabled(&self) -> bool {
        self.status == StepStatus::Active && !self.detail_selection_disabled
    }

    /// Delete policy: rejected for `Active`/`Locked` rows that carry a step
    /// number.
    pub fn deletable(&self) -> bool {
        !(matches!(self.status, StepStatus::Active | StepStatus::Locked)
            && self.step_number.is_some())
    }
}

// ---------------------------------------------------------------------------
// Detail step
// ---------------------------------------------------------------------------

/// A sub-record under a plan step recording treatment actually performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailStep {
    pub id: RowId,
    /// Step number of the parent plan row.
    pub parent_step: Option<u16>,
    /// Detail number, 1–999, unique together with `parent_step` across the
    /// batch.
    pub detail_number: Option<u16>,
    /// Required once `detail_number` is set.
    pub actual_treatment: String,
    pub remark: String,
    /// Stamped at row creation; never mutated afterwards.
    pub visit_date: String,
    pub persisted: bool,
}

impl DetailStep {
    /// A fresh row stamped with the given visit date.
    pub fn new(id: RowId, visit_date: impl Into<String>) -> Self {
        Self {
            id,
            parent_step: None,
            detail_number: None,
            actual_treatment: String::new(),
            remark: String::new(),
            visit_date: visit_date.into(),
            persisted: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.parent_step.is_none()
            && self.detail_number.is_none()
            && self.actual_treatment.trim().is_empty()
            && self.remark.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Where an attachment currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentOrigin {
    /// Staged locally, not yet submitted.
    New,
    /// Already persisted on the backend.
    Persisted,
}

/// A file attached to a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub origin: AttachmentOrigin,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, origin: AttachmentOrigin) -> Self {
        Self {
            file_name: file_name.into(),
            origin,
        }
    }

    /// File extension (text after the final dot), if any. Returned as
    /// written; callers decide on case handling.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name.trim();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Status options
// ---------------------------------------------------------------------------

/// One entry of the status dropdown, as served by the options provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub id: u8,
    pub description: String,
}

impl StatusOption {
    /// The synthetic placeholder entry the engine prepends to every
    /// provider response.
    pub fn placeholder() -> Self {
        Self {
            id: 0,
            description: "--Select--".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Visit identity
// ---------------------------------------------------------------------------

/// Identifying parameters accompanying every persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitKey {
    pub patient_id: String,
    pub doctor_id: String,
    pub clinic_id: String,
    pub shift: String,
    pub visit_number: String,
    pub visit_date: String,
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_status_display_roundtrip() {
        let variants = [
            StepStatus::Unselected,
            StepStatus::Confirmed,
            StepStatus::Active,
            StepStatus::Locked,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: StepStatus = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn step_status_code_roundtrip() {
        for code in 0..=3u8 {
            let status = StepStatus::from_code(code).expect("should parse");
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn step_status_invalid() {
        assert!("bogus".parse::<StepStatus>().is_err());
        assert!(StepStatus::from_code(4).is_err());
    }

    #[test]
    fn id_generator_is_monotonic() {
        let mut ids = IdGenerator::new();
        let a = ids.mint();
        let b = ids.mint();
        let c = ids.mint();
        assert!(a.0 < b.0 && b.0 < c.0);
    }

    #[test]
    fn fresh_plan_row_is_blank_and_editable() {
        let row = PlanStep::new(RowId(0));
        assert!(row.is_blank());
        assert!(!row.counts());
        assert!(row.fields_editable());
        assert!(row.step_editable());
        assert!(row.deletable());
        assert!(!row.selector_enabled());
    }

    #[test]
    fn locked_row_is_immutable_and_undeletable() {
        let mut row = PlanStep::new(RowId(0));
        row.step_number = Some(3);
        row.status = StepStatus::Locked;
        assert!(!row.fields_editable());
        assert!(!row.step_editable());
        assert!(!row.deletable());
    }

    #[test]
    fn active_row_without_step_number_is_deletable() {
        let mut row = PlanStep::new(RowId(0));
        row.status = StepStatus::Active;
        assert!(row.deletable());
        row.step_number = Some(1);
        assert!(!row.deletable());
    }

    #[test]
    fn confirmed_row_never_selectable_again() {
        let mut row = PlanStep::new(RowId(0));
        row.status = StepStatus::Confirmed;
        row.detail_selection_disabled = true;
        assert!(!row.selector_enabled());
        // Even after moving back to Active the sticky flag holds.
        row.status = StepStatus::Active;
        assert!(!row.selector_enabled());
    }

    #[test]
    fn attachment_extension_extraction() {
        let a = Attachment::new("scan.pdf", AttachmentOrigin::New);
        assert_eq!(a.extension(), Some("pdf"));
        let b = Attachment::new("archive.tar.GZ", AttachmentOrigin::New);
        assert_eq!(b.extension(), Some("GZ"));
        let c = Attachment::new("noext", AttachmentOrigin::New);
        assert_eq!(c.extension(), None);
        let d = Attachment::new(".hidden", AttachmentOrigin::New);
        assert_eq!(d.extension(), None);
    }

    #[test]
    fn placeholder_option_is_synthetic_zero() {
        let p = StatusOption::placeholder();
        assert_eq!(p.id, 0);
        assert_eq!(p.description, "--Select--");
    }
}
