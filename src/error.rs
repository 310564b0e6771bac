//! Error taxonomy.
//!
//! Validation gaps, collaborator failures, and wizard transition errors.
//! Permission denials and scan mismatches are not errors; they are typed
//! results on the clock-in wizard.

use thiserror::Error;

use crate::storage::models::{Field, LogKind};

pub type Result<T> = std::result::Result<T, TimecardError>;

#[derive(Debug, Error)]
pub enum TimecardError {
    #[error("field {field} expects a number, got {input:?}")]
    InvalidNumber { field: Field, input: String },

    #[error("field {field} expects a time of day (HH:MM), got {input:?}")]
    InvalidTime { field: Field, input: String },

    #[error("field {field} rejected {input:?}: {reason}")]
    InvalidText {
        field: Field,
        input: String,
        reason: String,
    },

    #[error("field {field} is not editable on {kind} logs")]
    UnknownField { kind: LogKind, field: Field },

    #[error("no {kind} entry matches id={entry_id} sub_id={sub_entry_id:?}")]
    EntryNotFound {
        kind: LogKind,
        entry_id: String,
        sub_entry_id: Option<String>,
    },

    #[error("no adapter registered for {0}")]
    AdapterMissing(LogKind),

    #[error("no (date, kind) selection is loaded")]
    NoSelection,

    #[error("{operation} failed: {source}")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("persistence rejected the {kind} patch list ({count} records)")]
    PatchRejected { kind: LogKind, count: usize },

    #[error("user has no clock-in roles")]
    NoRolesAvailable,

    #[error("role {0} is not available to this user")]
    RoleUnavailable(String),

    #[error("cannot {action} from step {step}")]
    InvalidTransition { step: String, action: &'static str },

    #[error("unknown jobsite {0:?}")]
    UnknownJobsite(String),

    #[error("cost code {0:?} is not valid for the selected jobsite")]
    UnknownCostCode(String),

    #[error("unknown equipment {0:?}")]
    UnknownEquipment(String),

    #[error("step is incomplete: {0}")]
    IncompleteDetails(&'static str),

    #[error("location permission is required to clock in")]
    LocationRequired,

    #[error("switching jobs requires an open timesheet and none was found")]
    NoOpenTimesheet,

    #[error("clock event was not accepted")]
    SubmitRejected,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TimecardError {
    pub fn collaborator(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Collaborator { operation, source }
    }

    /// True for the validation-gap family: bad input that leaves the field unchanged.
    pub fn is_validation_gap(&self) -> bool {
        matches!(
            self,
            Self::InvalidNumber { .. } | Self::InvalidTime { .. } | Self::InvalidText { .. }
        )
    }
}
