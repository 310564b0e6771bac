//! Persistence collaborator.
//!
//! The reconciliation engine reads, patches, and re-reads log records through
//! this trait. Wire format, transport, and timeouts belong to the implementor.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::{LogKind, TopLevelRecord};
use super::patches::PatchRecord;

/// Response of a patch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub success: bool,
}

/// Reads and patches log records by kind.
///
/// Failures are reported as `anyhow::Error`; the engine wraps them with the
/// name of the operation that failed.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Fetch one employee's containers of `kind` for `date`.
    async fn fetch_logs(
        &self,
        employee_id: &str,
        date: NaiveDate,
        kind: LogKind,
    ) -> anyhow::Result<Vec<TopLevelRecord>>;

    /// Overwrite the fields named in each patch. Last writer wins.
    async fn patch_logs(&self, kind: LogKind, patches: &[PatchRecord]) -> anyhow::Result<PatchOutcome>;
}
