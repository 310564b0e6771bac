//! Log kind adapters.
//!
//! One adapter per log kind family. Each adapter flattens its kind's nested
//! records into patch records, rebuilds the nested shape from patches, and
//! reads/writes individual fields of a working copy.
//!
//! ```text
//! AdapterRegistry
//!     │
//!     └── adapters: HashMap<LogKind, Box<dyn LogAdapter>>
//!                       │
//!                       ├── HighlightAdapter
//!                       ├── MileageAdapter
//!                       ├── EquipmentHaulAdapter / MaterialHaulAdapter
//!                       ├── RefuelAdapter (equipment, trucking, tasco)
//!                       ├── StateMileageAdapter
//!                       ├── TascoHaulAdapter
//!                       └── SessionAdapter (equipment usage, maintenance)
//! ```

pub mod equipment_haul;
pub mod highlight;
pub mod material_haul;
pub mod mileage;
pub mod refuel;
pub mod session;
pub mod state_mileage;
pub mod tasco_haul;

use std::collections::HashMap;
use std::fmt;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::error::{Result, TimecardError};
use crate::storage::models::{Field, FieldKey, LogEntry, LogKind, TopLevelRecord};
use crate::storage::patches::PatchRecord;

pub use equipment_haul::EquipmentHaulAdapter;
pub use highlight::HighlightAdapter;
pub use material_haul::MaterialHaulAdapter;
pub use mileage::MileageAdapter;
pub use refuel::RefuelAdapter;
pub use session::SessionAdapter;
pub use state_mileage::StateMileageAdapter;
pub use tasco_haul::TascoHaulAdapter;

/// Settings a field setter needs beyond the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditContext {
    /// Offset in which time-of-day edits are interpreted.
    pub offset: FixedOffset,
}

impl Default for EditContext {
    fn default() -> Self {
        Self { offset: Utc.fix() }
    }
}

/// Per-kind bridge between the nested record shape and patch records.
pub trait LogAdapter: Send + Sync + fmt::Debug {
    /// The log kind this adapter serves.
    fn kind(&self) -> LogKind;

    /// Fields this adapter owns and can edit.
    fn fields(&self) -> &'static [Field];

    /// One patch per identified leaf with at least one field set.
    ///
    /// Leaves with an empty id and leaves with no field set are dropped.
    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord>;

    /// Copy of `original` with fields present in `patches` overwritten.
    ///
    /// Leaves are matched by id, sub entries by `(parentId, subId)`.
    /// Unmatched leaves are returned unchanged.
    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord>;

    /// Render the current value of a field as an input would show it.
    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, ctx: &EditContext) -> Result<String>;

    /// Parse `raw` and write it into the addressed field.
    ///
    /// # Errors
    ///
    /// Validation errors leave the field unchanged.
    fn set_field(
        &self,
        records: &mut [TopLevelRecord],
        key: &FieldKey,
        raw: &str,
        ctx: &EditContext,
    ) -> Result<()>;

    /// Minimal validity rule for a flattened patch of this kind.
    fn is_valid(&self, patch: &PatchRecord) -> bool;

    /// Prepare freshly loaded records, e.g. synthesize placeholder sub entries.
    fn normalize(&self, records: &mut [TopLevelRecord]) {
        let _ = records;
    }
}

/// Maps each log kind to its adapter.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<LogKind, Box<dyn LogAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an adapter for every log kind.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HighlightAdapter));
        registry.register(Box::new(MileageAdapter));
        registry.register(Box::new(EquipmentHaulAdapter));
        registry.register(Box::new(MaterialHaulAdapter));
        registry.register(Box::new(RefuelAdapter::EQUIPMENT));
        registry.register(Box::new(RefuelAdapter::TRUCKING));
        registry.register(Box::new(RefuelAdapter::TASCO));
        registry.register(Box::new(StateMileageAdapter));
        registry.register(Box::new(TascoHaulAdapter));
        registry.register(Box::new(SessionAdapter::EQUIPMENT_USAGE));
        registry.register(Box::new(SessionAdapter::MAINTENANCE));
        registry
    }

    /// Register an adapter, replacing any previous adapter for its kind.
    pub fn register(&mut self, adapter: Box<dyn LogAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: LogKind) -> Result<&dyn LogAdapter> {
        self.adapters
            .get(&kind)
            .map(|a| a.as_ref())
            .ok_or(TimecardError::AdapterMissing(kind))
    }

    pub fn kinds(&self) -> Vec<LogKind> {
        let mut kinds: Vec<LogKind> = self.adapters.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Index patches by their match key.
pub(crate) fn index_patches(patches: &[PatchRecord]) -> HashMap<(String, String), &PatchRecord> {
    patches
        .iter()
        .map(|p| {
            let (parent, id) = p.match_key();
            ((parent.to_string(), id.to_string()), p)
        })
        .collect()
}

pub(crate) fn lookup<'a>(
    index: &HashMap<(String, String), &'a PatchRecord>,
    parent: &str,
    id: &str,
) -> Option<&'a PatchRecord> {
    index.get(&(parent.to_string(), id.to_string())).copied()
}

/// Apply a carried field: set or clear `target`, or leave it when absent.
pub(crate) fn overwrite<T: Clone>(target: &mut Option<T>, patch: &Option<Option<T>>) {
    if let Some(value) = patch {
        *target = value.clone();
    }
}

pub(crate) fn find_entry<'a>(
    records: &'a [TopLevelRecord],
    entry_id: &str,
) -> Option<(NaiveDate, &'a LogEntry)> {
    records.iter().find_map(|record| {
        record
            .entries
            .iter()
            .find(|e| e.id() == entry_id)
            .map(|e| (record.date, e))
    })
}

pub(crate) fn find_entry_mut<'a>(
    records: &'a mut [TopLevelRecord],
    entry_id: &str,
) -> Option<(NaiveDate, &'a mut LogEntry)> {
    records.iter_mut().find_map(|record| {
        let date = record.date;
        record
            .entries
            .iter_mut()
            .find(|e| e.id() == entry_id)
            .map(|e| (date, e))
    })
}

pub(crate) fn not_found(kind: LogKind, key: &FieldKey) -> TimecardError {
    TimecardError::EntryNotFound {
        kind,
        entry_id: key.entry_id.clone(),
        sub_entry_id: key.sub_entry_id.clone(),
    }
}

pub(crate) fn ensure_field(kind: LogKind, owned: &[Field], key: &FieldKey) -> Result<()> {
    if owned.contains(&key.field) {
        Ok(())
    } else {
        Err(TimecardError::UnknownField {
            kind,
            field: key.field,
        })
    }
}

/// Leaf kinds address fields without a sub-entry id.
pub(crate) fn ensure_leaf_key(kind: LogKind, key: &FieldKey) -> Result<()> {
    if key.sub_entry_id.is_some() {
        return Err(not_found(kind, key));
    }
    Ok(())
}

pub(crate) fn sub_id(kind: LogKind, key: &FieldKey) -> Result<&str> {
    key.sub_entry_id.as_deref().ok_or_else(|| not_found(kind, key))
}

/// Both ends present and `end < start`.
pub(crate) fn ends_before_start<T: PartialOrd>(start: &Option<T>, end: &Option<T>) -> bool {
    matches!((start, end), (Some(s), Some(e)) if e < s)
}

/// Absent, cleared, or at least zero.
pub(crate) fn non_negative(value: &Option<Option<f64>>) -> bool {
    value.flatten().map_or(true, |v| v >= 0.0)
}
