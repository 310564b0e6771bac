//! Reconciliation controller.
//!
//! Owns the original snapshot and the working copy for the selected
//! `(date, kind)` and orchestrates the edit workflow:
//!
//! 1. `select_kind_or_date` loads both copies from the store
//! 2. `stage` / `commit` move input through the edit buffer into the working copy
//! 3. `save` diffs the working copy against the snapshot and patches the store
//! 4. `cancel` restores the working copy from the snapshot
//!
//! Async operations borrow the controller mutably, so a second save cannot
//! start while one is in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::adapters::{AdapterRegistry, EditContext, LogAdapter};
use crate::config::EngineConfig;
use crate::editing::{EditBuffer, FocusSet};
use crate::error::{Result, TimecardError};
use crate::logging::structured::LogContext;
use crate::storage::models::{FieldKey, LogKind, TopLevelRecord};
use crate::storage::patches::PatchRecord;
use crate::storage::store::LogStore;
use crate::{log_debug, log_error, log_info, log_warn};

use super::context::{ReviewContext, Selection};

/// Result of committing one staged field.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The staged value was written to the working copy.
    Applied,
    /// The staged value failed validation; the field is unchanged.
    Rejected(TimecardError),
    /// Nothing was staged for the key.
    NotStaged,
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No valid record differed from the snapshot; the store was not called.
    NoChanges,
    /// The store accepted `patched` records and the selection was reloaded.
    Saved { patched: usize },
}

/// What clicking a row does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActivation {
    /// Review mode: the row's selection was flipped.
    Toggled { selected: bool },
    /// Edit surface: the row opens for editing.
    OpenForEdit,
}

pub struct ReconciliationController {
    store: Arc<dyn LogStore>,
    registry: AdapterRegistry,
    edit_ctx: EditContext,
    review: ReviewContext,
    selection: Option<Selection>,
    original: Vec<TopLevelRecord>,
    working: Vec<TopLevelRecord>,
    buffer: EditBuffer,
    focus: FocusSet,
    edit_mode: bool,
    review_mode: bool,
}

impl ReconciliationController {
    pub fn new(store: Arc<dyn LogStore>, employee_id: &str, edit_ctx: EditContext) -> Self {
        Self::with_registry(store, AdapterRegistry::standard(), employee_id, edit_ctx)
    }

    pub fn with_registry(
        store: Arc<dyn LogStore>,
        registry: AdapterRegistry,
        employee_id: &str,
        edit_ctx: EditContext,
    ) -> Self {
        let review = ReviewContext::new(employee_id);
        log_info!(review.log_context(None), "REVIEW_SESSION_STARTED");
        Self {
            store,
            registry,
            edit_ctx,
            review,
            selection: None,
            original: Vec::new(),
            working: Vec::new(),
            buffer: EditBuffer::new(),
            focus: FocusSet::new(),
            edit_mode: false,
            review_mode: false,
        }
    }

    pub fn from_config(store: Arc<dyn LogStore>, employee_id: &str, config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(store, employee_id, config.edit_context()?))
    }

    fn log_ctx(&self) -> LogContext {
        self.review.log_context(self.selection.as_ref())
    }

    fn active(&self) -> Result<(Selection, &dyn LogAdapter)> {
        let selection = self.selection.ok_or(TimecardError::NoSelection)?;
        Ok((selection, self.registry.get(selection.kind)?))
    }

    async fn fetch(&self, selection: Selection) -> Result<Vec<TopLevelRecord>> {
        let adapter = self.registry.get(selection.kind)?;
        let mut records = self
            .store
            .fetch_logs(&self.review.employee_id, selection.date, selection.kind)
            .await
            .map_err(|e| TimecardError::collaborator("fetchLogs", e))?;
        adapter.normalize(&mut records);
        Ok(records)
    }

    fn install(&mut self, selection: Selection, records: Vec<TopLevelRecord>) {
        self.selection = Some(selection);
        self.working = records.clone();
        self.original = records;
        self.buffer.clear();
        self.focus.clear();
        self.edit_mode = false;
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Load `(date, kind)`, replacing both copies and discarding all edits.
    ///
    /// # Errors
    ///
    /// On a fetch failure the previous selection and its edits are kept.
    pub async fn select_kind_or_date(&mut self, kind: LogKind, date: NaiveDate) -> Result<()> {
        let selection = Selection::new(kind, date);
        let ctx = self.review.log_context(Some(&selection));
        if self.is_dirty() {
            log_info!(ctx, "UNSAVED_EDITS_DISCARDED", previous = self.selection.map(|s| s.to_string()));
        }

        let records = match self.fetch(selection).await {
            Ok(records) => records,
            Err(e) => {
                log_error!(ctx, "LOGS_FETCH_FAILED", date = date.to_string(), error = e.to_string());
                return Err(e);
            }
        };

        log_info!(
            ctx,
            "LOGS_LOADED",
            date = date.to_string(),
            containers = records.len(),
            entries = records.iter().map(|r| r.entries.len()).sum::<usize>()
        );
        self.install(selection, records);
        Ok(())
    }

    pub fn begin_edit(&mut self) {
        log_debug!(self.log_ctx(), "EDIT_MODE_ENTERED");
        self.edit_mode = true;
    }

    pub fn set_review_mode(&mut self, enabled: bool) {
        self.review_mode = enabled;
        if !enabled {
            self.focus.clear();
        }
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Stage input for a field without touching the working copy.
    pub fn stage(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        log_debug!(self.log_ctx(), "FIELD_STAGED", key = key.to_string(), value = &value);
        self.buffer.stage(key, value);
    }

    /// Apply the staged value for `key` to the working copy and unstage it.
    ///
    /// # Errors
    ///
    /// Fails without a selection, or when the key does not address a field
    /// of the active kind. Bad input is reported as `CommitOutcome::Rejected`.
    pub fn commit(&mut self, key: &FieldKey) -> Result<CommitOutcome> {
        self.active()?;
        let Some(raw) = self.buffer.take(key) else {
            return Ok(CommitOutcome::NotStaged);
        };

        match self.apply_field_edit(key, &raw) {
            Ok(()) => {
                log_debug!(self.log_ctx(), "FIELD_COMMITTED", key = key.to_string());
                Ok(CommitOutcome::Applied)
            }
            Err(e) if e.is_validation_gap() => {
                log_warn!(self.log_ctx(), "FIELD_REJECTED", key = key.to_string(), error = e.to_string());
                Ok(CommitOutcome::Rejected(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Commit every staged key. Returns the keys whose input was rejected.
    pub fn commit_all(&mut self) -> Result<Vec<FieldKey>> {
        let mut rejected = Vec::new();
        for key in self.buffer.keys() {
            if let CommitOutcome::Rejected(_) = self.commit(&key)? {
                rejected.push(key);
            }
        }
        Ok(rejected)
    }

    /// Write `raw` into the working copy through the active adapter.
    pub fn apply_field_edit(&mut self, key: &FieldKey, raw: &str) -> Result<()> {
        let selection = self.selection.ok_or(TimecardError::NoSelection)?;
        let adapter = self.registry.get(selection.kind)?;
        adapter.set_field(&mut self.working, key, raw, &self.edit_ctx)
    }

    /// Working-copy value of a field as an input shows it.
    pub fn field_value(&self, key: &FieldKey) -> Result<String> {
        let (_, adapter) = self.active()?;
        adapter.read_field(&self.working, key, &self.edit_ctx)
    }

    /// Staged value if present, else the working-copy value.
    pub fn display_value(&self, key: &FieldKey) -> Result<String> {
        if let Some(staged) = self.buffer.get(key) {
            return Ok(staged.to_string());
        }
        self.field_value(key)
    }

    pub fn toggle_focus(&mut self, id: &str) -> bool {
        let selected = self.focus.toggle(id);
        log_debug!(self.log_ctx(), "FOCUS_TOGGLED", id = id, selected = selected);
        selected
    }

    pub fn activate_row(&mut self, id: &str) -> RowActivation {
        if self.review_mode {
            RowActivation::Toggled {
                selected: self.toggle_focus(id),
            }
        } else {
            RowActivation::OpenForEdit
        }
    }

    // =========================================================================
    // Save / cancel
    // =========================================================================

    /// Valid working-copy records that differ from the snapshot, reduced to
    /// their changed fields.
    pub fn pending_patches(&self) -> Result<Vec<PatchRecord>> {
        let (_, adapter) = self.active()?;
        let ctx = self.log_ctx();

        let baseline = adapter.flatten(&self.original);
        let baseline: HashMap<(&str, &str), &PatchRecord> =
            baseline.iter().map(|p| (p.match_key(), p)).collect();

        let mut pending = Vec::new();
        for patch in adapter.flatten(&self.working) {
            if !adapter.is_valid(&patch) {
                log_warn!(ctx, "PATCH_INVALID_SKIPPED", id = patch.id());
                continue;
            }
            if let Some(reduced) = patch.changed_since(baseline.get(&patch.match_key()).copied()) {
                pending.push(reduced);
            }
        }
        Ok(pending)
    }

    /// Send the pending patches, then reload the selection.
    ///
    /// Staged but uncommitted input is not included.
    ///
    /// # Errors
    ///
    /// Store failures and rejected patch lists leave the working copy, edit
    /// buffer, and edit mode untouched. There is no retry.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let (selection, _) = self.active()?;
        let ctx = self.log_ctx();
        let patches = self.pending_patches()?;

        if patches.is_empty() {
            log_info!(ctx, "SAVE_SKIPPED", reason = "no valid changes");
            return Ok(SaveOutcome::NoChanges);
        }

        log_info!(ctx, "SAVE_STARTED", patches = patches.len());
        let outcome = match self.store.patch_logs(selection.kind, &patches).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log_error!(ctx, "SAVE_FAILED", error = e.to_string());
                return Err(TimecardError::collaborator("patchLogs", e));
            }
        };
        if !outcome.success {
            log_error!(ctx, "SAVE_REJECTED", patches = patches.len());
            return Err(TimecardError::PatchRejected {
                kind: selection.kind,
                count: patches.len(),
            });
        }

        let records = match self.fetch(selection).await {
            Ok(records) => records,
            Err(e) => {
                log_error!(ctx, "SAVE_REFETCH_FAILED", error = e.to_string());
                return Err(e);
            }
        };
        self.install(selection, records);
        log_info!(ctx, "SAVE_COMPLETE", patched = patches.len());
        Ok(SaveOutcome::Saved {
            patched: patches.len(),
        })
    }

    /// Discard staged input and restore the working copy from the snapshot.
    pub fn cancel(&mut self) {
        if self.is_dirty() || !self.buffer.is_empty() {
            log_info!(self.log_ctx(), "EDITS_CANCELLED", staged = self.buffer.len());
        }
        self.buffer.clear();
        self.working = self.original.clone();
        self.edit_mode = false;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn employee_id(&self) -> &str {
        &self.review.employee_id
    }

    pub fn original(&self) -> &[TopLevelRecord] {
        &self.original
    }

    pub fn working(&self) -> &[TopLevelRecord] {
        &self.working
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn focus(&self) -> &FocusSet {
        &self.focus
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn review_mode(&self) -> bool {
        self.review_mode
    }

    /// True when committed edits differ from the snapshot.
    pub fn is_dirty(&self) -> bool {
        self.working != self.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryLogStore;
    use crate::storage::models::{Field, LogEntry, MileageEntry};
    use crate::storage::patches::MileagePatch;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 7).unwrap()
    }

    fn seeded_store() -> Arc<InMemoryLogStore> {
        let store = Arc::new(InMemoryLogStore::new());
        store.insert(
            "emp-1",
            date(),
            LogKind::Mileage,
            vec![TopLevelRecord {
                id: "day-1".to_string(),
                employee_id: "emp-1".to_string(),
                date: date(),
                entries: vec![LogEntry::Mileage(MileageEntry {
                    id: "ml-1".to_string(),
                    equipment_id: Some("truck-3".to_string()),
                    starting_mileage: Some(100.0),
                    ending_mileage: Some(180.0),
                })],
            }],
        );
        store
    }

    async fn loaded(store: Arc<InMemoryLogStore>) -> ReconciliationController {
        let mut controller = ReconciliationController::new(store, "emp-1", EditContext::default());
        controller
            .select_kind_or_date(LogKind::Mileage, date())
            .await
            .unwrap();
        controller
    }

    #[test]
    fn test_commit_requires_selection() {
        let store = Arc::new(InMemoryLogStore::new());
        let mut controller = ReconciliationController::new(store, "emp-1", EditContext::default());
        let key = FieldKey::entry("ml-1", Field::EndingMileage);
        assert!(matches!(controller.commit(&key), Err(TimecardError::NoSelection)));
    }

    #[tokio::test]
    async fn test_save_sends_only_changed_field() {
        let store = seeded_store();
        let mut controller = loaded(store.clone()).await;
        controller.begin_edit();

        let key = FieldKey::entry("ml-1", Field::EndingMileage);
        controller.stage(key.clone(), "210");
        assert!(controller.commit(&key).unwrap().is_applied());

        let outcome = controller.save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { patched: 1 });
        assert_eq!(
            store.patch_calls()[0].1,
            vec![PatchRecord::Mileage(MileagePatch {
                id: "ml-1".to_string(),
                starting_mileage: None,
                ending_mileage: Some(Some(210.0)),
            })]
        );
        assert!(!controller.edit_mode());
        assert!(!controller.is_dirty());
        assert_eq!(controller.field_value(&key).unwrap(), "210");
    }

    #[tokio::test]
    async fn test_rejected_input_keeps_field() {
        let mut controller = loaded(seeded_store()).await;
        let key = FieldKey::entry("ml-1", Field::StartingMileage);
        controller.stage(key.clone(), "1o0");
        let outcome = controller.commit(&key).unwrap();
        assert!(matches!(outcome, CommitOutcome::Rejected(TimecardError::InvalidNumber { .. })));
        assert_eq!(controller.display_value(&key).unwrap(), "100");
        assert!(!controller.is_dirty());
    }

    #[tokio::test]
    async fn test_invalid_record_makes_save_a_no_op() {
        let store = seeded_store();
        let mut controller = loaded(store.clone()).await;
        let key = FieldKey::entry("ml-1", Field::EndingMileage);
        controller.stage(key.clone(), "50");
        controller.commit(&key).unwrap();

        assert_eq!(controller.save().await.unwrap(), SaveOutcome::NoChanges);
        assert!(store.patch_calls().is_empty());
        assert!(controller.is_dirty());
    }

    #[tokio::test]
    async fn test_rejected_patch_list_keeps_working_copy() {
        let store = seeded_store();
        store.set_accept_patches(false);
        let mut controller = loaded(store.clone()).await;
        controller.begin_edit();
        let key = FieldKey::entry("ml-1", Field::EndingMileage);
        controller.apply_field_edit(&key, "190").unwrap();

        let err = controller.save().await.unwrap_err();
        assert!(matches!(err, TimecardError::PatchRejected { count: 1, .. }));
        assert!(controller.edit_mode());
        assert_eq!(controller.field_value(&key).unwrap(), "190");
    }

    #[tokio::test]
    async fn test_activate_row_depends_on_mode() {
        let mut controller = loaded(seeded_store()).await;
        assert_eq!(controller.activate_row("ml-1"), RowActivation::OpenForEdit);

        controller.set_review_mode(true);
        assert_eq!(
            controller.activate_row("ml-1"),
            RowActivation::Toggled { selected: true }
        );
        assert!(controller.focus().contains("ml-1"));
        controller.set_review_mode(false);
        assert!(controller.focus().is_empty());
    }

    #[tokio::test]
    async fn test_commit_all_reports_rejections() {
        let mut controller = loaded(seeded_store()).await;
        let start = FieldKey::entry("ml-1", Field::StartingMileage);
        let end = FieldKey::entry("ml-1", Field::EndingMileage);
        controller.stage(start.clone(), "abc");
        controller.stage(end.clone(), "200");

        let rejected = controller.commit_all().unwrap();
        assert_eq!(rejected, vec![start]);
        assert!(controller.buffer().is_empty());
        assert_eq!(controller.field_value(&end).unwrap(), "200");
    }
}
