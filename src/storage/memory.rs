//! In-memory log store.
//!
//! Holds records keyed by `(employee, date, kind)` and applies patch lists
//! through the same adapters the review engine uses. Every call is recorded
//! so embedders and tests can inspect the traffic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::adapters::AdapterRegistry;

use super::models::{LogKind, TopLevelRecord};
use super::patches::PatchRecord;
use super::store::{LogStore, PatchOutcome};

type StoreKey = (String, NaiveDate, LogKind);

#[derive(Debug)]
pub struct InMemoryLogStore {
    registry: AdapterRegistry,
    records: Mutex<HashMap<StoreKey, Vec<TopLevelRecord>>>,
    patch_calls: Mutex<Vec<(LogKind, Vec<PatchRecord>)>>,
    fetch_calls: Mutex<Vec<StoreKey>>,
    accept_patches: Mutex<bool>,
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self {
            registry: AdapterRegistry::standard(),
            records: Mutex::new(HashMap::new()),
            patch_calls: Mutex::new(Vec::new()),
            fetch_calls: Mutex::new(Vec::new()),
            accept_patches: Mutex::new(true),
        }
    }
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the records served for one `(employee, date, kind)`.
    pub fn insert(&self, employee_id: &str, date: NaiveDate, kind: LogKind, records: Vec<TopLevelRecord>) {
        self.records
            .lock()
            .insert((employee_id.to_string(), date, kind), records);
    }

    pub fn records(&self, employee_id: &str, date: NaiveDate, kind: LogKind) -> Vec<TopLevelRecord> {
        self.records
            .lock()
            .get(&(employee_id.to_string(), date, kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Patch lists received so far, in call order.
    pub fn patch_calls(&self) -> Vec<(LogKind, Vec<PatchRecord>)> {
        self.patch_calls.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.lock().len()
    }

    /// When false, patch calls are recorded but answered with `success: false`.
    pub fn set_accept_patches(&self, accept: bool) {
        *self.accept_patches.lock() = accept;
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn fetch_logs(
        &self,
        employee_id: &str,
        date: NaiveDate,
        kind: LogKind,
    ) -> anyhow::Result<Vec<TopLevelRecord>> {
        self.fetch_calls
            .lock()
            .push((employee_id.to_string(), date, kind));
        Ok(self.records(employee_id, date, kind))
    }

    async fn patch_logs(&self, kind: LogKind, patches: &[PatchRecord]) -> anyhow::Result<PatchOutcome> {
        self.patch_calls.lock().push((kind, patches.to_vec()));
        if !*self.accept_patches.lock() {
            return Ok(PatchOutcome { success: false });
        }

        let adapter = self.registry.get(kind)?;
        let mut records = self.records.lock();
        for (key, stored) in records.iter_mut() {
            if key.2 == kind {
                *stored = adapter.reconstruct(stored, patches);
            }
        }
        Ok(PatchOutcome { success: true })
    }
}
