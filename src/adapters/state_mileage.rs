//! State-line mileage adapter.

use crate::error::Result;
use crate::extraction::value::{format_number, format_text, parse_number, parse_state_code};
use crate::storage::models::{Field, FieldKey, LogEntry, LogKind, StateMileage, TopLevelRecord};
use crate::storage::patches::{carried, carry, PatchRecord, StateMileagePatch};

use super::{
    ensure_field, find_entry, find_entry_mut, index_patches, lookup, non_negative, not_found,
    overwrite, sub_id, EditContext, LogAdapter,
};

const FIELDS: &[Field] = &[Field::State, Field::StateLineMileage];

#[derive(Debug, Clone, Copy, Default)]
pub struct StateMileageAdapter;

impl LogAdapter for StateMileageAdapter {
    fn kind(&self) -> LogKind {
        LogKind::StateMileage
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        let mut patches = Vec::new();
        for entry in records.iter().flat_map(|r| r.entries.iter()) {
            let LogEntry::StateMileage(e) = entry else { continue };
            for crossing in e.state_mileages.iter().filter(|s| !s.id.is_empty()) {
                let patch = PatchRecord::StateMileage(StateMileagePatch {
                    id: crossing.id.clone(),
                    parent_id: e.id.clone(),
                    state: carry(&crossing.state),
                    state_line_mileage: carry(&crossing.state_line_mileage),
                });
                if !patch.is_blank() {
                    patches.push(patch);
                }
            }
        }
        patches
    }

    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord> {
        let index = index_patches(patches);
        let mut rebuilt = original.to_vec();
        for entry in rebuilt.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            let LogEntry::StateMileage(e) = entry else { continue };
            for crossing in e.state_mileages.iter_mut() {
                if let Some(PatchRecord::StateMileage(p)) = lookup(&index, &e.id, &crossing.id) {
                    overwrite(&mut crossing.state, &p.state);
                    overwrite(&mut crossing.state_line_mileage, &p.state_line_mileage);
                }
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, _ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind(), FIELDS, key)?;
        let sub = sub_id(self.kind(), key)?;
        let Some((_, LogEntry::StateMileage(e))) = find_entry(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        let crossing = e
            .state_mileages
            .iter()
            .find(|s| s.id == sub)
            .ok_or_else(|| not_found(self.kind(), key))?;
        Ok(match key.field {
            Field::State => format_text(&crossing.state),
            _ => format_number(crossing.state_line_mileage),
        })
    }

    fn set_field(
        &self,
        records: &mut [TopLevelRecord],
        key: &FieldKey,
        raw: &str,
        _ctx: &EditContext,
    ) -> Result<()> {
        ensure_field(self.kind(), FIELDS, key)?;
        let kind = self.kind();
        let sub = sub_id(kind, key)?;
        let Some((_, LogEntry::StateMileage(e))) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(kind, key));
        };
        let crossing = e
            .state_mileages
            .iter_mut()
            .find(|s| s.id == sub)
            .ok_or_else(|| not_found(kind, key))?;
        match key.field {
            Field::State => crossing.state = parse_state_code(key.field, raw)?,
            _ => crossing.state_line_mileage = parse_number(key.field, raw)?,
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        let PatchRecord::StateMileage(p) = patch else {
            return false;
        };
        let state_ok = carried(&p.state).map_or(true, |s| {
            s.len() == 2 && s.chars().all(|c| c.is_ascii_uppercase())
        });
        state_ok && non_negative(&p.state_line_mileage)
    }

    fn normalize(&self, records: &mut [TopLevelRecord]) {
        for entry in records.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            if let LogEntry::StateMileage(e) = entry {
                if e.state_mileages.is_empty() {
                    e.state_mileages.push(StateMileage::default());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::StateMileageEntry;
    use chrono::NaiveDate;

    fn records() -> Vec<TopLevelRecord> {
        vec![TopLevelRecord {
            id: "day-1".to_string(),
            employee_id: "emp-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
            entries: vec![LogEntry::StateMileage(StateMileageEntry {
                id: "tl-1".to_string(),
                state_mileages: vec![StateMileage {
                    id: "sm-1".to_string(),
                    state: Some("UT".to_string()),
                    state_line_mileage: Some(120_180.0),
                }],
            })],
        }]
    }

    #[test]
    fn test_state_normalised_to_upper_case() {
        let mut working = records();
        let key = FieldKey::sub_entry("tl-1", "sm-1", Field::State);
        StateMileageAdapter
            .set_field(&mut working, &key, "nv", &EditContext::default())
            .unwrap();
        let patches = StateMileageAdapter.flatten(&working);
        let PatchRecord::StateMileage(p) = &patches[0] else { panic!() };
        assert_eq!(carried(&p.state).map(String::as_str), Some("NV"));
        assert!(StateMileageAdapter.is_valid(&patches[0]));
    }

    #[test]
    fn test_bad_state_leaves_field() {
        let mut working = records();
        let key = FieldKey::sub_entry("tl-1", "sm-1", Field::State);
        let err = StateMileageAdapter
            .set_field(&mut working, &key, "Nevada", &EditContext::default())
            .unwrap_err();
        assert!(err.is_validation_gap());
        assert_eq!(working, records());
    }
}
