//! Trucking mileage adapter.

use crate::error::Result;
use crate::extraction::value::{format_number, parse_number};
use crate::storage::models::{Field, FieldKey, LogEntry, LogKind, TopLevelRecord};
use crate::storage::patches::{carry, MileagePatch, PatchRecord};

use super::{
    ends_before_start, ensure_field, ensure_leaf_key, find_entry, find_entry_mut, index_patches,
    lookup, non_negative, not_found, overwrite, EditContext, LogAdapter,
};

const FIELDS: &[Field] = &[Field::StartingMileage, Field::EndingMileage];

#[derive(Debug, Clone, Copy, Default)]
pub struct MileageAdapter;

impl LogAdapter for MileageAdapter {
    fn kind(&self) -> LogKind {
        LogKind::Mileage
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        records
            .iter()
            .flat_map(|r| r.entries.iter())
            .filter_map(|entry| match entry {
                LogEntry::Mileage(e) if !e.id.is_empty() => {
                    Some(PatchRecord::Mileage(MileagePatch {
                        id: e.id.clone(),
                        starting_mileage: carry(&e.starting_mileage),
                        ending_mileage: carry(&e.ending_mileage),
                    }))
                }
                _ => None,
            })
            .filter(|p| !p.is_blank())
            .collect()
    }

    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord> {
        let index = index_patches(patches);
        let mut rebuilt = original.to_vec();
        for entry in rebuilt.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            let LogEntry::Mileage(e) = entry else { continue };
            if let Some(PatchRecord::Mileage(p)) = lookup(&index, "", &e.id) {
                overwrite(&mut e.starting_mileage, &p.starting_mileage);
                overwrite(&mut e.ending_mileage, &p.ending_mileage);
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, _ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind(), FIELDS, key)?;
        ensure_leaf_key(self.kind(), key)?;
        let Some((_, LogEntry::Mileage(e))) = find_entry(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        Ok(match key.field {
            Field::StartingMileage => format_number(e.starting_mileage),
            _ => format_number(e.ending_mileage),
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
        ensure_leaf_key(self.kind(), key)?;
        let value = parse_number(key.field, raw)?;
        let Some((_, LogEntry::Mileage(e))) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        match key.field {
            Field::StartingMileage => e.starting_mileage = value,
            _ => e.ending_mileage = value,
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        match patch {
            PatchRecord::Mileage(p) => {
                non_negative(&p.starting_mileage)
                    && non_negative(&p.ending_mileage)
                    && !ends_before_start(&p.starting_mileage.flatten(), &p.ending_mileage.flatten())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::MileageEntry;
    use chrono::NaiveDate;

    fn records() -> Vec<TopLevelRecord> {
        vec![TopLevelRecord {
            id: "day-1".to_string(),
            employee_id: "emp-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
            entries: vec![LogEntry::Mileage(MileageEntry {
                id: "tl-1".to_string(),
                equipment_id: Some("truck-3".to_string()),
                starting_mileage: Some(120_000.0),
                ending_mileage: Some(120_250.0),
            })],
        }]
    }

    #[test]
    fn test_clearing_both_readings_drops_patch() {
        let mut working = records();
        let ctx = EditContext::default();
        MileageAdapter
            .set_field(&mut working, &FieldKey::entry("tl-1", Field::StartingMileage), "", &ctx)
            .unwrap();
        assert_eq!(MileageAdapter.flatten(&working).len(), 1);
        MileageAdapter
            .set_field(&mut working, &FieldKey::entry("tl-1", Field::EndingMileage), " ", &ctx)
            .unwrap();
        assert!(MileageAdapter.flatten(&working).is_empty());
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut working = records();
        let key = FieldKey::entry("tl-1", Field::EndingMileage);
        assert!(MileageAdapter
            .set_field(&mut working, &key, "12o", &EditContext::default())
            .is_err());
        assert_eq!(
            MileageAdapter
                .read_field(&working, &key, &EditContext::default())
                .unwrap(),
            "120250"
        );
    }

    #[test]
    fn test_validity() {
        let patch = |start, end| {
            PatchRecord::Mileage(MileagePatch {
                id: "tl-1".to_string(),
                starting_mileage: start,
                ending_mileage: end,
            })
        };
        assert!(MileageAdapter.is_valid(&patch(Some(Some(10.0)), Some(Some(20.0)))));
        assert!(!MileageAdapter.is_valid(&patch(Some(Some(20.0)), Some(Some(10.0)))));
        assert!(!MileageAdapter.is_valid(&patch(Some(Some(-1.0)), None)));
        assert!(MileageAdapter.is_valid(&patch(Some(None), Some(Some(10.0)))));
    }
}
