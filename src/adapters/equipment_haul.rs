//! Equipment haul adapter.
//!
//! A trucking log owns the pieces of equipment it hauled; each hauled item
//! records what was moved and to which jobsite.

use crate::error::Result;
use crate::extraction::value::{format_text, parse_text};
use crate::storage::models::{Field, FieldKey, HauledItem, LogEntry, LogKind, TopLevelRecord};
use crate::storage::patches::{carried, carry, HauledItemPatch, PatchRecord};

use super::{
    ensure_field, find_entry, find_entry_mut, index_patches, lookup, not_found, overwrite, sub_id,
    EditContext, LogAdapter,
};

const FIELDS: &[Field] = &[Field::EquipmentId, Field::JobsiteId];

#[derive(Debug, Clone, Copy, Default)]
pub struct EquipmentHaulAdapter;

impl LogAdapter for EquipmentHaulAdapter {
    fn kind(&self) -> LogKind {
        LogKind::EquipmentHaul
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        let mut patches = Vec::new();
        for entry in records.iter().flat_map(|r| r.entries.iter()) {
            let LogEntry::EquipmentHaul(e) = entry else { continue };
            for item in e.equipment_hauled.iter().filter(|i| !i.id.is_empty()) {
                let patch = PatchRecord::HauledItem(HauledItemPatch {
                    id: item.id.clone(),
                    parent_id: e.id.clone(),
                    equipment_id: carry(&item.equipment_id),
                    jobsite_id: carry(&item.jobsite_id),
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
            let LogEntry::EquipmentHaul(e) = entry else { continue };
            for item in e.equipment_hauled.iter_mut() {
                if let Some(PatchRecord::HauledItem(p)) = lookup(&index, &e.id, &item.id) {
                    overwrite(&mut item.equipment_id, &p.equipment_id);
                    overwrite(&mut item.jobsite_id, &p.jobsite_id);
                }
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, _ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind(), FIELDS, key)?;
        let sub = sub_id(self.kind(), key)?;
        let Some((_, LogEntry::EquipmentHaul(e))) = find_entry(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        let item = e
            .equipment_hauled
            .iter()
            .find(|i| i.id == sub)
            .ok_or_else(|| not_found(self.kind(), key))?;
        Ok(match key.field {
            Field::EquipmentId => format_text(&item.equipment_id),
            _ => format_text(&item.jobsite_id),
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
        let Some((_, LogEntry::EquipmentHaul(e))) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(kind, key));
        };
        let item = e
            .equipment_hauled
            .iter_mut()
            .find(|i| i.id == sub)
            .ok_or_else(|| not_found(kind, key))?;
        match key.field {
            Field::EquipmentId => item.equipment_id = parse_text(raw),
            _ => item.jobsite_id = parse_text(raw),
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        matches!(patch, PatchRecord::HauledItem(p) if carried(&p.equipment_id).is_some())
    }

    fn normalize(&self, records: &mut [TopLevelRecord]) {
        for entry in records.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            if let LogEntry::EquipmentHaul(e) = entry {
                if e.equipment_hauled.is_empty() {
                    e.equipment_hauled.push(HauledItem::default());
                }
            }
        }
    }
}
