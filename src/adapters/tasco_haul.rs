//! Tasco haul adapter.
//!
//! Tasco logs are leaf entries describing one shift of material hauling.

use crate::error::Result;
use crate::extraction::value::{format_number, format_text, parse_number, parse_text};
use crate::storage::models::{Field, FieldKey, LogEntry, LogKind, TascoHaulEntry, TopLevelRecord};
use crate::storage::patches::{carry, PatchRecord, TascoHaulPatch};

use super::{
    ensure_field, ensure_leaf_key, find_entry, find_entry_mut, index_patches, lookup,
    non_negative, not_found, overwrite, EditContext, LogAdapter,
};

const FIELDS: &[Field] = &[
    Field::ShiftType,
    Field::EquipmentId,
    Field::LaborType,
    Field::MaterialType,
    Field::LoadQuantity,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TascoHaulAdapter;

fn to_patch(entry: &TascoHaulEntry) -> PatchRecord {
    PatchRecord::TascoHaul(TascoHaulPatch {
        id: entry.id.clone(),
        shift_type: carry(&entry.shift_type),
        equipment_id: carry(&entry.equipment_id),
        labor_type: carry(&entry.labor_type),
        material_type: carry(&entry.material_type),
        load_quantity: carry(&entry.load_quantity),
    })
}

impl LogAdapter for TascoHaulAdapter {
    fn kind(&self) -> LogKind {
        LogKind::TascoHaul
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        records
            .iter()
            .flat_map(|r| r.entries.iter())
            .filter_map(|entry| match entry {
                LogEntry::TascoHaul(e) if !e.id.is_empty() => Some(to_patch(e)),
                _ => None,
            })
            .filter(|p| !p.is_blank())
            .collect()
    }

    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord> {
        let index = index_patches(patches);
        let mut rebuilt = original.to_vec();
        for entry in rebuilt.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            let LogEntry::TascoHaul(e) = entry else { continue };
            if let Some(PatchRecord::TascoHaul(p)) = lookup(&index, "", &e.id) {
                overwrite(&mut e.shift_type, &p.shift_type);
                overwrite(&mut e.equipment_id, &p.equipment_id);
                overwrite(&mut e.labor_type, &p.labor_type);
                overwrite(&mut e.material_type, &p.material_type);
                overwrite(&mut e.load_quantity, &p.load_quantity);
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, _ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind(), FIELDS, key)?;
        ensure_leaf_key(self.kind(), key)?;
        let Some((_, LogEntry::TascoHaul(e))) = find_entry(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        Ok(match key.field {
            Field::ShiftType => format_text(&e.shift_type),
            Field::EquipmentId => format_text(&e.equipment_id),
            Field::LaborType => format_text(&e.labor_type),
            Field::MaterialType => format_text(&e.material_type),
            _ => format_number(e.load_quantity),
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
        let kind = self.kind();
        let Some((_, LogEntry::TascoHaul(e))) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(kind, key));
        };
        match key.field {
            Field::ShiftType => e.shift_type = parse_text(raw),
            Field::EquipmentId => e.equipment_id = parse_text(raw),
            Field::LaborType => e.labor_type = parse_text(raw),
            Field::MaterialType => e.material_type = parse_text(raw),
            _ => e.load_quantity = parse_number(key.field, raw)?,
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        matches!(patch, PatchRecord::TascoHaul(p) if non_negative(&p.load_quantity))
    }
}
