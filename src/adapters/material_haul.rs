//! Material haul adapter.
//!
//! Each material load on a trucking log carries a name, pickup location,
//! quantity, and scale weights.

use crate::error::Result;
use crate::extraction::value::{format_number, format_text, parse_number, parse_text};
use crate::storage::models::{Field, FieldKey, LogEntry, LogKind, MaterialLoad, TopLevelRecord};
use crate::storage::patches::{carry, MaterialPatch, PatchRecord};

use super::{
    ensure_field, find_entry, find_entry_mut, index_patches, lookup, non_negative, not_found,
    overwrite, sub_id, EditContext, LogAdapter,
};

const FIELDS: &[Field] = &[
    Field::Name,
    Field::LocationOfMaterial,
    Field::Quantity,
    Field::MaterialWeight,
    Field::LightWeight,
    Field::GrossWeight,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialHaulAdapter;

fn to_patch(parent_id: &str, load: &MaterialLoad) -> PatchRecord {
    PatchRecord::Material(MaterialPatch {
        id: load.id.clone(),
        parent_id: parent_id.to_string(),
        name: carry(&load.name),
        location_of_material: carry(&load.location_of_material),
        quantity: carry(&load.quantity),
        material_weight: carry(&load.material_weight),
        light_weight: carry(&load.light_weight),
        gross_weight: carry(&load.gross_weight),
    })
}

impl LogAdapter for MaterialHaulAdapter {
    fn kind(&self) -> LogKind {
        LogKind::MaterialHaul
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        let mut patches = Vec::new();
        for entry in records.iter().flat_map(|r| r.entries.iter()) {
            let LogEntry::MaterialHaul(e) = entry else { continue };
            patches.extend(
                e.materials
                    .iter()
                    .filter(|m| !m.id.is_empty())
                    .map(|m| to_patch(&e.id, m))
                    .filter(|p| !p.is_blank()),
            );
        }
        patches
    }

    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord> {
        let index = index_patches(patches);
        let mut rebuilt = original.to_vec();
        for entry in rebuilt.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            let LogEntry::MaterialHaul(e) = entry else { continue };
            for load in e.materials.iter_mut() {
                if let Some(PatchRecord::Material(p)) = lookup(&index, &e.id, &load.id) {
                    overwrite(&mut load.name, &p.name);
                    overwrite(&mut load.location_of_material, &p.location_of_material);
                    overwrite(&mut load.quantity, &p.quantity);
                    overwrite(&mut load.material_weight, &p.material_weight);
                    overwrite(&mut load.light_weight, &p.light_weight);
                    overwrite(&mut load.gross_weight, &p.gross_weight);
                }
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, _ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind(), FIELDS, key)?;
        let sub = sub_id(self.kind(), key)?;
        let Some((_, LogEntry::MaterialHaul(e))) = find_entry(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        let load = e
            .materials
            .iter()
            .find(|m| m.id == sub)
            .ok_or_else(|| not_found(self.kind(), key))?;
        Ok(match key.field {
            Field::Name => format_text(&load.name),
            Field::LocationOfMaterial => format_text(&load.location_of_material),
            Field::Quantity => format_number(load.quantity),
            Field::MaterialWeight => format_number(load.material_weight),
            Field::LightWeight => format_number(load.light_weight),
            _ => format_number(load.gross_weight),
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
        let Some((_, LogEntry::MaterialHaul(e))) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(kind, key));
        };
        let load = e
            .materials
            .iter_mut()
            .find(|m| m.id == sub)
            .ok_or_else(|| not_found(kind, key))?;

        match key.field {
            Field::Name => load.name = parse_text(raw),
            Field::LocationOfMaterial => load.location_of_material = parse_text(raw),
            Field::Quantity => load.quantity = parse_number(key.field, raw)?,
            Field::MaterialWeight => load.material_weight = parse_number(key.field, raw)?,
            Field::LightWeight => load.light_weight = parse_number(key.field, raw)?,
            _ => load.gross_weight = parse_number(key.field, raw)?,
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        let PatchRecord::Material(p) = patch else {
            return false;
        };
        let light_above_gross = matches!(
            (p.light_weight.flatten(), p.gross_weight.flatten()),
            (Some(light), Some(gross)) if light > gross
        );
        non_negative(&p.quantity)
            && non_negative(&p.material_weight)
            && non_negative(&p.light_weight)
            && non_negative(&p.gross_weight)
            && !light_above_gross
    }

    fn normalize(&self, records: &mut [TopLevelRecord]) {
        for entry in records.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            if let LogEntry::MaterialHaul(e) = entry {
                if e.materials.is_empty() {
                    e.materials.push(MaterialLoad::default());
                }
            }
        }
    }
}
