//! Refuel adapter.
//!
//! Serves the three refuel kinds. Equipment and trucking refuels hang off a
//! `LogEntry::Refuel` tagged with its source; tasco refuels hang off a
//! `LogEntry::TascoRefuel`. All share the refuel patch shape. Only trucking
//! refuels record the odometer at fueling.

use crate::error::{Result, TimecardError};
use crate::extraction::value::{format_number, parse_number};
use crate::storage::models::{
    Field, FieldKey, LogEntry, LogKind, RefuelRecord, RefuelSource, TopLevelRecord,
};
use crate::storage::patches::{carry, PatchRecord, RefuelPatch};

use super::{
    ensure_field, find_entry, find_entry_mut, index_patches, lookup, non_negative, not_found,
    overwrite, sub_id, EditContext, LogAdapter,
};

const GALLONS_ONLY: &[Field] = &[Field::GallonsRefueled];
const GALLONS_AND_MILES: &[Field] = &[Field::GallonsRefueled, Field::MilesAtFueling];

#[derive(Debug, Clone, Copy)]
pub struct RefuelAdapter {
    kind: LogKind,
}

impl RefuelAdapter {
    pub const EQUIPMENT: Self = Self {
        kind: LogKind::EquipmentRefuel,
    };
    pub const TRUCKING: Self = Self {
        kind: LogKind::TruckingRefuel,
    };
    pub const TASCO: Self = Self {
        kind: LogKind::TascoRefuel,
    };

    /// Adapter for one of the refuel kinds.
    ///
    /// # Errors
    ///
    /// `AdapterMissing` if `kind` is not a refuel kind.
    pub fn new(kind: LogKind) -> Result<Self> {
        match kind {
            LogKind::EquipmentRefuel | LogKind::TruckingRefuel | LogKind::TascoRefuel => {
                Ok(Self { kind })
            }
            _ => Err(TimecardError::AdapterMissing(kind)),
        }
    }

    fn tracks_miles(&self) -> bool {
        self.kind == LogKind::TruckingRefuel
    }

    fn owns_source(&self, source: RefuelSource) -> bool {
        matches!(
            (self.kind, source),
            (LogKind::EquipmentRefuel, RefuelSource::Equipment)
                | (LogKind::TruckingRefuel, RefuelSource::Trucking)
        )
    }

    /// The entry's refuel list, if the entry belongs to this adapter's kind.
    fn refuels<'a>(&self, entry: &'a LogEntry) -> Option<&'a [RefuelRecord]> {
        match entry {
            LogEntry::Refuel(e) if self.owns_source(e.source) => Some(&e.refuels),
            LogEntry::TascoRefuel(e) if self.kind == LogKind::TascoRefuel => Some(&e.refuels),
            _ => None,
        }
    }

    fn refuels_mut<'a>(&self, entry: &'a mut LogEntry) -> Option<&'a mut Vec<RefuelRecord>> {
        match entry {
            LogEntry::Refuel(e) if self.owns_source(e.source) => Some(&mut e.refuels),
            LogEntry::TascoRefuel(e) if self.kind == LogKind::TascoRefuel => Some(&mut e.refuels),
            _ => None,
        }
    }
}

impl LogAdapter for RefuelAdapter {
    fn kind(&self) -> LogKind {
        self.kind
    }

    fn fields(&self) -> &'static [Field] {
        if self.tracks_miles() {
            GALLONS_AND_MILES
        } else {
            GALLONS_ONLY
        }
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        let mut patches = Vec::new();
        for entry in records.iter().flat_map(|r| r.entries.iter()) {
            let Some(refuels) = self.refuels(entry) else { continue };
            for refuel in refuels.iter().filter(|r| !r.id.is_empty()) {
                let patch = PatchRecord::Refuel(RefuelPatch {
                    id: refuel.id.clone(),
                    parent_id: entry.id().to_string(),
                    gallons_refueled: carry(&refuel.gallons_refueled),
                    miles_at_fueling: if self.tracks_miles() {
                        carry(&refuel.miles_at_fueling)
                    } else {
                        None
                    },
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
            let parent_id = entry.id().to_string();
            let Some(refuels) = self.refuels_mut(entry) else { continue };
            for refuel in refuels.iter_mut() {
                if let Some(PatchRecord::Refuel(p)) = lookup(&index, &parent_id, &refuel.id) {
                    overwrite(&mut refuel.gallons_refueled, &p.gallons_refueled);
                    if self.tracks_miles() {
                        overwrite(&mut refuel.miles_at_fueling, &p.miles_at_fueling);
                    }
                }
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, _ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind, self.fields(), key)?;
        let sub = sub_id(self.kind, key)?;
        let refuel = find_entry(records, &key.entry_id)
            .and_then(|(_, entry)| self.refuels(entry))
            .and_then(|refuels| refuels.iter().find(|r| r.id == sub))
            .ok_or_else(|| not_found(self.kind, key))?;
        Ok(match key.field {
            Field::GallonsRefueled => format_number(refuel.gallons_refueled),
            _ => format_number(refuel.miles_at_fueling),
        })
    }

    fn set_field(
        &self,
        records: &mut [TopLevelRecord],
        key: &FieldKey,
        raw: &str,
        _ctx: &EditContext,
    ) -> Result<()> {
        ensure_field(self.kind, self.fields(), key)?;
        let sub = sub_id(self.kind, key)?;
        let value = parse_number(key.field, raw)?;
        let Some((_, entry)) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(self.kind, key));
        };
        let refuel = self
            .refuels_mut(entry)
            .and_then(|refuels| refuels.iter_mut().find(|r| r.id == sub))
            .ok_or_else(|| not_found(self.kind, key))?;
        match key.field {
            Field::GallonsRefueled => refuel.gallons_refueled = value,
            _ => refuel.miles_at_fueling = value,
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        let PatchRecord::Refuel(p) = patch else {
            return false;
        };
        p.gallons_refueled.flatten().map_or(true, |g| g > 0.0) && non_negative(&p.miles_at_fueling)
    }

    fn normalize(&self, records: &mut [TopLevelRecord]) {
        for entry in records.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            if let Some(refuels) = self.refuels_mut(entry) {
                if refuels.is_empty() {
                    refuels.push(RefuelRecord::default());
                }
            }
        }
    }
}
