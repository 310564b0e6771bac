//! Timesheet highlight adapter.
//!
//! Highlights are leaf entries: the clocked span, jobsite, and cost code of
//! one timesheet.

use crate::error::{Result, TimecardError};
use crate::extraction::value::{
    apply_time_of_day, format_text, format_time_of_day, parse_text, parse_time_of_day,
};
use crate::storage::models::{Field, FieldKey, HighlightEntry, LogEntry, LogKind, TopLevelRecord};
use crate::storage::patches::{carry, HighlightPatch, PatchRecord};

use super::{
    ends_before_start, ensure_field, ensure_leaf_key, find_entry, find_entry_mut, index_patches,
    lookup, not_found, overwrite, EditContext, LogAdapter,
};

const FIELDS: &[Field] = &[Field::StartTime, Field::EndTime, Field::JobsiteId, Field::CostCode];

#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightAdapter;

impl HighlightAdapter {
    fn to_patch(entry: &HighlightEntry) -> PatchRecord {
        PatchRecord::Highlight(HighlightPatch {
            id: entry.id.clone(),
            start_time: carry(&entry.start_time),
            end_time: carry(&entry.end_time),
            jobsite_id: carry(&entry.jobsite_id),
            cost_code: carry(&entry.cost_code),
        })
    }
}

impl LogAdapter for HighlightAdapter {
    fn kind(&self) -> LogKind {
        LogKind::Highlight
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        records
            .iter()
            .flat_map(|r| r.entries.iter())
            .filter_map(|entry| match entry {
                LogEntry::Highlight(e) if !e.id.is_empty() => Some(Self::to_patch(e)),
                _ => None,
            })
            .filter(|p| !p.is_blank())
            .collect()
    }

    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord> {
        let index = index_patches(patches);
        let mut rebuilt = original.to_vec();
        for entry in rebuilt.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            let LogEntry::Highlight(e) = entry else { continue };
            if let Some(PatchRecord::Highlight(p)) = lookup(&index, "", &e.id) {
                overwrite(&mut e.start_time, &p.start_time);
                overwrite(&mut e.end_time, &p.end_time);
                overwrite(&mut e.jobsite_id, &p.jobsite_id);
                overwrite(&mut e.cost_code, &p.cost_code);
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind(), FIELDS, key)?;
        ensure_leaf_key(self.kind(), key)?;
        let Some((_, LogEntry::Highlight(e))) = find_entry(records, &key.entry_id) else {
            return Err(not_found(self.kind(), key));
        };
        Ok(match key.field {
            Field::StartTime => format_time_of_day(e.start_time, ctx.offset),
            Field::EndTime => format_time_of_day(e.end_time, ctx.offset),
            Field::JobsiteId => format_text(&e.jobsite_id),
            _ => format_text(&e.cost_code),
        })
    }

    fn set_field(
        &self,
        records: &mut [TopLevelRecord],
        key: &FieldKey,
        raw: &str,
        ctx: &EditContext,
    ) -> Result<()> {
        ensure_field(self.kind(), FIELDS, key)?;
        ensure_leaf_key(self.kind(), key)?;
        let kind = self.kind();
        let Some((date, LogEntry::Highlight(e))) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(kind, key));
        };

        match key.field {
            Field::StartTime | Field::EndTime => {
                let time = parse_time_of_day(key.field, raw)?;
                let target = if key.field == Field::StartTime {
                    &mut e.start_time
                } else {
                    &mut e.end_time
                };
                let updated = apply_time_of_day(*target, date, time, ctx.offset).ok_or_else(|| {
                    TimecardError::InvalidTime {
                        field: key.field,
                        input: raw.to_string(),
                    }
                })?;
                *target = Some(updated);
            }
            Field::JobsiteId => e.jobsite_id = parse_text(raw),
            _ => e.cost_code = parse_text(raw),
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        match patch {
            PatchRecord::Highlight(p) => {
                !ends_before_start(&p.start_time.flatten(), &p.end_time.flatten())
            }
            _ => false,
        }
    }
}
