//! Work session adapter.
//!
//! Serves equipment usage logs and mechanic maintenance sessions. Both are
//! leaf entries with a start/end span and a comment; only equipment usage
//! lets the reviewer change which equipment was used.

use chrono::{DateTime, Utc};

use crate::error::{Result, TimecardError};
use crate::extraction::value::{
    apply_time_of_day, format_text, format_time_of_day, parse_text, parse_time_of_day,
};
use crate::storage::models::{Field, FieldKey, LogEntry, LogKind, TopLevelRecord};
use crate::storage::patches::{carry, PatchRecord, SessionPatch};

use super::{
    ends_before_start, ensure_field, ensure_leaf_key, find_entry, find_entry_mut, index_patches,
    lookup, not_found, overwrite, EditContext, LogAdapter,
};

const USAGE_FIELDS: &[Field] = &[
    Field::EquipmentId,
    Field::StartTime,
    Field::EndTime,
    Field::Comment,
];
const MAINTENANCE_FIELDS: &[Field] = &[Field::StartTime, Field::EndTime, Field::Comment];

/// Mutable view over the session fields of either entry case.
struct SessionFields<'a> {
    equipment_id: Option<&'a mut Option<String>>,
    start_time: &'a mut Option<DateTime<Utc>>,
    end_time: &'a mut Option<DateTime<Utc>>,
    comment: &'a mut Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionAdapter {
    kind: LogKind,
}

impl SessionAdapter {
    pub const EQUIPMENT_USAGE: Self = Self {
        kind: LogKind::EquipmentUsage,
    };
    pub const MAINTENANCE: Self = Self {
        kind: LogKind::Maintenance,
    };

    /// # Errors
    ///
    /// `AdapterMissing` if `kind` is neither equipment usage nor maintenance.
    pub fn new(kind: LogKind) -> Result<Self> {
        match kind {
            LogKind::EquipmentUsage | LogKind::Maintenance => Ok(Self { kind }),
            _ => Err(TimecardError::AdapterMissing(kind)),
        }
    }

    fn to_patch(&self, entry: &LogEntry) -> Option<SessionPatch> {
        match (self.kind, entry) {
            (LogKind::EquipmentUsage, LogEntry::EquipmentUsage(e)) => Some(SessionPatch {
                id: e.id.clone(),
                equipment_id: carry(&e.equipment_id),
                start_time: carry(&e.start_time),
                end_time: carry(&e.end_time),
                comment: carry(&e.comment),
            }),
            (LogKind::Maintenance, LogEntry::MaintenanceSession(e)) => Some(SessionPatch {
                id: e.id.clone(),
                equipment_id: None,
                start_time: carry(&e.start_time),
                end_time: carry(&e.end_time),
                comment: carry(&e.comment),
            }),
            _ => None,
        }
    }

    fn fields_mut<'a>(&self, entry: &'a mut LogEntry) -> Option<SessionFields<'a>> {
        match (self.kind, entry) {
            (LogKind::EquipmentUsage, LogEntry::EquipmentUsage(e)) => Some(SessionFields {
                equipment_id: Some(&mut e.equipment_id),
                start_time: &mut e.start_time,
                end_time: &mut e.end_time,
                comment: &mut e.comment,
            }),
            (LogKind::Maintenance, LogEntry::MaintenanceSession(e)) => Some(SessionFields {
                equipment_id: None,
                start_time: &mut e.start_time,
                end_time: &mut e.end_time,
                comment: &mut e.comment,
            }),
            _ => None,
        }
    }
}

impl LogAdapter for SessionAdapter {
    fn kind(&self) -> LogKind {
        self.kind
    }

    fn fields(&self) -> &'static [Field] {
        match self.kind {
            LogKind::EquipmentUsage => USAGE_FIELDS,
            _ => MAINTENANCE_FIELDS,
        }
    }

    fn flatten(&self, records: &[TopLevelRecord]) -> Vec<PatchRecord> {
        records
            .iter()
            .flat_map(|r| r.entries.iter())
            .filter_map(|entry| self.to_patch(entry))
            .filter(|p| !p.id.is_empty())
            .map(PatchRecord::Session)
            .filter(|p| !p.is_blank())
            .collect()
    }

    fn reconstruct(&self, original: &[TopLevelRecord], patches: &[PatchRecord]) -> Vec<TopLevelRecord> {
        let index = index_patches(patches);
        let mut rebuilt = original.to_vec();
        for entry in rebuilt.iter_mut().flat_map(|r| r.entries.iter_mut()) {
            let id = entry.id().to_string();
            let Some(fields) = self.fields_mut(entry) else { continue };
            if let Some(PatchRecord::Session(p)) = lookup(&index, "", &id) {
                if let Some(equipment_id) = fields.equipment_id {
                    overwrite(equipment_id, &p.equipment_id);
                }
                overwrite(fields.start_time, &p.start_time);
                overwrite(fields.end_time, &p.end_time);
                overwrite(fields.comment, &p.comment);
            }
        }
        rebuilt
    }

    fn read_field(&self, records: &[TopLevelRecord], key: &FieldKey, ctx: &EditContext) -> Result<String> {
        ensure_field(self.kind, self.fields(), key)?;
        ensure_leaf_key(self.kind, key)?;
        let session = find_entry(records, &key.entry_id)
            .and_then(|(_, entry)| self.to_patch(entry))
            .ok_or_else(|| not_found(self.kind, key))?;
        Ok(match key.field {
            Field::EquipmentId => format_text(&session.equipment_id.flatten()),
            Field::StartTime => format_time_of_day(session.start_time.flatten(), ctx.offset),
            Field::EndTime => format_time_of_day(session.end_time.flatten(), ctx.offset),
            _ => format_text(&session.comment.flatten()),
        })
    }

    fn set_field(
        &self,
        records: &mut [TopLevelRecord],
        key: &FieldKey,
        raw: &str,
        ctx: &EditContext,
    ) -> Result<()> {
        ensure_field(self.kind, self.fields(), key)?;
        ensure_leaf_key(self.kind, key)?;
        let Some((date, entry)) = find_entry_mut(records, &key.entry_id) else {
            return Err(not_found(self.kind, key));
        };
        let fields = self
            .fields_mut(entry)
            .ok_or_else(|| not_found(self.kind, key))?;

        match key.field {
            Field::StartTime | Field::EndTime => {
                let time = parse_time_of_day(key.field, raw)?;
                let target = if key.field == Field::StartTime {
                    fields.start_time
                } else {
                    fields.end_time
                };
                let updated = apply_time_of_day(*target, date, time, ctx.offset).ok_or_else(|| {
                    TimecardError::InvalidTime {
                        field: key.field,
                        input: raw.to_string(),
                    }
                })?;
                *target = Some(updated);
            }
            Field::EquipmentId => {
                if let Some(equipment_id) = fields.equipment_id {
                    *equipment_id = parse_text(raw);
                }
            }
            _ => *fields.comment = parse_text(raw),
        }
        Ok(())
    }

    fn is_valid(&self, patch: &PatchRecord) -> bool {
        matches!(
            patch,
            PatchRecord::Session(p) if !ends_before_start(&p.start_time.flatten(), &p.end_time.flatten())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{EquipmentUsageEntry, MaintenanceEntry};
    use chrono::{FixedOffset, NaiveDate};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn records() -> Vec<TopLevelRecord> {
        vec![TopLevelRecord {
            id: "day-1".to_string(),
            employee_id: "emp-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
            entries: vec![
                LogEntry::EquipmentUsage(EquipmentUsageEntry {
                    id: "eq-1".to_string(),
                    equipment_id: Some("loader-5".to_string()),
                    start_time: Some(utc("2025-04-07T14:00:00Z")),
                    end_time: Some(utc("2025-04-07T18:00:00Z")),
                    comment: None,
                }),
                LogEntry::MaintenanceSession(MaintenanceEntry {
                    id: "mt-1".to_string(),
                    maintenance_id: Some("proj-8".to_string()),
                    start_time: Some(utc("2025-04-07T15:00:00Z")),
                    end_time: None,
                    comment: Some("Hydraulic leak".to_string()),
                }),
            ],
        }]
    }

    #[test]
    fn test_kinds_partition_entries() {
        let working = records();
        let usage = SessionAdapter::EQUIPMENT_USAGE.flatten(&working);
        let maintenance = SessionAdapter::MAINTENANCE.flatten(&working);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].id(), "eq-1");
        assert_eq!(maintenance.len(), 1);
        assert_eq!(maintenance[0].id(), "mt-1");
    }

    #[test]
    fn test_time_edit_in_local_offset() {
        let mut working = records();
        let adapter = SessionAdapter::MAINTENANCE;
        let ctx = EditContext {
            offset: FixedOffset::west_opt(6 * 3600).unwrap(),
        };
        let key = FieldKey::entry("mt-1", Field::EndTime);
        adapter.set_field(&mut working, &key, "16:30", &ctx).unwrap();
        // No original end time: lands on the record date.
        assert_eq!(adapter.read_field(&working, &key, &ctx).unwrap(), "16:30");
        let LogEntry::MaintenanceSession(e) = &working[0].entries[1] else { panic!() };
        assert_eq!(e.end_time, Some(utc("2025-04-07T22:30:00Z")));
    }

    #[test]
    fn test_maintenance_does_not_own_equipment() {
        let mut working = records();
        let adapter = SessionAdapter::MAINTENANCE;
        let key = FieldKey::entry("mt-1", Field::EquipmentId);
        assert!(adapter
            .set_field(&mut working, &key, "x", &EditContext::default())
            .is_err());
    }

    #[test]
    fn test_new_rejects_non_session_kind() {
        assert!(matches!(
            SessionAdapter::new(LogKind::Highlight),
            Err(TimecardError::AdapterMissing(LogKind::Highlight))
        ));
        assert_eq!(
            SessionAdapter::new(LogKind::Maintenance).unwrap().kind(),
            LogKind::Maintenance
        );
    }

    #[test]
    fn test_inverted_span_invalid() {
        let mut working = records();
        let adapter = SessionAdapter::EQUIPMENT_USAGE;
        let key = FieldKey::entry("eq-1", Field::EndTime);
        adapter
            .set_field(&mut working, &key, "13:00", &EditContext::default())
            .unwrap();
        let patches = adapter.flatten(&working);
        assert!(!adapter.is_valid(&patches[0]));
    }
}
