//! Log record models.
//!
//! These models represent the day-scoped containers and the nested,
//! per-kind log entries returned by the persistence API.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of log a manager can review for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogKind {
    Highlight,
    Mileage,
    EquipmentHaul,
    MaterialHaul,
    EquipmentRefuel,
    TruckingRefuel,
    StateMileage,
    TascoHaul,
    TascoRefuel,
    EquipmentUsage,
    Maintenance,
}

impl LogKind {
    pub const ALL: [LogKind; 11] = [
        LogKind::Highlight,
        LogKind::Mileage,
        LogKind::EquipmentHaul,
        LogKind::MaterialHaul,
        LogKind::EquipmentRefuel,
        LogKind::TruckingRefuel,
        LogKind::StateMileage,
        LogKind::TascoHaul,
        LogKind::TascoRefuel,
        LogKind::EquipmentUsage,
        LogKind::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Highlight => "highlight",
            LogKind::Mileage => "mileage",
            LogKind::EquipmentHaul => "equipmentHaul",
            LogKind::MaterialHaul => "materialHaul",
            LogKind::EquipmentRefuel => "equipmentRefuel",
            LogKind::TruckingRefuel => "truckingRefuel",
            LogKind::StateMileage => "stateMileage",
            LogKind::TascoHaul => "tascoHaul",
            LogKind::TascoRefuel => "tascoRefuel",
            LogKind::EquipmentUsage => "equipmentUsage",
            LogKind::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every editable scalar field across all log kinds.
///
/// Each adapter declares the subset it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    StartTime,
    EndTime,
    JobsiteId,
    CostCode,
    StartingMileage,
    EndingMileage,
    EquipmentId,
    Name,
    LocationOfMaterial,
    Quantity,
    MaterialWeight,
    LightWeight,
    GrossWeight,
    GallonsRefueled,
    MilesAtFueling,
    State,
    StateLineMileage,
    ShiftType,
    LaborType,
    MaterialType,
    LoadQuantity,
    Comment,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::StartTime => "startTime",
            Field::EndTime => "endTime",
            Field::JobsiteId => "jobsiteId",
            Field::CostCode => "costCode",
            Field::StartingMileage => "startingMileage",
            Field::EndingMileage => "endingMileage",
            Field::EquipmentId => "equipmentId",
            Field::Name => "name",
            Field::LocationOfMaterial => "locationOfMaterial",
            Field::Quantity => "quantity",
            Field::MaterialWeight => "materialWeight",
            Field::LightWeight => "lightWeight",
            Field::GrossWeight => "grossWeight",
            Field::GallonsRefueled => "gallonsRefueled",
            Field::MilesAtFueling => "milesAtFueling",
            Field::State => "state",
            Field::StateLineMileage => "stateLineMileage",
            Field::ShiftType => "shiftType",
            Field::LaborType => "laborType",
            Field::MaterialType => "materialType",
            Field::LoadQuantity => "loadQuantity",
            Field::Comment => "comment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key addressing one editable field: `(entryId, subEntryId?, field)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub entry_id: String,
    pub sub_entry_id: Option<String>,
    pub field: Field,
}

impl FieldKey {
    pub fn entry(entry_id: &str, field: Field) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            sub_entry_id: None,
            field,
        }
    }

    pub fn sub_entry(entry_id: &str, sub_entry_id: &str, field: Field) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            sub_entry_id: Some(sub_entry_id.to_string()),
            field,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_entry_id {
            Some(sub) => write!(f, "{}/{}.{}", self.entry_id, sub, self.field),
            None => write!(f, "{}.{}", self.entry_id, self.field),
        }
    }
}

/// A day-scoped container owning one kind of log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelRecord {
    pub id: String,
    pub employee_id: String,
    pub date: NaiveDate,
    pub entries: Vec<LogEntry>,
}

/// One persisted record of a specific kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LogEntry {
    Highlight(HighlightEntry),
    Mileage(MileageEntry),
    EquipmentHaul(EquipmentHaulEntry),
    MaterialHaul(MaterialHaulEntry),
    Refuel(RefuelEntry),
    StateMileage(StateMileageEntry),
    TascoHaul(TascoHaulEntry),
    TascoRefuel(TascoRefuelEntry),
    EquipmentUsage(EquipmentUsageEntry),
    MaintenanceSession(MaintenanceEntry),
}

impl LogEntry {
    pub fn id(&self) -> &str {
        match self {
            LogEntry::Highlight(e) => &e.id,
            LogEntry::Mileage(e) => &e.id,
            LogEntry::EquipmentHaul(e) => &e.id,
            LogEntry::MaterialHaul(e) => &e.id,
            LogEntry::Refuel(e) => &e.id,
            LogEntry::StateMileage(e) => &e.id,
            LogEntry::TascoHaul(e) => &e.id,
            LogEntry::TascoRefuel(e) => &e.id,
            LogEntry::EquipmentUsage(e) => &e.id,
            LogEntry::MaintenanceSession(e) => &e.id,
        }
    }

    /// Ids of the entry's sub entries, in order. Empty for leaf kinds.
    pub fn sub_entry_ids(&self) -> Vec<&str> {
        match self {
            LogEntry::EquipmentHaul(e) => e.equipment_hauled.iter().map(|s| s.id.as_str()).collect(),
            LogEntry::MaterialHaul(e) => e.materials.iter().map(|s| s.id.as_str()).collect(),
            LogEntry::Refuel(e) => e.refuels.iter().map(|s| s.id.as_str()).collect(),
            LogEntry::StateMileage(e) => e.state_mileages.iter().map(|s| s.id.as_str()).collect(),
            LogEntry::TascoRefuel(e) => e.refuels.iter().map(|s| s.id.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Timesheet highlight: the clocked span of one timesheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightEntry {
    pub id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub jobsite_id: Option<String>,
    pub cost_code: Option<String>,
}

/// Odometer readings of one trucking log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageEntry {
    pub id: String,
    pub equipment_id: Option<String>,
    pub starting_mileage: Option<f64>,
    pub ending_mileage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentHaulEntry {
    pub id: String,
    pub equipment_hauled: Vec<HauledItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HauledItem {
    pub id: String,
    pub equipment_id: Option<String>,
    pub jobsite_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialHaulEntry {
    pub id: String,
    pub materials: Vec<MaterialLoad>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLoad {
    pub id: String,
    pub name: Option<String>,
    pub location_of_material: Option<String>,
    pub quantity: Option<f64>,
    pub material_weight: Option<f64>,
    pub light_weight: Option<f64>,
    pub gross_weight: Option<f64>,
}

/// Which log a non-tasco refuel hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefuelSource {
    Equipment,
    Trucking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefuelEntry {
    pub id: String,
    pub source: RefuelSource,
    pub equipment_id: Option<String>,
    pub refuels: Vec<RefuelRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefuelRecord {
    pub id: String,
    pub gallons_refueled: Option<f64>,
    pub miles_at_fueling: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMileageEntry {
    pub id: String,
    pub state_mileages: Vec<StateMileage>,
}

/// A state-line crossing recorded on a trucking log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMileage {
    pub id: String,
    pub state: Option<String>,
    pub state_line_mileage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TascoHaulEntry {
    pub id: String,
    pub shift_type: Option<String>,
    pub equipment_id: Option<String>,
    pub labor_type: Option<String>,
    pub material_type: Option<String>,
    pub load_quantity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TascoRefuelEntry {
    pub id: String,
    pub equipment_id: Option<String>,
    pub refuels: Vec<RefuelRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentUsageEntry {
    pub id: String,
    pub equipment_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

/// A mechanic's work session on one maintenance project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceEntry {
    pub id: String,
    pub maintenance_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}
