//! Clock event payload.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::routing::decision::Role;

use super::services::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClockInType {
    NewShift,
    SwitchJobs,
    ReturnFromBreak,
}

impl ClockInType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockInType::NewShift => "newShift",
            ClockInType::SwitchJobs => "switchJobs",
            ClockInType::ReturnFromBreak => "returnFromBreak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TruckLaborType {
    TruckDriver,
    Operator,
    ManualLabor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TascoShift {
    #[serde(rename = "ABCD Shift")]
    Abcd,
    #[serde(rename = "E Shift")]
    E,
    #[serde(rename = "F Shift")]
    F,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruckDetails {
    pub labor_type: TruckLaborType,
    pub truck_id: Option<String>,
    pub starting_mileage: Option<f64>,
    pub trailer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TascoDetails {
    pub shift: TascoShift,
    pub labor_type: Option<String>,
    pub material_type: String,
    pub equipment_id: Option<String>,
}

/// Role-specific part of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum RoleDetails {
    General,
    Mechanic,
    Truck(TruckDetails),
    Tasco(TascoDetails),
}

impl RoleDetails {
    pub fn role(&self) -> Role {
        match self {
            RoleDetails::General => Role::General,
            RoleDetails::Mechanic => Role::Mechanic,
            RoleDetails::Truck(_) => Role::Truck,
            RoleDetails::Tasco(_) => Role::Tasco,
        }
    }
}

/// The timesheet closed by a job switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousTimesheet {
    pub id: String,
    pub end_time: DateTime<Utc>,
    pub end_coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockEventPayload {
    pub user_id: String,
    pub clock_in_type: ClockInType,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub jobsite_id: String,
    pub cost_code: String,
    pub details: RoleDetails,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_timesheet: Option<PreviousTimesheet>,
}

impl ClockEventPayload {
    pub fn role(&self) -> Role {
        self.details.role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let start = DateTime::parse_from_rfc3339("2025-04-07T13:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let payload = ClockEventPayload {
            user_id: "u-1".to_string(),
            clock_in_type: ClockInType::SwitchJobs,
            date: start.date_naive(),
            start_time: start,
            jobsite_id: "js-1".to_string(),
            cost_code: "100".to_string(),
            details: RoleDetails::Tasco(TascoDetails {
                shift: TascoShift::Abcd,
                labor_type: None,
                material_type: "Rock".to_string(),
                equipment_id: Some("ex-1".to_string()),
            }),
            coordinates: Coordinates::default(),
            previous_timesheet: None,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["clockInType"], json!("switchJobs"));
        assert_eq!(value["details"]["role"], json!("tasco"));
        assert_eq!(value["details"]["shift"], json!("ABCD Shift"));
        assert!(value.get("previousTimesheet").is_none());
        assert_eq!(payload.role(), Role::Tasco);
    }
}
