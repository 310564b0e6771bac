//! Clock-in step routing.
//!
//! Determines which wizard steps a user walks through for each role.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimecardError};
use crate::logging::structured::LogContext;
use crate::{log_debug, log_warn};

/// Work role a user clocks in under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    General,
    Mechanic,
    Truck,
    Tasco,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::General => "general",
            Role::Mechanic => "mechanic",
            Role::Truck => "truck",
            Role::Tasco => "tasco",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role permissions carried by the acting user's profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFlags {
    pub labor_view: bool,
    pub mechanic_view: bool,
    pub truck_view: bool,
    pub tasco_view: bool,
}

impl RoleFlags {
    /// Roles the flags allow, in display order.
    pub fn available(&self) -> Vec<Role> {
        [
            (self.labor_view, Role::General),
            (self.mechanic_view, Role::Mechanic),
            (self.truck_view, Role::Truck),
            (self.tasco_view, Role::Tasco),
        ]
        .into_iter()
        .filter_map(|(allowed, role)| allowed.then_some(role))
        .collect()
    }
}

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Loading,
    RoleSelection,
    JobsiteScan,
    ManualJobsiteSelect,
    CostCode,
    TruckLaborType,
    TruckEquipment,
    TascoShift,
    TascoMaterial,
    Verification,
    Submitted,
    Abandoned,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Loading => "loading",
            Step::RoleSelection => "roleSelection",
            Step::JobsiteScan => "jobsiteScan",
            Step::ManualJobsiteSelect => "manualJobsiteSelect",
            Step::CostCode => "costCode",
            Step::TruckLaborType => "truckLaborType",
            Step::TruckEquipment => "truckEquipment",
            Step::TascoShift => "tascoShift",
            Step::TascoMaterial => "tascoMaterial",
            Step::Verification => "verification",
            Step::Submitted => "submitted",
            Step::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Submitted | Step::Abandoned)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps after the jobsite is known, ending at verification.
pub fn detail_route(role: Role) -> &'static [Step] {
    match role {
        Role::General | Role::Mechanic => &[Step::CostCode, Step::Verification],
        Role::Truck => &[
            Step::CostCode,
            Step::TruckLaborType,
            Step::TruckEquipment,
            Step::Verification,
        ],
        Role::Tasco => &[
            Step::CostCode,
            Step::TascoShift,
            Step::TascoMaterial,
            Step::Verification,
        ],
    }
}

/// First step after loading, and the role chosen automatically if any.
///
/// # Decision Tree
/// 1. No roles -> error
/// 2. Exactly one role -> that role, straight to the jobsite scan
/// 3. Otherwise -> role selection
pub fn initial_step(roles: &[Role], ctx: &LogContext) -> Result<(Step, Option<Role>)> {
    match roles {
        [] => {
            log_warn!(ctx, "ROUTING_NO_ROLES");
            Err(TimecardError::NoRolesAvailable)
        }
        [only] => {
            log_debug!(ctx, "ROUTING_ROLE_AUTOSELECTED", role = only);
            Ok((Step::JobsiteScan, Some(*only)))
        }
        _ => {
            log_debug!(ctx, "ROUTING_ROLE_SELECTION", roles = roles);
            Ok((Step::RoleSelection, None))
        }
    }
}

/// The step that follows `current` for `role`, if any.
pub fn next_step(role: Role, current: Step) -> Option<Step> {
    let route = detail_route(role);
    match current {
        Step::RoleSelection => Some(Step::JobsiteScan),
        Step::JobsiteScan | Step::ManualJobsiteSelect => route.first().copied(),
        step => route
            .iter()
            .position(|s| *s == step)
            .and_then(|i| route.get(i + 1).copied()),
    }
}
