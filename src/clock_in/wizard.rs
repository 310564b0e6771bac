//! Clock-in wizard.
//!
//! A stepped state machine: role, jobsite (QR scan or manual pick), role
//! details, verification, submit. Device permissions gate the scan and the
//! final submit; a scanned code that matches no jobsite leaves the wizard
//! where it was with a transient error.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use futures::StreamExt;

use crate::config::EngineConfig;
use crate::error::{Result, TimecardError};
use crate::logging::structured::LogContext;
use crate::routing::decision::{initial_step, next_step, Role, RoleFlags, Step};
use crate::validation::catalog::{Catalog, EquipmentKind, Jobsite};
use crate::{log_debug, log_error, log_info, log_warn};

use super::payload::{
    ClockEventPayload, ClockInType, PreviousTimesheet, RoleDetails, TascoDetails, TascoShift,
    TruckDetails, TruckLaborType,
};
use super::services::{ClockInServices, Coordinates, Notification};

/// Who is clocking in and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockInRequest {
    pub user_id: String,
    pub clock_in_type: ClockInType,
    pub roles: Vec<Role>,
    /// Cached id of the user's open timesheet, if the caller has one.
    pub open_timesheet_id: Option<String>,
}

impl ClockInRequest {
    /// Request offering every role the user's profile flags allow.
    pub fn from_flags(user_id: &str, clock_in_type: ClockInType, flags: RoleFlags) -> Self {
        Self {
            user_id: user_id.to_string(),
            clock_in_type,
            roles: flags.available(),
            open_timesheet_id: None,
        }
    }

    pub fn with_open_timesheet(mut self, timesheet_id: &str) -> Self {
        self.open_timesheet_id = Some(timesheet_id.to_string());
        self
    }
}

/// A scanned code that matched no jobsite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub code: String,
    pub raised_at: DateTime<Utc>,
    pub display_for: Duration,
}

impl ScanError {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.raised_at + self.display_for
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Matched(Jobsite),
    Mismatch(ScanError),
    /// The decoder stopped without producing a code.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Dashboard,
    Caller,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockInReceipt {
    pub role: Role,
    pub clock_in_type: ClockInType,
    pub created_time_card: Option<String>,
    pub navigate_to: Destination,
}

#[derive(Debug, Clone, Default)]
struct TruckDraft {
    labor_type: Option<TruckLaborType>,
    truck_id: Option<String>,
    starting_mileage: Option<f64>,
    trailer_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct TascoDraft {
    shift: Option<TascoShift>,
    labor_type: Option<String>,
    material_type: Option<String>,
    equipment_id: Option<String>,
}

pub struct ClockInWizard {
    services: ClockInServices,
    catalog: Arc<Catalog>,
    scan_error_display: Duration,
    offset: FixedOffset,
    ctx: LogContext,
    request: ClockInRequest,
    step: Step,
    history: Vec<Step>,
    role: Option<Role>,
    jobsite: Option<Jobsite>,
    cost_code: Option<String>,
    truck: TruckDraft,
    tasco: TascoDraft,
    camera_granted: Option<bool>,
    location_granted: Option<bool>,
    scan_error: Option<ScanError>,
}

impl ClockInWizard {
    /// # Errors
    ///
    /// `Config` when the configured UTC offset is out of range.
    pub fn new(
        services: ClockInServices,
        catalog: Arc<Catalog>,
        config: &EngineConfig,
        request: ClockInRequest,
    ) -> Result<Self> {
        let offset = config.offset()?;
        let ctx = LogContext::generate("clockin").with_employee(&request.user_id);
        log_info!(
            ctx,
            "CLOCK_IN_STARTED",
            clock_in_type = request.clock_in_type.as_str(),
            roles = request.roles.len()
        );
        Ok(Self {
            services,
            catalog,
            scan_error_display: config.scan_error_display(),
            offset,
            ctx,
            request,
            step: Step::Loading,
            history: Vec::new(),
            role: None,
            jobsite: None,
            cost_code: None,
            truck: TruckDraft::default(),
            tasco: TascoDraft::default(),
            camera_granted: None,
            location_granted: None,
            scan_error: None,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn jobsite(&self) -> Option<&Jobsite> {
        self.jobsite.as_ref()
    }

    pub fn cost_code(&self) -> Option<&str> {
        self.cost_code.as_deref()
    }

    pub fn camera_granted(&self) -> Option<bool> {
        self.camera_granted
    }

    pub fn location_granted(&self) -> Option<bool> {
        self.location_granted
    }

    /// The scan error, while it is still visible.
    pub fn scan_error(&self, now: DateTime<Utc>) -> Option<&ScanError> {
        self.scan_error.as_ref().filter(|e| e.is_visible(now))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> TimecardError {
        log_warn!(self.ctx, "CLOCK_IN_INVALID_TRANSITION", step = self.step.as_str(), action = action);
        TimecardError::InvalidTransition {
            step: self.step.to_string(),
            action,
        }
    }

    fn go_to(&mut self, step: Step) {
        log_debug!(self.ctx, "CLOCK_IN_STEP", from = self.step.as_str(), to = step.as_str());
        if !matches!(self.step, Step::Loading) {
            self.history.push(self.step);
        }
        self.step = step;
    }

    fn active_role(&self) -> Result<Role> {
        self.role.ok_or(TimecardError::IncompleteDetails("role"))
    }

    fn advance(&mut self, action: &'static str) -> Result<Step> {
        let role = self.active_role()?;
        let next = next_step(role, self.step).ok_or_else(|| self.invalid(action))?;
        self.go_to(next);
        Ok(next)
    }

    /// Leave the loading step. A single available role is chosen automatically.
    pub async fn start(&mut self) -> Result<Step> {
        self.expect_step(Step::Loading, "start")?;
        let (step, role) = initial_step(&self.request.roles, &self.ctx)?;
        self.role = role;
        self.go_to(step);
        if step == Step::JobsiteScan {
            self.enter_jobsite_step().await;
        }
        Ok(self.step)
    }

    pub async fn select_role(&mut self, role: Role) -> Result<Step> {
        self.expect_step(Step::RoleSelection, "select role")?;
        if !self.request.roles.contains(&role) {
            return Err(TimecardError::RoleUnavailable(role.to_string()));
        }
        log_info!(self.ctx, "CLOCK_IN_ROLE_SELECTED", role = role.as_str());
        self.role = Some(role);
        self.go_to(Step::JobsiteScan);
        self.enter_jobsite_step().await;
        Ok(self.step)
    }

    /// Ask for camera and location if not yet granted. Without a camera the
    /// user falls through to manual jobsite selection.
    async fn enter_jobsite_step(&mut self) {
        if self.camera_granted != Some(true) {
            let granted = self.services.permissions.request_camera().await;
            self.camera_granted = Some(granted);
        }
        if self.location_granted != Some(true) {
            let granted = self.services.permissions.request_location().await.success;
            self.location_granted = Some(granted);
            if !granted {
                log_warn!(self.ctx, "LOCATION_PERMISSION_DENIED");
            }
        }
        if self.camera_granted == Some(false) {
            log_warn!(self.ctx, "CAMERA_PERMISSION_DENIED", fallback = "manual");
            self.step = Step::ManualJobsiteSelect;
        }
    }

    /// Pull decoded codes until one resolves or mismatches.
    ///
    /// Blank codes are skipped. A mismatch keeps the wizard on the scan step.
    pub async fn scan(&mut self) -> Result<ScanOutcome> {
        self.scan_at(Utc::now()).await
    }

    /// Like [`ClockInWizard::scan`], stamping any mismatch with `now`.
    pub async fn scan_at(&mut self, now: DateTime<Utc>) -> Result<ScanOutcome> {
        self.expect_step(Step::JobsiteScan, "scan")?;
        let mut codes = self.services.qr.decode();
        while let Some(code) = codes.next().await {
            if code.trim().is_empty() {
                continue;
            }
            if let Some(jobsite) = self.catalog.resolve_jobsite_qr(&code, &self.ctx).cloned() {
                self.scan_error = None;
                self.jobsite = Some(jobsite.clone());
                self.advance("scan")?;
                return Ok(ScanOutcome::Matched(jobsite));
            }

            let error = ScanError {
                code: code.trim().to_string(),
                raised_at: now,
                display_for: self.scan_error_display,
            };
            log_warn!(self.ctx, "SCAN_MISMATCH", code = &error.code);
            self.scan_error = Some(error.clone());
            return Ok(ScanOutcome::Mismatch(error));
        }
        log_debug!(self.ctx, "SCAN_STREAM_ENDED");
        Ok(ScanOutcome::Ended)
    }

    pub fn trouble_scanning(&mut self) -> Result<()> {
        self.expect_step(Step::JobsiteScan, "switch to manual selection")?;
        log_info!(self.ctx, "SCAN_TROUBLE_REPORTED");
        self.scan_error = None;
        self.go_to(Step::ManualJobsiteSelect);
        Ok(())
    }

    pub fn select_jobsite(&mut self, jobsite_id: &str) -> Result<Step> {
        self.expect_step(Step::ManualJobsiteSelect, "select jobsite")?;
        let jobsite = self
            .catalog
            .jobsite(jobsite_id)
            .cloned()
            .ok_or_else(|| TimecardError::UnknownJobsite(jobsite_id.to_string()))?;
        log_info!(self.ctx, "JOBSITE_SELECTED", jobsite = &jobsite.id);
        self.jobsite = Some(jobsite);
        self.advance("select jobsite")
    }

    pub fn select_cost_code(&mut self, code: &str) -> Result<Step> {
        self.expect_step(Step::CostCode, "select cost code")?;
        let jobsite = self
            .jobsite
            .as_ref()
            .ok_or(TimecardError::IncompleteDetails("jobsite"))?;
        if !self.catalog.is_cost_code_valid(&jobsite.id, code) {
            return Err(TimecardError::UnknownCostCode(code.to_string()));
        }
        self.cost_code = Some(code.to_string());
        self.advance("select cost code")
    }

    pub fn set_truck_labor_type(&mut self, labor_type: TruckLaborType) -> Result<Step> {
        self.expect_step(Step::TruckLaborType, "set labor type")?;
        self.truck.labor_type = Some(labor_type);
        self.advance("set labor type")
    }

    /// Truck and starting mileage are required of truck drivers only. The
    /// trailer is always optional.
    pub fn set_truck_equipment(
        &mut self,
        truck_id: Option<&str>,
        starting_mileage: Option<f64>,
        trailer_id: Option<&str>,
    ) -> Result<Step> {
        self.expect_step(Step::TruckEquipment, "set truck equipment")?;
        if let Some(id) = truck_id {
            self.require_equipment(id, EquipmentKind::Truck)?;
        }
        if let Some(id) = trailer_id {
            self.require_equipment(id, EquipmentKind::Trailer)?;
        }
        if starting_mileage.is_some_and(|m| !m.is_finite() || m < 0.0) {
            return Err(TimecardError::IncompleteDetails("starting mileage"));
        }
        if self.truck.labor_type == Some(TruckLaborType::TruckDriver) {
            if truck_id.is_none() {
                return Err(TimecardError::IncompleteDetails("truck"));
            }
            if starting_mileage.is_none() {
                return Err(TimecardError::IncompleteDetails("starting mileage"));
            }
        }

        self.truck.truck_id = truck_id.map(str::to_string);
        self.truck.starting_mileage = starting_mileage;
        self.truck.trailer_id = trailer_id.map(str::to_string);
        self.advance("set truck equipment")
    }

    pub fn set_tasco_shift(&mut self, shift: TascoShift, labor_type: Option<&str>) -> Result<Step> {
        self.expect_step(Step::TascoShift, "set shift")?;
        self.tasco.shift = Some(shift);
        self.tasco.labor_type = labor_type.map(str::to_string);
        self.advance("set shift")
    }

    /// Equipment is required on the ABCD shift.
    pub fn set_tasco_material(&mut self, material_type: &str, equipment_id: Option<&str>) -> Result<Step> {
        self.expect_step(Step::TascoMaterial, "set material")?;
        if material_type.trim().is_empty() {
            return Err(TimecardError::IncompleteDetails("material type"));
        }
        match equipment_id {
            Some(id) => self.require_equipment(id, EquipmentKind::Equipment)?,
            None if self.tasco.shift == Some(TascoShift::Abcd) => {
                return Err(TimecardError::IncompleteDetails("equipment"));
            }
            None => {}
        }
        self.tasco.material_type = Some(material_type.trim().to_string());
        self.tasco.equipment_id = equipment_id.map(str::to_string);
        self.advance("set material")
    }

    fn require_equipment(&self, id: &str, kind: EquipmentKind) -> Result<()> {
        match self.catalog.equipment(id) {
            Some(equipment) if equipment.kind == kind => Ok(()),
            _ => Err(TimecardError::UnknownEquipment(id.to_string())),
        }
    }

    /// Step back along the route.
    ///
    /// Returns `None` from the first step: the wizard should return to its caller.
    pub fn back(&mut self) -> Result<Option<Step>> {
        if self.step.is_terminal() {
            return Err(self.invalid("go back"));
        }
        match self.history.pop() {
            Some(previous) => {
                log_debug!(self.ctx, "CLOCK_IN_BACK", from = self.step.as_str(), to = previous.as_str());
                self.step = previous;
                self.scan_error = None;
                Ok(Some(previous))
            }
            None => Ok(None),
        }
    }

    /// Abandon without submitting.
    pub fn return_to_caller(&mut self) -> Result<Destination> {
        if self.step.is_terminal() {
            return Err(self.invalid("return to caller"));
        }
        log_info!(self.ctx, "CLOCK_IN_ABANDONED", step = self.step.as_str());
        self.step = Step::Abandoned;
        Ok(Destination::Caller)
    }

    // =========================================================================
    // Verification and submit
    // =========================================================================

    fn role_details(&self, role: Role) -> Result<RoleDetails> {
        Ok(match role {
            Role::General => RoleDetails::General,
            Role::Mechanic => RoleDetails::Mechanic,
            Role::Truck => RoleDetails::Truck(TruckDetails {
                labor_type: self
                    .truck
                    .labor_type
                    .ok_or(TimecardError::IncompleteDetails("labor type"))?,
                truck_id: self.truck.truck_id.clone(),
                starting_mileage: self.truck.starting_mileage,
                trailer_id: self.truck.trailer_id.clone(),
            }),
            Role::Tasco => RoleDetails::Tasco(TascoDetails {
                shift: self
                    .tasco
                    .shift
                    .ok_or(TimecardError::IncompleteDetails("shift"))?,
                labor_type: self.tasco.labor_type.clone(),
                material_type: self
                    .tasco
                    .material_type
                    .clone()
                    .ok_or(TimecardError::IncompleteDetails("material type"))?,
                equipment_id: self.tasco.equipment_id.clone(),
            }),
        })
    }

    /// The read-only summary shown at verification.
    pub fn draft(&self, now: DateTime<Utc>) -> Result<ClockEventPayload> {
        let role = self.active_role()?;
        let jobsite = self
            .jobsite
            .as_ref()
            .ok_or(TimecardError::IncompleteDetails("jobsite"))?;
        let cost_code = self
            .cost_code
            .clone()
            .ok_or(TimecardError::IncompleteDetails("cost code"))?;
        Ok(ClockEventPayload {
            user_id: self.request.user_id.clone(),
            clock_in_type: self.request.clock_in_type,
            date: now.with_timezone(&self.offset).date_naive(),
            start_time: now,
            jobsite_id: jobsite.id.clone(),
            cost_code,
            details: self.role_details(role)?,
            coordinates: Coordinates::default(),
            previous_timesheet: None,
        })
    }

    /// Submit from the verification step.
    ///
    /// # Errors
    ///
    /// * `LocationRequired` when location permission is denied; nothing is sent.
    /// * `NoOpenTimesheet` when switching jobs and no open timesheet exists
    ///   after one refetch; nothing is sent.
    /// * `Collaborator` / `SubmitRejected` when the timesheet service fails.
    ///
    /// On any error the wizard stays on verification.
    pub async fn submit(&mut self) -> Result<ClockInReceipt> {
        self.submit_at(Utc::now()).await
    }

    pub async fn submit_at(&mut self, now: DateTime<Utc>) -> Result<ClockInReceipt> {
        self.expect_step(Step::Verification, "submit")?;
        let mut payload = self.draft(now)?;

        if self.location_granted != Some(true) {
            let granted = self.services.permissions.request_location().await.success;
            self.location_granted = Some(granted);
            if !granted {
                log_warn!(self.ctx, "SUBMIT_BLOCKED", reason = "location permission denied");
                return Err(TimecardError::LocationRequired);
            }
        }

        let coordinates = match self.services.permissions.last_coordinates().await {
            Some(coordinates) => coordinates,
            None => {
                log_warn!(self.ctx, "COORDINATES_UNAVAILABLE", fallback = "0,0");
                Coordinates::default()
            }
        };
        payload.coordinates = coordinates;

        if self.request.clock_in_type == ClockInType::SwitchJobs {
            let previous_id = self.open_timesheet_id().await?;
            payload.previous_timesheet = Some(PreviousTimesheet {
                id: previous_id,
                end_time: now,
                end_coordinates: coordinates,
            });
        }

        let response = match self.services.timesheets.submit_clock_event(&payload).await {
            Ok(response) => response,
            Err(e) => {
                log_error!(self.ctx, "SUBMIT_FAILED", error = e.to_string());
                return Err(TimecardError::collaborator("submitClockEvent", e));
            }
        };
        if !response.success {
            log_error!(self.ctx, "SUBMIT_REJECTED");
            return Err(TimecardError::SubmitRejected);
        }

        if let Some(previous) = &payload.previous_timesheet {
            self.services
                .notifier
                .notify(Notification::TimesheetApprovalRequested {
                    user_id: self.request.user_id.clone(),
                    closed_timesheet_id: previous.id.clone(),
                    created_time_card: response.created_time_card.clone(),
                });
        }

        let role = payload.role();
        self.services.roles.set_current_role(role);
        self.go_to(Step::Submitted);
        log_info!(
            self.ctx,
            "CLOCK_IN_SUBMITTED",
            role = role.as_str(),
            clock_in_type = payload.clock_in_type.as_str(),
            time_card = &response.created_time_card
        );
        Ok(ClockInReceipt {
            role,
            clock_in_type: payload.clock_in_type,
            created_time_card: response.created_time_card,
            navigate_to: Destination::Dashboard,
        })
    }

    /// Cached open timesheet id, else exactly one refetch.
    async fn open_timesheet_id(&mut self) -> Result<String> {
        if let Some(id) = &self.request.open_timesheet_id {
            return Ok(id.clone());
        }

        log_info!(self.ctx, "OPEN_TIMESHEET_REFETCH");
        let fetched = self
            .services
            .timesheets
            .fetch_open_timesheet(&self.request.user_id)
            .await
            .map_err(|e| {
                log_error!(self.ctx, "OPEN_TIMESHEET_FETCH_FAILED", error = e.to_string());
                TimecardError::collaborator("fetchOpenTimesheet", e)
            })?;

        match fetched {
            Some(open) => {
                self.request.open_timesheet_id = Some(open.id.clone());
                Ok(open.id)
            }
            None => {
                log_error!(self.ctx, "SUBMIT_ABORTED", reason = "no open timesheet");
                Err(TimecardError::NoOpenTimesheet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_visibility_window() {
        let raised = DateTime::parse_from_rfc3339("2025-04-07T13:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let error = ScanError {
            code: "BAD".to_string(),
            raised_at: raised,
            display_for: Duration::seconds(4),
        };
        assert!(error.is_visible(raised + Duration::seconds(3)));
        assert!(!error.is_visible(raised + Duration::seconds(4)));
    }
}
