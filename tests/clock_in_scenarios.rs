mod common;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use common::{catalog, FakePermissions, Harness};
use timecard_core::clock_in::{
    ClockInRequest, ClockInType, ClockInWizard, Coordinates, Destination, Notification,
    OpenTimesheet, RoleDetails, ScanOutcome, TascoShift, TruckLaborType,
};
use timecard_core::routing::{Role, RoleFlags, Step};
use timecard_core::{EngineConfig, TimecardError};

fn noon() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-04-07T18:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn wizard(harness: &Harness, roles: &[Role], clock_in_type: ClockInType) -> ClockInWizard {
    ClockInWizard::new(
        harness.services.clone(),
        catalog(),
        &EngineConfig::default(),
        ClockInRequest {
            user_id: "u-1".to_string(),
            clock_in_type,
            roles: roles.to_vec(),
            open_timesheet_id: None,
        },
    )
    .unwrap()
}

/// Single general role, scanned into the north pit, cost code 100.
async fn at_verification(harness: &Harness, clock_in_type: ClockInType) -> ClockInWizard {
    let mut wizard = wizard(harness, &[Role::General], clock_in_type);
    assert_eq!(wizard.start().await.unwrap(), Step::JobsiteScan);
    assert!(matches!(wizard.scan().await.unwrap(), ScanOutcome::Matched(_)));
    assert_eq!(wizard.select_cost_code("100").unwrap(), Step::Verification);
    wizard
}

#[tokio::test]
async fn test_switch_jobs_without_open_timesheet_aborts() {
    let harness = Harness::new(FakePermissions::granting(), &["QR-NORTH"]);
    let mut wizard = at_verification(&harness, ClockInType::SwitchJobs).await;

    let err = wizard.submit_at(noon()).await.unwrap_err();
    assert!(matches!(err, TimecardError::NoOpenTimesheet));
    assert_eq!(*harness.timesheets.open_fetches.lock(), 1);
    assert!(harness.timesheets.submitted.lock().is_empty());
    assert_eq!(wizard.step(), Step::Verification);
    assert!(harness.notifier.events.lock().is_empty());
}

#[tokio::test]
async fn test_switch_jobs_refetches_then_notifies() {
    let harness = Harness::new(FakePermissions::granting(), &["QR-NORTH"]);
    *harness.timesheets.open.lock() = Some(OpenTimesheet {
        id: "ts-old".to_string(),
    });
    let mut wizard = at_verification(&harness, ClockInType::SwitchJobs).await;

    let receipt = wizard.submit_at(noon()).await.unwrap();
    assert_eq!(receipt.navigate_to, Destination::Dashboard);
    assert_eq!(receipt.created_time_card.as_deref(), Some("tc-new"));
    assert_eq!(*harness.timesheets.open_fetches.lock(), 1);

    let submitted = harness.timesheets.submitted.lock();
    let previous = submitted[0].previous_timesheet.as_ref().unwrap();
    assert_eq!(previous.id, "ts-old");
    assert_eq!(previous.end_time, noon());

    assert_eq!(
        *harness.notifier.events.lock(),
        vec![Notification::TimesheetApprovalRequested {
            user_id: "u-1".to_string(),
            closed_timesheet_id: "ts-old".to_string(),
            created_time_card: Some("tc-new".to_string()),
        }]
    );
    assert_eq!(*harness.roles.current.lock(), Some(Role::General));
    assert_eq!(wizard.step(), Step::Submitted);
}

#[tokio::test]
async fn test_cached_open_timesheet_skips_refetch() {
    let harness = Harness::new(FakePermissions::granting(), &["QR-NORTH"]);
    let mut wizard = ClockInWizard::new(
        harness.services.clone(),
        catalog(),
        &EngineConfig::default(),
        ClockInRequest {
            user_id: "u-1".to_string(),
            clock_in_type: ClockInType::SwitchJobs,
            roles: vec![Role::Mechanic],
            open_timesheet_id: Some("ts-cached".to_string()),
        },
    )
    .unwrap();
    wizard.start().await.unwrap();
    wizard.scan().await.unwrap();
    wizard.select_cost_code("200").unwrap();
    wizard.submit_at(noon()).await.unwrap();

    assert_eq!(*harness.timesheets.open_fetches.lock(), 0);
    let submitted = harness.timesheets.submitted.lock();
    assert_eq!(submitted[0].previous_timesheet.as_ref().unwrap().id, "ts-cached");
    assert_eq!(submitted[0].details, RoleDetails::Mechanic);
}

#[tokio::test]
async fn test_denied_location_blocks_submit_before_network() {
    let permissions = FakePermissions {
        location: false,
        ..FakePermissions::granting()
    };
    let harness = Harness::new(permissions, &["QR-NORTH"]);
    let mut wizard = at_verification(&harness, ClockInType::SwitchJobs).await;
    assert_eq!(wizard.location_granted(), Some(false));

    let err = wizard.submit_at(noon()).await.unwrap_err();
    assert!(matches!(err, TimecardError::LocationRequired));
    assert_eq!(*harness.timesheets.open_fetches.lock(), 0);
    assert!(harness.timesheets.submitted.lock().is_empty());
    assert_eq!(*harness.permissions.location_requests.lock(), 2);
    assert_eq!(wizard.step(), Step::Verification);
}

#[tokio::test]
async fn test_scan_mismatch_stays_with_transient_error() {
    let harness = Harness::new(FakePermissions::granting(), &["", "  ", "QR-NOWHERE"]);
    let mut wizard = wizard(&harness, &[Role::General], ClockInType::NewShift);
    wizard.start().await.unwrap();

    let outcome = wizard.scan_at(noon()).await.unwrap();
    let ScanOutcome::Mismatch(error) = outcome else {
        panic!("expected a mismatch, got {outcome:?}");
    };
    assert_eq!(error.code, "QR-NOWHERE");
    assert_eq!(wizard.step(), Step::JobsiteScan);
    assert!(wizard.jobsite().is_none());
    assert!(wizard.scan_error(noon() + Duration::seconds(1)).is_some());
    assert!(wizard.scan_error(noon() + Duration::seconds(5)).is_none());

    wizard.trouble_scanning().unwrap();
    assert_eq!(wizard.step(), Step::ManualJobsiteSelect);
    assert!(wizard.scan_error(noon()).is_none());
}

#[tokio::test]
async fn test_denied_camera_falls_back_to_manual() {
    let permissions = FakePermissions {
        camera: false,
        ..FakePermissions::granting()
    };
    let harness = Harness::new(permissions, &[]);
    let mut wizard = wizard(&harness, &[Role::General], ClockInType::NewShift);

    assert_eq!(wizard.start().await.unwrap(), Step::ManualJobsiteSelect);
    assert!(matches!(
        wizard.scan().await,
        Err(TimecardError::InvalidTransition { .. })
    ));
    assert!(matches!(
        wizard.select_jobsite("js-9"),
        Err(TimecardError::UnknownJobsite(_))
    ));
    assert_eq!(wizard.select_jobsite("js-2").unwrap(), Step::CostCode);
    assert!(matches!(
        wizard.select_cost_code("100"),
        Err(TimecardError::UnknownCostCode(_))
    ));
    assert_eq!(wizard.select_cost_code("200").unwrap(), Step::Verification);
}

#[tokio::test]
async fn test_truck_driver_full_route() {
    let harness = Harness::new(FakePermissions::granting(), &[]);
    let mut wizard = wizard(&harness, &[Role::General, Role::Truck], ClockInType::NewShift);

    assert_eq!(wizard.start().await.unwrap(), Step::RoleSelection);
    assert!(matches!(
        wizard.select_role(Role::Tasco).await,
        Err(TimecardError::RoleUnavailable(_))
    ));
    assert_eq!(wizard.select_role(Role::Truck).await.unwrap(), Step::JobsiteScan);
    wizard.trouble_scanning().unwrap();
    wizard.select_jobsite("js-1").unwrap();
    assert_eq!(wizard.select_cost_code("100").unwrap(), Step::TruckLaborType);
    assert_eq!(
        wizard.set_truck_labor_type(TruckLaborType::TruckDriver).unwrap(),
        Step::TruckEquipment
    );
    assert!(matches!(
        wizard.set_truck_equipment(None, Some(120_500.0), None),
        Err(TimecardError::IncompleteDetails("truck"))
    ));
    assert!(matches!(
        wizard.set_truck_equipment(Some("tl-1"), Some(120_500.0), None),
        Err(TimecardError::UnknownEquipment(_))
    ));
    assert_eq!(
        wizard
            .set_truck_equipment(Some("tr-1"), Some(120_500.0), Some("tl-1"))
            .unwrap(),
        Step::Verification
    );

    let receipt = wizard.submit_at(noon()).await.unwrap();
    assert_eq!(receipt.role, Role::Truck);
    assert_eq!(*harness.roles.current.lock(), Some(Role::Truck));
    assert!(harness.notifier.events.lock().is_empty());

    let submitted = harness.timesheets.submitted.lock();
    let RoleDetails::Truck(details) = &submitted[0].details else {
        panic!("expected truck details");
    };
    assert_eq!(details.truck_id.as_deref(), Some("tr-1"));
    assert_eq!(details.trailer_id.as_deref(), Some("tl-1"));
    assert!(submitted[0].previous_timesheet.is_none());
    assert_eq!(submitted[0].date, noon().date_naive());
}

#[tokio::test]
async fn test_tasco_abcd_shift_requires_equipment() {
    let harness = Harness::new(FakePermissions::granting(), &["QR-SOUTH"]);
    let mut wizard = wizard(&harness, &[Role::Tasco], ClockInType::ReturnFromBreak);
    wizard.start().await.unwrap();
    wizard.scan().await.unwrap();
    assert_eq!(wizard.select_cost_code("200").unwrap(), Step::TascoShift);
    assert_eq!(
        wizard.set_tasco_shift(TascoShift::Abcd, Some("Operator")).unwrap(),
        Step::TascoMaterial
    );
    assert!(matches!(
        wizard.set_tasco_material("Rock", None),
        Err(TimecardError::IncompleteDetails("equipment"))
    ));
    assert!(matches!(
        wizard.set_tasco_material(" ", Some("ex-1")),
        Err(TimecardError::IncompleteDetails("material type"))
    ));
    assert_eq!(
        wizard.set_tasco_material("Rock", Some("ex-1")).unwrap(),
        Step::Verification
    );

    let draft = wizard.draft(noon()).unwrap();
    assert_eq!(draft.clock_in_type, ClockInType::ReturnFromBreak);
    assert_eq!(draft.jobsite_id, "js-2");
}

#[tokio::test]
async fn test_back_walks_history_then_returns_to_caller() {
    let harness = Harness::new(FakePermissions::granting(), &[]);
    let mut wizard = wizard(&harness, &[Role::General, Role::Mechanic], ClockInType::NewShift);
    wizard.start().await.unwrap();
    wizard.select_role(Role::Mechanic).await.unwrap();
    wizard.trouble_scanning().unwrap();
    wizard.select_jobsite("js-1").unwrap();
    assert_eq!(wizard.step(), Step::CostCode);

    assert_eq!(wizard.back().unwrap(), Some(Step::ManualJobsiteSelect));
    assert_eq!(wizard.back().unwrap(), Some(Step::JobsiteScan));
    assert_eq!(wizard.back().unwrap(), Some(Step::RoleSelection));
    assert_eq!(wizard.back().unwrap(), None);

    assert_eq!(wizard.return_to_caller().unwrap(), Destination::Caller);
    assert_eq!(wizard.step(), Step::Abandoned);
    assert!(wizard.back().is_err());
}

#[tokio::test]
async fn test_failed_submit_stays_on_verification() {
    let permissions = FakePermissions {
        coordinates: None,
        ..FakePermissions::granting()
    };
    let harness = Harness::new(permissions, &["QR-NORTH"]);
    *harness.timesheets.fail_submit.lock() = true;
    let mut wizard = at_verification(&harness, ClockInType::NewShift).await;

    let err = wizard.submit_at(noon()).await.unwrap_err();
    assert!(matches!(
        err,
        TimecardError::Collaborator {
            operation: "submitClockEvent",
            ..
        }
    ));
    assert_eq!(wizard.step(), Step::Verification);
    assert_eq!(*harness.roles.current.lock(), None);
    // Missing fix is sent as zero coordinates.
    assert_eq!(
        harness.timesheets.submitted.lock()[0].coordinates,
        Coordinates::default()
    );
}

#[tokio::test]
async fn test_no_roles_cannot_start() {
    let harness = Harness::new(FakePermissions::granting(), &[]);
    let mut wizard = wizard(&harness, &[], ClockInType::NewShift);
    assert!(matches!(
        wizard.start().await,
        Err(TimecardError::NoRolesAvailable)
    ));
    assert_eq!(wizard.step(), Step::Loading);
}

#[tokio::test]
async fn test_evening_clock_in_uses_local_date() {
    let harness = Harness::new(FakePermissions::granting(), &["QR-NORTH"]);
    let config = EngineConfig {
        utc_offset_minutes: -360,
        ..EngineConfig::default()
    };
    let mut wizard = ClockInWizard::new(
        harness.services.clone(),
        catalog(),
        &config,
        ClockInRequest {
            user_id: "u-1".to_string(),
            clock_in_type: ClockInType::NewShift,
            roles: vec![Role::General],
            open_timesheet_id: None,
        },
    )
    .unwrap();
    wizard.start().await.unwrap();
    wizard.scan().await.unwrap();
    wizard.select_cost_code("100").unwrap();

    // 20:00 local on the 7th.
    let evening = DateTime::parse_from_rfc3339("2025-04-08T02:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    wizard.submit_at(evening).await.unwrap();

    let submitted = harness.timesheets.submitted.lock();
    assert_eq!(submitted[0].date, NaiveDate::from_ymd_opt(2025, 4, 7).unwrap());
    assert_eq!(submitted[0].start_time, evening);
}

#[test]
fn test_out_of_range_offset_is_rejected() {
    let harness = Harness::new(FakePermissions::granting(), &[]);
    let config = EngineConfig {
        utc_offset_minutes: 24 * 60,
        ..EngineConfig::default()
    };
    let result = ClockInWizard::new(
        harness.services.clone(),
        catalog(),
        &config,
        ClockInRequest {
            user_id: "u-1".to_string(),
            clock_in_type: ClockInType::NewShift,
            roles: vec![Role::General],
            open_timesheet_id: None,
        },
    );
    assert!(matches!(result, Err(TimecardError::Config(_))));
}

#[tokio::test]
async fn test_profile_flags_decide_role_selection() {
    let harness = Harness::new(FakePermissions::granting(), &["QR-NORTH"]);
    let truck_only = RoleFlags {
        truck_view: true,
        ..RoleFlags::default()
    };
    let request = ClockInRequest::from_flags("u-1", ClockInType::SwitchJobs, truck_only)
        .with_open_timesheet("ts-7");
    assert_eq!(request.roles, vec![Role::Truck]);
    assert_eq!(request.open_timesheet_id.as_deref(), Some("ts-7"));

    let mut wizard =
        ClockInWizard::new(harness.services.clone(), catalog(), &EngineConfig::default(), request)
            .unwrap();
    assert_eq!(wizard.start().await.unwrap(), Step::JobsiteScan);
    assert_eq!(wizard.role(), Some(Role::Truck));

    let crew = RoleFlags {
        labor_view: true,
        mechanic_view: true,
        ..RoleFlags::default()
    };
    let mut wizard = ClockInWizard::new(
        harness.services.clone(),
        catalog(),
        &EngineConfig::default(),
        ClockInRequest::from_flags("u-1", ClockInType::NewShift, crew),
    )
    .unwrap();
    assert_eq!(wizard.start().await.unwrap(), Step::RoleSelection);
}
