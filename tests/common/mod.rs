//! Shared fixtures and collaborator fakes for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

use timecard_core::clock_in::{
    ClockEventPayload, ClockInServices, Coordinates, LocationPermission, Notification, Notifier,
    OpenTimesheet, PermissionsProvider, QrDecoder, RoleCache, SubmitResponse, TimesheetService,
};
use timecard_core::routing::Role;
use timecard_core::storage::{
    InMemoryLogStore, LogEntry, LogKind, LogStore, PatchOutcome, PatchRecord, RefuelEntry,
    RefuelRecord, RefuelSource, TopLevelRecord,
};
use timecard_core::validation::Catalog;

pub const EMPLOYEE: &str = "emp-1";

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 7).unwrap()
}

/// One trucking log with refuels r1 (50 gal) and r2 (20 gal).
pub fn trucking_refuel_day() -> Vec<TopLevelRecord> {
    vec![TopLevelRecord {
        id: "day-1".to_string(),
        employee_id: EMPLOYEE.to_string(),
        date: day(),
        entries: vec![LogEntry::Refuel(RefuelEntry {
            id: "tl-1".to_string(),
            source: RefuelSource::Trucking,
            equipment_id: Some("truck-3".to_string()),
            refuels: vec![
                RefuelRecord {
                    id: "r1".to_string(),
                    gallons_refueled: Some(50.0),
                    miles_at_fueling: None,
                },
                RefuelRecord {
                    id: "r2".to_string(),
                    gallons_refueled: Some(20.0),
                    miles_at_fueling: Some(120_400.0),
                },
            ],
        })],
    }]
}

pub fn seeded_store() -> Arc<InMemoryLogStore> {
    let store = Arc::new(InMemoryLogStore::new());
    store.insert(EMPLOYEE, day(), LogKind::TruckingRefuel, trucking_refuel_day());
    store
}

/// Delegates to an in-memory store, with switchable transport failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryLogStore,
    pub fail_fetch: Mutex<bool>,
    pub fail_patch: Mutex<bool>,
}

#[async_trait]
impl LogStore for FlakyStore {
    async fn fetch_logs(
        &self,
        employee_id: &str,
        date: NaiveDate,
        kind: LogKind,
    ) -> anyhow::Result<Vec<TopLevelRecord>> {
        if *self.fail_fetch.lock() {
            anyhow::bail!("connection reset");
        }
        self.inner.fetch_logs(employee_id, date, kind).await
    }

    async fn patch_logs(&self, kind: LogKind, patches: &[PatchRecord]) -> anyhow::Result<PatchOutcome> {
        if *self.fail_patch.lock() {
            anyhow::bail!("gateway timeout");
        }
        self.inner.patch_logs(kind, patches).await
    }
}

// =============================================================================
// Clock-in fakes
// =============================================================================

#[derive(Default)]
pub struct FakeTimesheets {
    pub open: Mutex<Option<OpenTimesheet>>,
    pub open_fetches: Mutex<usize>,
    pub submitted: Mutex<Vec<ClockEventPayload>>,
    pub fail_submit: Mutex<bool>,
}

#[async_trait]
impl TimesheetService for FakeTimesheets {
    async fn fetch_open_timesheet(&self, _user_id: &str) -> anyhow::Result<Option<OpenTimesheet>> {
        *self.open_fetches.lock() += 1;
        Ok(self.open.lock().clone())
    }

    async fn submit_clock_event(&self, payload: &ClockEventPayload) -> anyhow::Result<SubmitResponse> {
        self.submitted.lock().push(payload.clone());
        if *self.fail_submit.lock() {
            anyhow::bail!("503 service unavailable");
        }
        Ok(SubmitResponse {
            success: true,
            created_time_card: Some("tc-new".to_string()),
        })
    }
}

pub struct FakePermissions {
    pub camera: bool,
    pub location: bool,
    pub coordinates: Option<Coordinates>,
    pub location_requests: Mutex<usize>,
}

impl FakePermissions {
    pub fn granting() -> Self {
        Self {
            camera: true,
            location: true,
            coordinates: Some(Coordinates {
                latitude: 40.76,
                longitude: -111.89,
            }),
            location_requests: Mutex::new(0),
        }
    }
}

#[async_trait]
impl PermissionsProvider for FakePermissions {
    async fn request_camera(&self) -> bool {
        self.camera
    }

    async fn request_location(&self) -> LocationPermission {
        *self.location_requests.lock() += 1;
        LocationPermission {
            success: self.location,
        }
    }

    async fn last_coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}

/// Replays a fixed list of decoded strings on every scan.
pub struct FakeQr {
    pub codes: Vec<String>,
}

impl QrDecoder for FakeQr {
    fn decode(&self) -> BoxStream<'static, String> {
        stream::iter(self.codes.clone()).boxed()
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub events: Mutex<Vec<Notification>>,
}

impl Notifier for FakeNotifier {
    fn notify(&self, event: Notification) {
        self.events.lock().push(event);
    }
}

#[derive(Default)]
pub struct FakeRoleCache {
    pub current: Mutex<Option<Role>>,
}

impl RoleCache for FakeRoleCache {
    fn set_current_role(&self, role: Role) {
        *self.current.lock() = Some(role);
    }
}

pub struct Harness {
    pub timesheets: Arc<FakeTimesheets>,
    pub permissions: Arc<FakePermissions>,
    pub notifier: Arc<FakeNotifier>,
    pub roles: Arc<FakeRoleCache>,
    pub services: ClockInServices,
}

impl Harness {
    pub fn new(permissions: FakePermissions, qr_codes: &[&str]) -> Self {
        let timesheets = Arc::new(FakeTimesheets::default());
        let permissions = Arc::new(permissions);
        let notifier = Arc::new(FakeNotifier::default());
        let roles = Arc::new(FakeRoleCache::default());
        let services = ClockInServices {
            timesheets: timesheets.clone(),
            permissions: permissions.clone(),
            qr: Arc::new(FakeQr {
                codes: qr_codes.iter().map(|c| c.to_string()).collect(),
            }),
            notifier: notifier.clone(),
            roles: roles.clone(),
        };
        Self {
            timesheets,
            permissions,
            notifier,
            roles,
            services,
        }
    }
}

pub fn catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    catalog.load_from_rows(
        vec![
            ("js-1".into(), "QR-NORTH".into(), "North Pit".into()),
            ("js-2".into(), "QR-SOUTH".into(), "South Yard".into()),
        ],
        vec![
            ("100".into(), "Excavation".into(), Some("js-1".into())),
            ("200".into(), "Hauling".into(), None),
        ],
        vec![
            ("tr-1".into(), "EQ-T1".into(), "Kenworth 12".into(), "truck".into()),
            ("tl-1".into(), "EQ-L1".into(), "Belly dump".into(), "trailer".into()),
            ("ex-1".into(), "EQ-X1".into(), "Excavator 1".into(), "equipment".into()),
        ],
    );
    Arc::new(catalog)
}
