//! Clock-in collaborators.
//!
//! The wizard reaches the outside world only through these traits: the
//! timesheet API, device permissions, the QR decoder, the notification
//! dispatcher, and the cached current role.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::routing::decision::Role;

use super::payload::ClockEventPayload;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTimesheet {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPermission {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub created_time_card: Option<String>,
}

/// Manager-facing events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// A job switch closed a timesheet that now needs approval.
    #[serde(rename_all = "camelCase")]
    TimesheetApprovalRequested {
        user_id: String,
        closed_timesheet_id: String,
        created_time_card: Option<String>,
    },
}

#[async_trait]
pub trait TimesheetService: Send + Sync {
    /// The user's most recent open timesheet, if any.
    async fn fetch_open_timesheet(&self, user_id: &str) -> anyhow::Result<Option<OpenTimesheet>>;

    /// Create the new timesheet and, when switching jobs, close the previous one.
    async fn submit_clock_event(&self, payload: &ClockEventPayload) -> anyhow::Result<SubmitResponse>;
}

#[async_trait]
pub trait PermissionsProvider: Send + Sync {
    async fn request_camera(&self) -> bool;

    async fn request_location(&self) -> LocationPermission;

    /// Best effort; `None` when no fix is available.
    async fn last_coordinates(&self) -> Option<Coordinates>;
}

pub trait QrDecoder: Send + Sync {
    /// Decoded strings, until a match or until the stream is dropped.
    fn decode(&self) -> BoxStream<'static, String>;
}

pub trait Notifier: Send + Sync {
    /// Fire and forget.
    fn notify(&self, event: Notification);
}

pub trait RoleCache: Send + Sync {
    fn set_current_role(&self, role: Role);
}

/// Everything the wizard talks to.
#[derive(Clone)]
pub struct ClockInServices {
    pub timesheets: Arc<dyn TimesheetService>,
    pub permissions: Arc<dyn PermissionsProvider>,
    pub qr: Arc<dyn QrDecoder>,
    pub notifier: Arc<dyn Notifier>,
    pub roles: Arc<dyn RoleCache>,
}

impl fmt::Debug for ClockInServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockInServices").finish_non_exhaustive()
    }
}
