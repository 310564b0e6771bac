//! Review session context.
//!
//! Identifies a manager's review session and the `(date, kind)` pair it has
//! loaded, for logging and state tracking.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::logging::structured::LogContext;
use crate::storage::models::LogKind;

/// The `(date, kind)` pair currently under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub kind: LogKind,
    pub date: NaiveDate,
}

impl Selection {
    pub fn new(kind: LogKind, date: NaiveDate) -> Self {
        Self { kind, date }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.date)
    }
}

/// Context for one review session over one employee's logs.
#[derive(Debug, Clone)]
pub struct ReviewContext {
    pub session_id: String,
    pub employee_id: String,
    pub started_at: DateTime<Utc>,
}

impl ReviewContext {
    pub fn new(employee_id: &str) -> Self {
        let base = LogContext::generate("review");
        Self {
            session_id: base.session_id,
            employee_id: employee_id.to_string(),
            started_at: Utc::now(),
        }
    }

    /// Logging context, narrowed to the selected kind when one is loaded.
    pub fn log_context(&self, selection: Option<&Selection>) -> LogContext {
        let ctx = LogContext::new(&self.session_id).with_employee(&self.employee_id);
        match selection {
            Some(selection) => ctx.with_scope(selection.kind.as_str()),
            None => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_scopes_to_kind() {
        let review = ReviewContext::new("emp-1");
        assert!(review.session_id.starts_with("review-"));

        let selection = Selection::new(
            LogKind::TruckingRefuel,
            NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
        );
        let ctx = review.log_context(Some(&selection));
        assert_eq!(ctx.scope.as_deref(), Some("truckingRefuel"));
        assert_eq!(ctx.employee_id.as_deref(), Some("emp-1"));
        assert_eq!(selection.to_string(), "truckingRefuel@2025-04-07");
    }
}
