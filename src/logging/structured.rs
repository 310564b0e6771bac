//! Structured logging utilities.
//!
//! Provides context-aware logging with the session id, and optionally the
//! employee and log kind under review, included in every log message.

use std::fmt;

use uuid::Uuid;

/// Logging context for a review or clock-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub session_id: String,
    pub employee_id: Option<String>,
    pub scope: Option<String>,
}

impl LogContext {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            employee_id: None,
            scope: None,
        }
    }

    /// Create a context with a freshly generated session id, e.g. `review-1a2b3c4d`.
    pub fn generate(prefix: &str) -> Self {
        Self::new(&format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8]))
    }

    pub fn with_employee(&self, employee_id: &str) -> Self {
        Self {
            session_id: self.session_id.clone(),
            employee_id: Some(employee_id.to_string()),
            scope: self.scope.clone(),
        }
    }

    /// Narrow the context to a scope such as the active log kind.
    pub fn with_scope(&self, scope: &str) -> Self {
        Self {
            session_id: self.session_id.clone(),
            employee_id: self.employee_id.clone(),
            scope: Some(scope.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[session={}]", self.session_id)?;
        if let Some(employee) = &self.employee_id {
            write!(f, " [employee={}]", employee)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, " [kind={}]", scope)?;
        }
        Ok(())
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!("{} {}{}", $ctx, $event, {
            #[allow(unused_mut)]
            let mut fields = String::new();
            $( fields.push_str(&format!(" {}={:?}", stringify!($key), $value)); )*
            fields
        })
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!("{} {}{}", $ctx, $event, {
            #[allow(unused_mut)]
            let mut fields = String::new();
            $( fields.push_str(&format!(" {}={:?}", stringify!($key), $value)); )*
            fields
        })
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::error!("{} {}{}", $ctx, $event, {
            #[allow(unused_mut)]
            let mut fields = String::new();
            $( fields.push_str(&format!(" {}={:?}", stringify!($key), $value)); )*
            fields
        })
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!("{} {}{}", $ctx, $event, {
            #[allow(unused_mut)]
            let mut fields = String::new();
            $( fields.push_str(&format!(" {}={:?}", stringify!($key), $value)); )*
            fields
        })
    };
}
