//! Request-tracker status codes (spec §6: integers 1..7).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    Processing,
    PartiallyAvailable,
    Available,
    Failed,
    #[default]
    Unknown,
}

impl RequestStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => RequestStatus::Pending,
            2 => RequestStatus::Approved,
            3 => RequestStatus::Declined,
            4 => RequestStatus::Processing,
            5 => RequestStatus::PartiallyAvailable,
            6 => RequestStatus::Available,
            7 => RequestStatus::Failed,
            _ => RequestStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Declined => "declined",
            RequestStatus::Processing => "processing",
            RequestStatus::PartiallyAvailable => "partially_available",
            RequestStatus::Available => "available",
            RequestStatus::Failed => "failed",
            RequestStatus::Unknown => "unknown",
        }
    }

    /// Case-insensitive match against a status name, as used by the
    /// `requestStatus(s)` filter helper.
    pub fn matches_name(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name)
    }

    /// RequestEnricher only sets `approved_by` when the status is one of
    /// these two (spec §4.2).
    pub fn grants_approver(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Available)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
