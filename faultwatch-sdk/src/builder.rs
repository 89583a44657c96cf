//! Report construction.

use chrono::{DateTime, Utc};
use faultwatch_types::{FaultState, Report};

/// Timestamp layout expected by the fault API: ISO-8601, UTC, whole seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Stamps classified states with the light identifier and a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBuilder {
    source_id: String,
}

impl ReportBuilder {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn build(&self, state: FaultState, at: DateTime<Utc>) -> Report {
        Report::new(state, self.source_id.clone(), format_timestamp(at))
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
