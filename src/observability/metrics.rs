//! Metrics for the address resolution pipeline
//!
//! Recording goes through the `metrics` facade; when no recorder is installed
//! every call here is a no-op.

use std::fmt;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Session metrics
    SessionReadinessTransitions,

    // Widget metrics
    WidgetsCreated,
    WidgetsDisposed,
    WidgetsUnavailable,

    // Monitor metrics
    MonitorCommits,
    MonitorDuplicatesSuppressed,
    MonitorLateResolutionsDiscarded,

    // Resolver metrics
    ResolverResolutions,
    ResolverRemoteErrors,

    // Sync metrics
    SyncFieldsWritten,
    SyncFieldsSkipped,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SessionReadinessTransitions => "address_session_readiness_transitions_total",
            MetricName::WidgetsCreated => "address_widgets_created_total",
            MetricName::WidgetsDisposed => "address_widgets_disposed_total",
            MetricName::WidgetsUnavailable => "address_widgets_unavailable_total",
            MetricName::MonitorCommits => "address_monitor_commits_total",
            MetricName::MonitorDuplicatesSuppressed => "address_monitor_duplicates_suppressed_total",
            MetricName::MonitorLateResolutionsDiscarded => {
                "address_monitor_late_resolutions_discarded_total"
            }
            MetricName::ResolverResolutions => "address_resolver_resolutions_total",
            MetricName::ResolverRemoteErrors => "address_resolver_remote_errors_total",
            MetricName::SyncFieldsWritten => "address_sync_fields_written_total",
            MetricName::SyncFieldsSkipped => "address_sync_fields_skipped_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub mod session {
    use super::MetricName;

    pub fn readiness_changed(state: &'static str) {
        ::metrics::counter!(MetricName::SessionReadinessTransitions.as_str(), "state" => state)
            .increment(1);
    }
}

pub mod widget {
    use super::MetricName;

    pub fn created() {
        ::metrics::counter!(MetricName::WidgetsCreated.as_str()).increment(1);
    }

    pub fn disposed() {
        ::metrics::counter!(MetricName::WidgetsDisposed.as_str()).increment(1);
    }

    /// A field fell back to plain text input
    pub fn unavailable(reason: &'static str) {
        ::metrics::counter!(MetricName::WidgetsUnavailable.as_str(), "reason" => reason)
            .increment(1);
    }
}

pub mod monitor {
    use super::MetricName;

    pub fn commit(strategy: &'static str) {
        ::metrics::counter!(MetricName::MonitorCommits.as_str(), "strategy" => strategy)
            .increment(1);
    }

    pub fn duplicate_suppressed(strategy: &'static str) {
        ::metrics::counter!(
            MetricName::MonitorDuplicatesSuppressed.as_str(),
            "strategy" => strategy
        )
        .increment(1);
    }

    pub fn late_resolution_discarded() {
        ::metrics::counter!(MetricName::MonitorLateResolutionsDiscarded.as_str()).increment(1);
    }
}

pub mod resolver {
    use super::MetricName;

    pub fn resolved(path: &'static str) {
        ::metrics::counter!(MetricName::ResolverResolutions.as_str(), "path" => path)
            .increment(1);
    }

    pub fn remote_error() {
        ::metrics::counter!(MetricName::ResolverRemoteErrors.as_str()).increment(1);
    }
}

pub mod sync {
    use super::MetricName;

    pub fn field_written(sink: &'static str) {
        ::metrics::counter!(MetricName::SyncFieldsWritten.as_str(), "sink" => sink).increment(1);
    }

    pub fn field_skipped(sink: &'static str) {
        ::metrics::counter!(MetricName::SyncFieldsSkipped.as_str(), "sink" => sink).increment(1);
    }
}
