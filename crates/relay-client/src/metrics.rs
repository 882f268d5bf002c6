//! Lightweight instrumentation for the relay client.
//!
//! Uses the `metrics` crate facade; whatever recorder the host application
//! installs receives these series. Without a recorder every call is a no-op.

use metrics::{counter, gauge, histogram};

/// Metric names.
pub mod names {
    pub const PUBLISHED_TOTAL: &str = "relay_published_total";
    pub const PUBLISHED_BYTES: &str = "relay_published_bytes";
    pub const RECEIVED_TOTAL: &str = "relay_received_total";
    pub const RECEIVED_BYTES: &str = "relay_received_bytes";
    pub const REQUESTS_TOTAL: &str = "relay_requests_total";
    pub const REQUEST_SECONDS: &str = "relay_request_seconds";
    pub const SUBSCRIPTIONS_ACTIVE: &str = "relay_subscriptions_active";
    pub const ERRORS_TOTAL: &str = "relay_errors_total";
}

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    metrics::describe_counter!(names::PUBLISHED_TOTAL, "Messages published through the app");
    metrics::describe_counter!(names::PUBLISHED_BYTES, "Payload bytes published through the app");
    metrics::describe_counter!(
        names::RECEIVED_TOTAL,
        "Messages received across all subscriptions"
    );
    metrics::describe_counter!(
        names::RECEIVED_BYTES,
        "Bytes received across all subscriptions"
    );
    metrics::describe_counter!(names::REQUESTS_TOTAL, "Request/response round trips");
    metrics::describe_histogram!(names::REQUEST_SECONDS, "Request round-trip time in seconds");
    metrics::describe_gauge!(names::SUBSCRIPTIONS_ACTIVE, "Currently active subscriptions");
    metrics::describe_counter!(names::ERRORS_TOTAL, "Errors surfaced to callers");
}

/// Record a published message.
pub(crate) fn record_publish(bytes: usize) {
    counter!(names::PUBLISHED_TOTAL).increment(1);
    counter!(names::PUBLISHED_BYTES).increment(bytes as u64);
}

/// Record a received message.
pub(crate) fn record_receive(bytes: usize) {
    counter!(names::RECEIVED_TOTAL).increment(1);
    counter!(names::RECEIVED_BYTES).increment(bytes as u64);
}

/// Record a completed request round trip.
pub(crate) fn record_request(seconds: f64) {
    counter!(names::REQUESTS_TOTAL).increment(1);
    histogram!(names::REQUEST_SECONDS).record(seconds);
}

/// Record an error surfaced to the caller.
pub(crate) fn record_error(kind: &'static str) {
    counter!(names::ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Guard that keeps the active-subscription gauge in step.
pub(crate) struct SubscriptionMetricsGuard;

impl SubscriptionMetricsGuard {
    pub(crate) fn new() -> Self {
        gauge!(names::SUBSCRIPTIONS_ACTIVE).increment(1.0);
        Self
    }
}

impl Drop for SubscriptionMetricsGuard {
    fn drop(&mut self) {
        gauge!(names::SUBSCRIPTIONS_ACTIVE).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_a_recorder() {
        // All helpers must be no-ops, not panics, when no recorder is set
        describe();
        record_publish(16);
        record_receive(16);
        record_request(0.001);
        record_error("not_connected");
        let _guard = SubscriptionMetricsGuard::new();
    }
}
