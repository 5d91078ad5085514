//! Prometheus metrics for an EHR node.
//!
//! Counts flows by outcome and keeps a gauge of the agreements this party's
//! vault holds. The [`NodeMetrics`] struct owns a dedicated [`Registry`]
//! that the RPC `/metrics` endpoint can encode into the Prometheus text
//! exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use ehr_flows::{FlowError, FlowEvent};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Flows started on this node, by flow name.
    pub flows_started: IntCounterVec,
    /// Transitions this node's flows got committed.
    pub transitions_committed: IntCounter,
    /// Flows stopped by a contract rule before anything was sent.
    pub verification_failures: IntCounter,
    /// Flows aborted because a counterparty declined, timed out or was unreachable.
    pub coordination_failures: IntCounter,
    /// Flows that lost a race at the finality service.
    pub conflicts: IntCounter,
    /// Flows failed for any other reason (bad parameters, rejection, storage).
    pub other_failures: IntCounter,
    /// Proposals from other parties this node endorsed.
    pub proposals_endorsed: IntCounter,
    /// Proposals from other parties this node declined.
    pub proposals_declined: IntCounter,
    /// Post-commit deliveries to other participants that failed.
    pub distribution_failures: IntCounter,
    /// Notices that could not be delivered.
    pub notifications_failed: IntCounter,
    pub record_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Agreements with a current version in this party's vault.
    pub agreements: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a flow from start to commit or failure, in seconds.
    pub flow_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        // Counters
        let flows_started = register_int_counter_vec_with_registry!(
            Opts::new("ehr_flows_started_total", "Flows started on this node"),
            &["flow"],
            registry
        )
        .expect("failed to register flows_started counter");

        let transitions_committed = register_int_counter_with_registry!(
            Opts::new(
                "ehr_transitions_committed_total",
                "Transitions committed by flows started on this node"
            ),
            registry
        )
        .expect("failed to register transitions_committed counter");

        let verification_failures = register_int_counter_with_registry!(
            Opts::new(
                "ehr_verification_failures_total",
                "Flows rejected by the contract before signing"
            ),
            registry
        )
        .expect("failed to register verification_failures counter");

        let coordination_failures = register_int_counter_with_registry!(
            Opts::new(
                "ehr_coordination_failures_total",
                "Flows aborted during signature collection"
            ),
            registry
        )
        .expect("failed to register coordination_failures counter");

        let conflicts = register_int_counter_with_registry!(
            Opts::new("ehr_conflicts_total", "Flows that lost a commit race"),
            registry
        )
        .expect("failed to register conflicts counter");

        let other_failures = register_int_counter_with_registry!(
            Opts::new("ehr_flow_failures_other_total", "Flows failed for other reasons"),
            registry
        )
        .expect("failed to register other_failures counter");

        let proposals_endorsed = register_int_counter_with_registry!(
            Opts::new(
                "ehr_proposals_endorsed_total",
                "Proposals from other parties endorsed by this node"
            ),
            registry
        )
        .expect("failed to register proposals_endorsed counter");

        let proposals_declined = register_int_counter_with_registry!(
            Opts::new(
                "ehr_proposals_declined_total",
                "Proposals from other parties declined by this node"
            ),
            registry
        )
        .expect("failed to register proposals_declined counter");

        let distribution_failures = register_int_counter_with_registry!(
            Opts::new(
                "ehr_distribution_failures_total",
                "Committed transitions not delivered to a participant"
            ),
            registry
        )
        .expect("failed to register distribution_failures counter");

        let notifications_failed = register_int_counter_with_registry!(
            Opts::new("ehr_notifications_failed_total", "Notices not delivered"),
            registry
        )
        .expect("failed to register notifications_failed counter");

        let record_failures = register_int_counter_with_registry!(
            Opts::new(
                "ehr_record_failures_total",
                "Committed transitions missing from this node's vault"
            ),
            registry
        )
        .expect("failed to register record_failures counter");

        // Gauges
        let agreements = register_int_gauge_with_registry!(
            Opts::new("ehr_agreements", "Agreements with a current version in the vault"),
            registry
        )
        .expect("failed to register agreements gauge");

        // Histograms – exponential buckets covering 1 ms → ~32 s.
        let flow_latency_seconds = register_histogram_with_registry!(
            HistogramOpts::new("ehr_flow_latency_seconds", "Flow latency in seconds")
                .buckets(prometheus::exponential_buckets(0.001, 2.0, 16).unwrap()),
            registry
        )
        .expect("failed to register flow_latency_seconds histogram");

        Self {
            registry,
            flows_started,
            transitions_committed,
            verification_failures,
            coordination_failures,
            conflicts,
            other_failures,
            proposals_endorsed,
            proposals_declined,
            distribution_failures,
            notifications_failed,
            record_failures,
            agreements,
            flow_latency_seconds,
        }
    }

    /// Fold one flow event into the counters.
    pub fn observe(&self, event: &FlowEvent) {
        match event {
            FlowEvent::Started { flow } => self.flows_started.with_label_values(&[flow]).inc(),
            FlowEvent::Committed { .. } => self.transitions_committed.inc(),
            FlowEvent::Failed { error, .. } => match error {
                FlowError::Verification(_) => self.verification_failures.inc(),
                FlowError::Coordination { .. } => self.coordination_failures.inc(),
                FlowError::Conflict(_) => self.conflicts.inc(),
                _ => self.other_failures.inc(),
            },
            FlowEvent::Endorsed { .. } => self.proposals_endorsed.inc(),
            FlowEvent::Declined { .. } => self.proposals_declined.inc(),
            FlowEvent::DistributionFailed { .. } => self.distribution_failures.inc(),
            FlowEvent::NotificationFailed { .. } => self.notifications_failed.inc(),
            FlowEvent::RecordFailed { .. } => self.record_failures.inc(),
            FlowEvent::Recorded { .. } | FlowEvent::NoticeReceived { .. } => {}
        }
    }

    /// The registry in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehr_flows::CoordinationFailure;

    #[test]
    fn failures_are_counted_by_kind() {
        let metrics = NodeMetrics::new();
        metrics.observe(&FlowEvent::Started { flow: "share" });
        metrics.observe(&FlowEvent::Failed {
            flow: "share",
            error: FlowError::Coordination {
                party: "Doctor D2".into(),
                failure: CoordinationFailure::Timeout,
            },
        });
        metrics.observe(&FlowEvent::Failed {
            flow: "share",
            error: FlowError::Parameter("x".into()),
        });
        assert_eq!(metrics.flows_started.with_label_values(&["share"]).get(), 1);
        assert_eq!(metrics.coordination_failures.get(), 1);
        assert_eq!(metrics.other_failures.get(), 1);
        assert_eq!(metrics.conflicts.get(), 0);
    }

    #[test]
    fn vault_lag_is_counted() {
        let metrics = NodeMetrics::new();
        metrics.observe(&FlowEvent::RecordFailed {
            transition: ehr_types::TransitionId::new([4; 32]),
            reason: "disk full".into(),
        });
        assert_eq!(metrics.record_failures.get(), 1);
        assert!(metrics.encode().unwrap().contains("ehr_record_failures_total 1"));
    }

    #[test]
    fn encodes_text_format() {
        let metrics = NodeMetrics::new();
        metrics.agreements.set(3);
        let text = metrics.encode().unwrap();
        assert!(text.contains("ehr_agreements 3"));
    }
}
