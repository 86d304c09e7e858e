//! Structured Telemetry Events
//!
//! One-way event records emitted toward an external data sink. The core
//! never depends on delivery confirmation or cross-sink ordering, and no
//! component depends on another having emitted anything: observability is
//! separate from control flow.
//!
//! Each event carries an ISO-8601 UTC timestamp, an origin id, an event
//! type, a structured payload and a visibility tag.

use crate::base_station::MissionEnvelope;
use crate::behaviours::{LocalConditions, PatternBehaviour, TurbulencePattern};
use crate::cluster_manager::{ClusterMode, ClusterStatus};
use crate::types::{ClusterId, UnitId, MAX_UNITS};
use core::fmt::Write as _;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

/// Visibility tag stamped on every event
pub const LICENSE_TAG: &str = "CC0";

/// Maximum events retained by [`MemorySink`]
pub const MAX_BUFFERED_EVENTS: usize = 64;

/// Telemetry event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Fleet rotation ordering was computed
    RotationSchedule,
    /// A standby unit was (or could not be) assigned as backup
    AssignBackupUnit,
    /// Mission envelope parameters changed
    MissionEnvelopeUpdate,
    /// A unit executed a turbulence sampling pattern
    TurbulencePatternExecuted,
    /// A pattern was chosen from local conditions
    AdaptivePatternDecision,
    /// Cluster membership or mode changed
    ClusterStatus,
}

impl EventType {
    /// Wire label
    pub fn label(&self) -> &'static str {
        match self {
            EventType::RotationSchedule => "rotation_schedule",
            EventType::AssignBackupUnit => "assign_backup_unit",
            EventType::MissionEnvelopeUpdate => "mission_envelope_update",
            EventType::TurbulencePatternExecuted => "turbulence_pattern_executed",
            EventType::AdaptivePatternDecision => "adaptive_pattern_decision",
            EventType::ClusterStatus => "cluster_status",
        }
    }
}

/// Event-specific structured payload
#[derive(Debug, Clone, Serialize)]
pub enum EventPayload {
    /// Rotation ordering, lowest battery first
    RotationSchedule {
        /// Unit ids in rotation order
        order: Vec<UnitId, MAX_UNITS>,
    },
    /// Backup assignment outcome
    AssignBackupUnit {
        /// Cluster requesting backup
        cluster_id: ClusterId,
        /// Assigned standby unit; `None` is an explicit no-assignment
        assigned: Option<UnitId>,
    },
    /// Mission envelope change
    MissionEnvelopeUpdate {
        /// The new envelope
        envelope: MissionEnvelope,
    },
    /// Executed sampling pattern
    TurbulencePatternExecuted {
        /// Behaviour details
        behaviour: PatternBehaviour,
    },
    /// Pattern choice with its inputs
    AdaptivePatternDecision {
        /// Unit the decision was made for
        unit_id: UnitId,
        /// Chosen pattern
        pattern: TurbulencePattern,
        /// Conditions the choice was based on
        conditions: LocalConditions,
    },
    /// Cluster state report
    ClusterStatus {
        /// Cluster id
        cluster_id: ClusterId,
        /// Derived operating mode
        mode: ClusterMode,
        /// Lifecycle status
        status: ClusterStatus,
        /// Current member count
        member_count: u32,
        /// Members removed by this operation (0 when reporting formation)
        removed: u32,
    },
}

/// A structured telemetry event
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    /// ISO-8601 UTC timestamp
    pub timestamp: String<32>,
    /// Origin identifier
    pub origin: UnitId,
    /// Event type
    pub event: EventType,
    /// Event-specific payload
    pub payload: EventPayload,
    /// Visibility tag
    pub license: &'static str,
}

impl TelemetryEvent {
    /// Create an event, formatting the timestamp from epoch milliseconds
    pub fn new(timestamp_ms: u64, origin: &UnitId, event: EventType, payload: EventPayload) -> Self {
        Self {
            timestamp: iso8601_utc(timestamp_ms),
            origin: origin.clone(),
            event,
            payload,
            license: LICENSE_TAG,
        }
    }
}

/// One-way event consumer
pub trait TelemetrySink {
    /// Receive an event; delivery is fire-and-forget
    fn emit(&mut self, event: &TelemetryEvent);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&mut self, _event: &TelemetryEvent) {}
}

/// Bounded in-memory sink, mainly for tests. Keeps the oldest events when
/// the buffer fills.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<TelemetryEvent, MAX_BUFFERED_EVENTS>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Recorded events in emission order
    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    /// Count recorded events of a given type
    pub fn count_of(&self, event: EventType) -> usize {
        self.events.iter().filter(|e| e.event == event).count()
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&mut self, event: &TelemetryEvent) {
        self.events.push(event.clone()).ok();
    }
}

/// Format epoch milliseconds as an ISO-8601 UTC timestamp
/// (`YYYY-MM-DDTHH:MM:SS.mmmZ`)
pub fn iso8601_utc(epoch_ms: u64) -> String<32> {
    let secs = epoch_ms / 1000;
    let millis = epoch_ms % 1000;
    let days = secs / 86_400;
    let tod = secs % 86_400;
    let (year, month, day) = civil_from_days(days as i64);
    let mut out = String::new();
    write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        tod / 3600,
        (tod % 3600) / 60,
        tod % 60,
        millis
    )
    .ok();
    out
}

// Proleptic Gregorian date from days since 1970-01-01.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_zero() {
        assert_eq!(iso8601_utc(0).as_str(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_known_epoch() {
        // 2023-11-14 22:13:20 UTC
        assert_eq!(
            iso8601_utc(1_700_000_000_000).as_str(),
            "2023-11-14T22:13:20.000Z"
        );
    }

    #[test]
    fn test_millisecond_component() {
        assert_eq!(iso8601_utc(1_700_000_000_042).as_str(), "2023-11-14T22:13:20.042Z");
    }

    #[test]
    fn test_leap_day() {
        // 2020-02-29 00:00:00 UTC
        assert_eq!(
            iso8601_utc(1_582_934_400_000).as_str(),
            "2020-02-29T00:00:00.000Z"
        );
    }

    #[test]
    fn test_event_labels() {
        assert_eq!(EventType::RotationSchedule.label(), "rotation_schedule");
        assert_eq!(EventType::AssignBackupUnit.label(), "assign_backup_unit");
        assert_eq!(EventType::MissionEnvelopeUpdate.label(), "mission_envelope_update");
        assert_eq!(
            EventType::TurbulencePatternExecuted.label(),
            "turbulence_pattern_executed"
        );
        assert_eq!(
            EventType::AdaptivePatternDecision.label(),
            "adaptive_pattern_decision"
        );
        assert_eq!(EventType::ClusterStatus.label(), "cluster_status");
    }

    #[test]
    fn test_memory_sink_records_and_counts() {
        let mut sink = MemorySink::new();
        let origin = UnitId::new("BASE");
        let event = TelemetryEvent::new(
            0,
            &origin,
            EventType::AssignBackupUnit,
            EventPayload::AssignBackupUnit {
                cluster_id: ClusterId::new("C1"),
                assigned: None,
            },
        );
        sink.emit(&event);
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.count_of(EventType::AssignBackupUnit), 1);
        assert_eq!(sink.count_of(EventType::ClusterStatus), 0);
        assert_eq!(sink.events()[0].license, LICENSE_TAG);
    }
}
