//! Core type definitions for the AetherNet swarm system

use core::fmt;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

/// Maximum length of unit and cluster identifiers
pub const MAX_ID_LEN: usize = 16;

/// Maximum fleet size tracked in a single operation
pub const MAX_UNITS: usize = 64;

/// Maximum zone readings per scan batch
pub const MAX_ZONES: usize = 64;

/// Maximum members in a single cluster
pub const MAX_CLUSTER_MEMBERS: usize = 16;

/// Result type for swarm operations
pub type Result<T> = core::result::Result<T, SwarmError>;

/// Normalized composite risk value in [0, 1], rounded to 3 decimals
pub type RiskScore = f32;

/// Error types for the swarm coordination core.
///
/// The control loop degrades gracefully: missing inputs default, advisory
/// conditions are reported through return types, and only capacity
/// exhaustion or bad lookups surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwarmError {
    /// Fixed-capacity buffer overflow
    BufferFull,
    /// Referenced cluster is not registered
    UnknownCluster,
    /// Invalid parameter provided
    InvalidParameter,
    /// OS entropy source unavailable
    EntropyUnavailable,
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmError::BufferFull => write!(f, "Buffer overflow"),
            SwarmError::UnknownCluster => write!(f, "Unknown cluster"),
            SwarmError::InvalidParameter => write!(f, "Invalid parameter"),
            SwarmError::EntropyUnavailable => write!(f, "Entropy source unavailable"),
        }
    }
}

/// Unique identifier for a mobile unit.
///
/// Construction truncates to [`MAX_ID_LEN`] characters, so two ids that
/// share their first [`MAX_ID_LEN`] characters compare equal. Callers
/// are expected to keep ids within the limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(String<MAX_ID_LEN>);

impl UnitId {
    /// Create a new unit ID, truncating to [`MAX_ID_LEN`] characters
    pub fn new(id: &str) -> Self {
        Self(truncated(id))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a cluster.
///
/// Truncates like [`UnitId`]: ids sharing their first [`MAX_ID_LEN`]
/// characters collide, and the colliding id maps to a single registry
/// entry. Callers are expected to keep ids within the limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(String<MAX_ID_LEN>);

impl ClusterId {
    /// Create a new cluster ID, truncating to [`MAX_ID_LEN`] characters
    pub fn new(id: &str) -> Self {
        Self(truncated(id))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn truncated(id: &str) -> String<MAX_ID_LEN> {
    let mut s = String::new();
    for c in id.chars() {
        if s.push(c).is_err() {
            break;
        }
    }
    s
}

/// Operational status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Unit is operating normally
    Ok,
    /// Unit has failed and must be removed from cluster duty
    Failed,
}

/// Role assigned to a unit within a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitRole {
    /// Anchors the mesh for a priority zone
    MeshEmitter,
    /// Wide-area scanning
    Scout,
    /// Communication relay
    Relay,
    /// Passive observation
    Observer,
}

impl UnitRole {
    /// Wire label for telemetry payloads
    pub fn label(&self) -> &'static str {
        match self {
            UnitRole::MeshEmitter => "mesh_emitter",
            UnitRole::Scout => "scout",
            UnitRole::Relay => "relay",
            UnitRole::Observer => "observer",
        }
    }
}

/// A mobile unit record.
///
/// Units are created externally; role and heading fields are mutated only
/// through cluster-manager operations, which return updated copies rather
/// than aliasing shared state. Removal from a cluster never destroys the
/// record.
///
/// A missing battery value is interpreted per operation: role assignment
/// treats it as 0 (never priority-eligible), rotation scheduling as 100
/// (sorted last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Unique unit identifier
    pub id: UnitId,
    /// Battery level in percent (0-100), if reported
    pub battery: Option<f32>,
    /// Operational status
    pub status: UnitStatus,
    /// Assigned role, if any
    pub role: Option<UnitRole>,
    /// Desired heading in degrees, if biased
    pub heading_deg: Option<f32>,
    /// Desired bank angle in degrees, if biased
    pub bank_deg: Option<f32>,
    /// Desired angle of attack in degrees, if biased
    pub angle_of_attack_deg: Option<f32>,
}

impl UnitRecord {
    /// Create a new unit with no battery report and Ok status
    pub fn new(id: &str) -> Self {
        Self {
            id: UnitId::new(id),
            battery: None,
            status: UnitStatus::Ok,
            role: None,
            heading_deg: None,
            bank_deg: None,
            angle_of_attack_deg: None,
        }
    }

    /// Set the battery level
    pub fn with_battery(mut self, percent: f32) -> Self {
        self.battery = Some(percent);
        self
    }

    /// Set the operational status
    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }

    /// Check whether the unit has failed
    pub fn is_failed(&self) -> bool {
        self.status == UnitStatus::Failed
    }
}

/// Wind-relative orientation category.
///
/// Used both as a classifier input feature and as a geometry
/// recommendation. Unrecognized labels coerce to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMode {
    /// Heading into the wind
    Upwind,
    /// Heading with the wind
    Downwind,
    /// Heading 90 degrees to the wind
    Crosswind,
    /// No wind-relative alignment
    #[default]
    None,
}

impl AlignmentMode {
    /// Parse a wire label, coercing unknown values to `None`
    pub fn from_label(label: &str) -> Self {
        match label {
            "upwind" => AlignmentMode::Upwind,
            "downwind" => AlignmentMode::Downwind,
            "crosswind" => AlignmentMode::Crosswind,
            _ => AlignmentMode::None,
        }
    }

    /// Wire label for telemetry payloads
    pub fn label(&self) -> &'static str {
        match self {
            AlignmentMode::Upwind => "upwind",
            AlignmentMode::Downwind => "downwind",
            AlignmentMode::Crosswind => "crosswind",
            AlignmentMode::None => "none",
        }
    }
}

/// Optional orientation metadata attached to a zone reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleMeta {
    /// Heading in degrees
    pub heading_deg: Option<f32>,
    /// Bank angle in degrees
    pub bank_deg: Option<f32>,
    /// Angle of attack in degrees
    pub angle_of_attack_deg: Option<f32>,
    /// Formation yaw offset in degrees
    pub formation_yaw_offset_deg: Option<f32>,
    /// Wind-relative alignment
    pub alignment_mode: AlignmentMode,
}

/// A per-zone environmental reading.
///
/// Immutable once produced; missing sensor features default to 0.0 at
/// construction rather than at the call sites that consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    /// Zone coordinates (x, y)
    pub coordinates: (f32, f32),
    /// Convective available potential energy
    pub cape: f32,
    /// Vorticity signal
    pub vorticity: f32,
    /// Relative humidity (0-1)
    pub humidity: f32,
    /// Vertical velocity
    pub vertical_velocity: f32,
    /// Composite anomaly score (0-1)
    pub anomaly_score: f32,
    /// Wind-from direction in degrees, if measured
    pub wind_direction_deg: Option<f32>,
    /// Wind shear magnitude, if measured
    pub wind_shear: Option<f32>,
    /// Orientation metadata, if attached
    pub angle_meta: Option<AngleMeta>,
}

impl ZoneReading {
    /// Create a reading at the given coordinates with all sensors zeroed
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            coordinates: (x, y),
            cape: 0.0,
            vorticity: 0.0,
            humidity: 0.0,
            vertical_velocity: 0.0,
            anomaly_score: 0.0,
            wind_direction_deg: None,
            wind_shear: None,
            angle_meta: None,
        }
    }

    /// Set the five sensor features
    pub fn with_sensors(
        mut self,
        cape: f32,
        vorticity: f32,
        humidity: f32,
        vertical_velocity: f32,
        anomaly_score: f32,
    ) -> Self {
        self.cape = cape;
        self.vorticity = vorticity;
        self.humidity = humidity;
        self.vertical_velocity = vertical_velocity;
        self.anomaly_score = anomaly_score;
        self
    }

    /// Attach wind measurements
    pub fn with_wind(mut self, direction_deg: f32, shear: f32) -> Self {
        self.wind_direction_deg = Some(direction_deg);
        self.wind_shear = Some(shear);
        self
    }

    /// Attach orientation metadata
    pub fn with_angle_meta(mut self, meta: AngleMeta) -> Self {
        self.angle_meta = Some(meta);
        self
    }

    /// The five sensor features in canonical order:
    /// CAPE, vorticity, humidity, vertical velocity, anomaly score
    pub fn sensor_features(&self) -> [f32; 5] {
        [
            self.cape,
            self.vorticity,
            self.humidity,
            self.vertical_velocity,
            self.anomaly_score,
        ]
    }
}

/// Stable insertion sort by an f32 key, ascending.
///
/// Prioritization and rotation scheduling promise tie-stability as part of
/// their contract; slice `sort_unstable` cannot guarantee it, so ordering
/// goes through this helper.
pub(crate) fn stable_sort_by_key<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> f32,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && key(&items[j - 1]) > key(&items[j]) {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_roundtrip() {
        let id = UnitId::new("D087");
        assert_eq!(id.as_str(), "D087");
        assert_eq!(format!("{}", id), "D087");
    }

    #[test]
    fn test_unit_id_truncates() {
        let id = UnitId::new("a-very-long-identifier-string");
        assert_eq!(id.as_str().len(), MAX_ID_LEN);
    }

    #[test]
    fn test_ids_sharing_prefix_collide() {
        let a = ClusterId::new("shared-prefix-zone-alpha");
        let b = ClusterId::new("shared-prefix-zone-bravo");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "shared-prefix-zo");
    }

    #[test]
    fn test_unit_defaults() {
        let unit = UnitRecord::new("D1");
        assert_eq!(unit.battery, None);
        assert_eq!(unit.status, UnitStatus::Ok);
        assert!(unit.role.is_none());
        assert!(!unit.is_failed());
    }

    #[test]
    fn test_alignment_mode_coercion() {
        assert_eq!(AlignmentMode::from_label("upwind"), AlignmentMode::Upwind);
        assert_eq!(AlignmentMode::from_label("sideways"), AlignmentMode::None);
        assert_eq!(AlignmentMode::from_label(""), AlignmentMode::None);
    }

    #[test]
    fn test_reading_sensor_defaults() {
        let reading = ZoneReading::new(1.0, 2.0);
        assert_eq!(reading.sensor_features(), [0.0; 5]);
        assert!(reading.wind_direction_deg.is_none());
    }

    #[test]
    fn test_stable_sort_preserves_tie_order() {
        let mut items: Vec<(u32, f32), 8> = Vec::new();
        items.push((1, 2.0)).unwrap();
        items.push((2, 1.0)).unwrap();
        items.push((3, 2.0)).unwrap();
        items.push((4, 1.0)).unwrap();
        stable_sort_by_key(&mut items, |e| e.1);
        let order: std::vec::Vec<u32> = items.iter().map(|e| e.0).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }
}
