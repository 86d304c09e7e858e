//! Cluster Lifecycle Management
//!
//! Owns unit/cluster lifecycle for the control loop: role assignment,
//! cluster formation, failure-triggered reconfiguration, rotation
//! scheduling, heading bias and backup assignment.
//!
//! The manager holds the canonical membership list per cluster id.
//! Operations return fresh record values (copy-on-write) instead of
//! mutating shared aliases; a cluster losing members is demoted rather
//! than torn down.

use crate::config::SwarmConfig;
use crate::rng::RandomSource;
use crate::telemetry::{EventPayload, EventType, TelemetryEvent, TelemetrySink};
use crate::types::{
    stable_sort_by_key, ClusterId, Result, SwarmError, UnitId, UnitRecord, UnitRole,
    MAX_CLUSTER_MEMBERS, MAX_UNITS,
};
use heapless::{FnvIndexMap, Vec};
use serde::{Deserialize, Serialize};

/// Member count at which a cluster operates in mesh mode
pub const MESH_MIN_MEMBERS: usize = 4;

/// Maximum clusters tracked by one manager
pub const MAX_CLUSTERS: usize = 16;

/// Maximum standby units in a backup pool
pub const MAX_STANDBY: usize = 16;

/// Battery level assumed for units that did not report one when building
/// a rotation schedule (sorts them last)
pub const ROTATION_DEFAULT_BATTERY: f32 = 100.0;

const ROLE_POOL: [UnitRole; 4] = [
    UnitRole::MeshEmitter,
    UnitRole::Scout,
    UnitRole::Relay,
    UnitRole::Observer,
];

/// Cluster operating mode, derived from member count.
///
/// Never stored: [`ClusterRecord::mode`] recomputes it so the invariant
/// holds after every membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterMode {
    /// Four or more members, full mesh coverage
    Mesh,
    /// Below mesh strength, reduced scanning pattern
    Scan,
}

/// Cluster lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStatus {
    /// Cluster is operating
    Active,
    /// Cluster is parked
    Inactive,
}

/// Geometric arrangement axis relative to wind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormationAxis {
    /// Leading edge
    Front,
    /// Trailing edge
    Rear,
    /// Left side
    Port,
    /// Right side
    Starboard,
    /// Stacked vertically
    Vertical,
    /// Perpendicular to the wind
    Crosswind,
}

/// Cluster formation geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    /// Yaw offset in degrees
    pub yaw_offset_deg: f32,
    /// Arrangement axis
    pub axis: FormationAxis,
}

impl Default for Formation {
    fn default() -> Self {
        Self {
            yaw_offset_deg: 0.0,
            axis: FormationAxis::Crosswind,
        }
    }
}

/// A cluster of units.
///
/// Member order is formation order; members leave only through
/// failure-reassignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Unique cluster identifier
    pub id: ClusterId,
    /// Members in formation order
    pub members: Vec<UnitRecord, MAX_CLUSTER_MEMBERS>,
    /// Lifecycle status
    pub status: ClusterStatus,
    /// Formation geometry
    pub formation: Formation,
}

impl ClusterRecord {
    /// Operating mode, recomputed from the current member count
    pub fn mode(&self) -> ClusterMode {
        if self.members.len() >= MESH_MIN_MEMBERS {
            ClusterMode::Mesh
        } else {
            ClusterMode::Scan
        }
    }

    /// Member ids in formation order
    pub fn member_ids(&self) -> Vec<UnitId, MAX_CLUSTER_MEMBERS> {
        let mut ids = Vec::new();
        for member in &self.members {
            ids.push(member.id.clone()).ok();
        }
        ids
    }
}

/// Manages cluster membership and unit assignment
#[derive(Debug)]
pub struct ClusterManager {
    /// Configuration
    config: SwarmConfig,
    /// Canonical cluster registry
    clusters: FnvIndexMap<ClusterId, ClusterRecord, MAX_CLUSTERS>,
}

impl ClusterManager {
    /// Create a manager with the given configuration
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            config,
            clusters: FnvIndexMap::new(),
        }
    }

    /// Create a manager with default configuration
    pub fn new_default() -> Self {
        Self::new(SwarmConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Assign a role to a unit.
    ///
    /// Priority zones always get a mesh emitter when the unit's battery is
    /// above the configured minimum (a missing battery report disqualifies
    /// it); otherwise the role comes uniformly from the injected random
    /// source. Always returns a role.
    pub fn assign_role<R: RandomSource>(
        &self,
        unit: &UnitRecord,
        zone_priority: bool,
        rng: &mut R,
    ) -> UnitRole {
        if zone_priority && unit.battery.unwrap_or(0.0) > self.config.priority_battery_min {
            return UnitRole::MeshEmitter;
        }
        ROLE_POOL[rng.next_index(ROLE_POOL.len())]
    }

    /// Form a new cluster from the given units.
    ///
    /// The cluster starts active with a neutral crosswind formation; its
    /// mode derives from the member count. The manager registers the
    /// cluster canonically and emits a status event.
    pub fn form_cluster<S: TelemetrySink>(
        &mut self,
        id: &str,
        units: &[UnitRecord],
        timestamp_ms: u64,
        sink: &mut S,
    ) -> Result<ClusterRecord> {
        let mut members: Vec<UnitRecord, MAX_CLUSTER_MEMBERS> = Vec::new();
        for unit in units {
            members
                .push(unit.clone())
                .map_err(|_| SwarmError::BufferFull)?;
        }
        let cluster = ClusterRecord {
            id: ClusterId::new(id),
            members,
            status: ClusterStatus::Active,
            formation: Formation::default(),
        };
        self.clusters
            .insert(cluster.id.clone(), cluster.clone())
            .map_err(|_| SwarmError::BufferFull)?;
        self.emit_cluster_status(&cluster, 0, timestamp_ms, sink);
        Ok(cluster)
    }

    /// Remove failed members from a cluster.
    ///
    /// Exactly the members with failed status are dropped; survivors keep
    /// their formation order. The mode recomputes from the new count, so a
    /// mesh cluster may demote to scan. An informational event reports the
    /// number removed (zero removals is not an error). Returns a fresh
    /// record with the same identity; the registry copy is updated. The
    /// cluster id must already be registered via [`Self::form_cluster`].
    pub fn reassign_after_failure<S: TelemetrySink>(
        &mut self,
        cluster: &ClusterRecord,
        timestamp_ms: u64,
        sink: &mut S,
    ) -> Result<ClusterRecord> {
        if !self.clusters.contains_key(&cluster.id) {
            return Err(SwarmError::UnknownCluster);
        }
        let mut survivors: Vec<UnitRecord, MAX_CLUSTER_MEMBERS> = Vec::new();
        for member in &cluster.members {
            if !member.is_failed() {
                survivors
                    .push(member.clone())
                    .map_err(|_| SwarmError::BufferFull)?;
            }
        }
        let removed = (cluster.members.len() - survivors.len()) as u32;
        let updated = ClusterRecord {
            id: cluster.id.clone(),
            members: survivors,
            status: cluster.status,
            formation: cluster.formation,
        };
        self.clusters
            .insert(updated.id.clone(), updated.clone())
            .map_err(|_| SwarmError::BufferFull)?;
        self.emit_cluster_status(&updated, removed, timestamp_ms, sink);
        Ok(updated)
    }

    /// Assign the last unit of the standby pool as backup for a cluster.
    ///
    /// An empty pool yields an explicit no-assignment, not an error; the
    /// event is emitted either way.
    pub fn assign_backup_unit<S: TelemetrySink>(
        &self,
        cluster_id: &ClusterId,
        standby: &mut Vec<UnitId, MAX_STANDBY>,
        timestamp_ms: u64,
        sink: &mut S,
    ) -> Option<UnitId> {
        let assigned = standby.pop();
        sink.emit(&TelemetryEvent::new(
            timestamp_ms,
            &self.config.origin,
            EventType::AssignBackupUnit,
            EventPayload::AssignBackupUnit {
                cluster_id: cluster_id.clone(),
                assigned: assigned.clone(),
            },
        ));
        assigned
    }

    /// Look up the canonical record for a cluster
    pub fn cluster(&self, id: &ClusterId) -> Result<&ClusterRecord> {
        self.clusters.get(id).ok_or(SwarmError::UnknownCluster)
    }

    /// Number of registered clusters
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    fn emit_cluster_status<S: TelemetrySink>(
        &self,
        cluster: &ClusterRecord,
        removed: u32,
        timestamp_ms: u64,
        sink: &mut S,
    ) {
        sink.emit(&TelemetryEvent::new(
            timestamp_ms,
            &self.config.origin,
            EventType::ClusterStatus,
            EventPayload::ClusterStatus {
                cluster_id: cluster.id.clone(),
                mode: cluster.mode(),
                status: cluster.status,
                member_count: cluster.members.len() as u32,
                removed,
            },
        ));
    }
}

/// Order units for recharge rotation, lowest battery first.
///
/// Stable ascending sort; units without a battery report sort as if at
/// [`ROTATION_DEFAULT_BATTERY`].
pub fn recommend_rotation_schedule(units: &[UnitRecord]) -> Result<Vec<UnitRecord, MAX_UNITS>> {
    let mut ordered: Vec<UnitRecord, MAX_UNITS> = Vec::new();
    for unit in units {
        ordered
            .push(unit.clone())
            .map_err(|_| SwarmError::BufferFull)?;
    }
    stable_sort_by_key(&mut ordered, |unit| {
        unit.battery.unwrap_or(ROTATION_DEFAULT_BATTERY)
    });
    Ok(ordered)
}

/// Overwrite a unit's desired angles, touching only the supplied fields.
///
/// Angles are stored as given; no range validation. Returns an updated
/// copy of the record.
pub fn apply_heading_bias(
    unit: &UnitRecord,
    heading_deg: Option<f32>,
    bank_deg: Option<f32>,
    aoa_deg: Option<f32>,
) -> UnitRecord {
    let mut updated = unit.clone();
    if let Some(heading) = heading_deg {
        updated.heading_deg = Some(heading);
    }
    if let Some(bank) = bank_deg {
        updated.bank_deg = Some(bank);
    }
    if let Some(aoa) = aoa_deg {
        updated.angle_of_attack_deg = Some(aoa);
    }
    updated
}
