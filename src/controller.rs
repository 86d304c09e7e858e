//! Swarm Decision Cycle
//!
//! Ties the stateless scoring/prioritization stages to the stateful
//! classifier and cluster manager. One cycle observes a single consistent
//! snapshot of unit state: score, prioritize, predict, then cluster
//! update, with no suspension mid-mutation. Classifier training is the
//! only expensive step and swaps the model wholesale, so cycles never see
//! a partially updated model.

use crate::classifier::{AdaptiveClassifier, FocusPrediction, TrainOutcome, TrainingRecord};
use crate::cluster_manager::{ClusterManager, ClusterRecord};
use crate::config::SwarmConfig;
use crate::rng::RandomSource;
use crate::targeting;
use crate::telemetry::TelemetrySink;
use crate::types::{
    Result, RiskScore, SwarmError, UnitRecord, ZoneReading, MAX_CLUSTER_MEMBERS, MAX_ZONES,
};
use core::fmt::Write as _;
use heapless::{String, Vec};

/// Per-zone outcome of one decision cycle
#[derive(Debug, Clone)]
pub struct FocusDecision {
    /// The zone reading
    pub reading: ZoneReading,
    /// Composite risk score
    pub score: RiskScore,
    /// Whether the score cleared the zoom threshold
    pub threshold_pass: bool,
    /// Classifier corroboration (or fallback rule result)
    pub prediction: FocusPrediction,
    /// Final focus decision: threshold pass corroborated by the classifier
    pub focus: bool,
}

/// Result of one decision cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Top-ranked zones with their decisions, highest risk first
    pub decisions: Vec<FocusDecision, MAX_ZONES>,
    /// Cluster formed for the highest-risk focus zone, if any
    pub cluster: Option<ClusterRecord>,
}

/// Coordinates the per-cycle data flow between scoring, classification
/// and cluster management
#[derive(Debug)]
pub struct SwarmController {
    config: SwarmConfig,
    classifier: AdaptiveClassifier,
    cluster_manager: ClusterManager,
    next_cluster_seq: u32,
}

impl SwarmController {
    /// Create a controller with the given configuration
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            cluster_manager: ClusterManager::new(config.clone()),
            classifier: AdaptiveClassifier::new_default(),
            config,
            next_cluster_seq: 1,
        }
    }

    /// Create a controller with default configuration
    pub fn new_default() -> Self {
        Self::new(SwarmConfig::default())
    }

    /// The adaptive classifier
    pub fn classifier(&self) -> &AdaptiveClassifier {
        &self.classifier
    }

    /// The cluster manager
    pub fn cluster_manager(&self) -> &ClusterManager {
        &self.cluster_manager
    }

    /// Mutable access to the cluster manager for failure handling
    pub fn cluster_manager_mut(&mut self) -> &mut ClusterManager {
        &mut self.cluster_manager
    }

    /// Train the classifier on historical outcome records
    pub fn train<R: RandomSource>(
        &mut self,
        dataset: &[TrainingRecord],
        rng: &mut R,
    ) -> Result<TrainOutcome> {
        self.classifier.train(dataset, rng)
    }

    /// Feed an observed focus outcome back into the classifier
    pub fn record_outcome<R: RandomSource>(
        &mut self,
        dataset: &[TrainingRecord],
        success: bool,
        rng: &mut R,
    ) -> Result<Option<TrainOutcome>> {
        self.classifier.retrain_on_outcome(dataset, success, rng)
    }

    /// Run one decision cycle.
    ///
    /// Readings are ranked by risk; each top zone passes through the
    /// threshold gate and the classifier, and a zone is focused only when
    /// both agree. For the highest-ranked focus zone, available units get
    /// priority roles and are formed into a cluster.
    pub fn decision_cycle<R: RandomSource, S: TelemetrySink>(
        &mut self,
        readings: &[ZoneReading],
        units: &[UnitRecord],
        timestamp_ms: u64,
        rng: &mut R,
        sink: &mut S,
    ) -> Result<CycleReport> {
        let ranked = targeting::prioritize(readings, self.config.top_n)?;

        let mut decisions: Vec<FocusDecision, MAX_ZONES> = Vec::new();
        for (reading, score) in ranked {
            let threshold_pass = score >= self.config.zoom_threshold;
            let prediction = self.classifier.predict_focus(&reading);
            let focus = threshold_pass && prediction.focus();
            decisions
                .push(FocusDecision {
                    reading,
                    score,
                    threshold_pass,
                    prediction,
                    focus,
                })
                .map_err(|_| SwarmError::BufferFull)?;
        }

        let mut cluster = None;
        if decisions.iter().any(|d| d.focus) {
            let mut assigned: Vec<UnitRecord, MAX_CLUSTER_MEMBERS> = Vec::new();
            for unit in units.iter().filter(|u| !u.is_failed()) {
                let role = self.cluster_manager.assign_role(unit, true, rng);
                let mut updated = unit.clone();
                updated.role = Some(role);
                if assigned.push(updated).is_err() {
                    break;
                }
            }
            let mut id: String<16> = String::new();
            write!(id, "FOCUS-{}", self.next_cluster_seq).ok();
            self.next_cluster_seq += 1;
            cluster = Some(self.cluster_manager.form_cluster(
                id.as_str(),
                &assigned,
                timestamp_ms,
                sink,
            )?);
        }

        Ok(CycleReport { decisions, cluster })
    }
}

impl Default for SwarmController {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;
    use crate::telemetry::{EventType, MemorySink};

    fn hot_zone() -> ZoneReading {
        ZoneReading::new(1.0, 1.0).with_sensors(4000.0, 0.0015, 1.0, 3.0, 1.0)
    }

    fn quiet_zone() -> ZoneReading {
        ZoneReading::new(2.0, 2.0).with_sensors(200.0, 0.0001, 0.1, 0.1, 0.0)
    }

    #[test]
    fn test_cycle_focuses_hot_zone_and_forms_cluster() {
        let mut controller = SwarmController::new_default();
        let mut rng = SplitMix64::new(1);
        let mut sink = MemorySink::new();
        let units = [
            UnitRecord::new("D1").with_battery(65.0),
            UnitRecord::new("D2").with_battery(40.0),
            UnitRecord::new("D3").with_battery(85.0),
            UnitRecord::new("D4").with_battery(55.0),
        ];
        let report = controller
            .decision_cycle(&[quiet_zone(), hot_zone()], &units, 0, &mut rng, &mut sink)
            .unwrap();

        assert_eq!(report.decisions[0].reading.coordinates, (1.0, 1.0));
        assert!(report.decisions[0].focus);
        assert!(report.decisions[0].prediction.used_fallback());
        let cluster = report.cluster.expect("cluster should form");
        assert_eq!(cluster.members.len(), 4);
        assert!(cluster.members.iter().all(|m| m.role.is_some()));
        assert_eq!(sink.count_of(EventType::ClusterStatus), 1);
    }

    #[test]
    fn test_cycle_without_focus_forms_no_cluster() {
        let mut controller = SwarmController::new_default();
        let mut rng = SplitMix64::new(1);
        let mut sink = MemorySink::new();
        let report = controller
            .decision_cycle(&[quiet_zone()], &[], 0, &mut rng, &mut sink)
            .unwrap();
        assert!(report.cluster.is_none());
        assert!(!report.decisions[0].focus);
        assert_eq!(sink.count_of(EventType::ClusterStatus), 0);
    }

    #[test]
    fn test_cycle_skips_failed_units() {
        let mut controller = SwarmController::new_default();
        let mut rng = SplitMix64::new(1);
        let mut sink = MemorySink::new();
        let units = [
            UnitRecord::new("D1").with_battery(65.0),
            UnitRecord::new("D2")
                .with_battery(80.0)
                .with_status(crate::types::UnitStatus::Failed),
        ];
        let report = controller
            .decision_cycle(&[hot_zone()], &units, 0, &mut rng, &mut sink)
            .unwrap();
        let cluster = report.cluster.unwrap();
        assert_eq!(cluster.members.len(), 1);
        assert_eq!(cluster.members[0].id.as_str(), "D1");
    }
}
