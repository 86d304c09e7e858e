//! Adaptive Focus Classifier
//!
//! Trains, serves and retrains a binary classifier over sensor and
//! orientation features to corroborate or override threshold-based focus
//! decisions. This is the only model state in the system with an
//! outcome-driven retrain cycle: a mismatched prediction feeds the same
//! dataset back into training, and the stored model is replaced wholesale
//! on every retrain so readers only ever observe a fully-old or fully-new
//! model.
//!
//! The model is a bagged ensemble of depth-limited decision trees with
//! gini splits, built over fixed-capacity pools. Feature extraction is a
//! single function applied identically at training and inference time;
//! any divergence there would silently skew predictions.

use crate::geometry::normalize_deg;
use crate::rng::RandomSource;
use crate::types::{AlignmentMode, Result, SwarmError, ZoneReading};
use heapless::Vec;
use libm::fabsf;
use serde::{Deserialize, Serialize};

/// Feature vector width: 5 sensor features plus 7 orientation features
pub const FEATURE_COUNT: usize = 12;

/// Maximum records per training set
pub const MAX_TRAINING_SAMPLES: usize = 256;

/// Maximum trees in an ensemble
pub const MAX_TREES: usize = 32;

/// Maximum nodes per tree (full tree at the default depth limit)
pub const MAX_TREE_NODES: usize = 128;

/// Feature vector for one zone reading
pub type FeatureVector = [f32; FEATURE_COUNT];

/// A labeled training record: a reading plus whether the predicted
/// outcome actually occurred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// The zone reading
    pub reading: ZoneReading,
    /// Binary outcome label
    pub outcome: bool,
}

/// Classifier configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Trees in the bagged ensemble
    pub tree_count: usize,
    /// Maximum tree depth
    pub max_depth: u8,
    /// Minimum samples required to attempt a split
    pub min_split: usize,
    /// Fallback rule: minimum CAPE for focus when untrained
    pub fallback_cape_min: f32,
    /// Fallback rule: minimum vorticity for focus when untrained
    pub fallback_vorticity_min: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tree_count: 20,
            max_depth: 6,
            min_split: 4,
            fallback_cape_min: 1500.0,
            fallback_vorticity_min: 0.0005,
        }
    }
}

/// Outcome of a training attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainOutcome {
    /// A new model was fitted and swapped in
    Trained {
        /// Accuracy on the 20% holdout partition; informational only
        holdout_accuracy: f32,
    },
    /// Fewer than 2 distinct labels; advisory skip, prior model retained
    SkippedLabelDiversity,
}

/// A focus prediction, carrying which path produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPrediction {
    /// Produced by the trained ensemble
    Model(bool),
    /// Produced by the fixed rule because no model is trained yet
    Fallback(bool),
}

impl FocusPrediction {
    /// The yes/no focus decision
    pub fn focus(&self) -> bool {
        match *self {
            FocusPrediction::Model(focus) | FocusPrediction::Fallback(focus) => focus,
        }
    }

    /// Whether the untrained fallback rule was used
    pub fn used_fallback(&self) -> bool {
        matches!(self, FocusPrediction::Fallback(_))
    }
}

/// Extract the feature vector for a reading.
///
/// Layout: the 5 raw sensor features, then heading normalized to [0, 1)
/// by degrees-mod-360 over 360, |bank|/30, |aoa|/15 and |yaw|/180 each
/// capped at 1, and a 3-slot one-hot for upwind/downwind/crosswind
/// alignment (all zero for `None`). Missing angle fields encode as 0.
pub fn extract_features(reading: &ZoneReading) -> FeatureVector {
    let mut features = [0.0f32; FEATURE_COUNT];
    features[..5].copy_from_slice(&reading.sensor_features());

    let meta = reading.angle_meta.unwrap_or_default();
    if let Some(heading) = meta.heading_deg {
        features[5] = normalize_deg(heading) / 360.0;
    }
    features[6] = (fabsf(meta.bank_deg.unwrap_or(0.0)) / 30.0).min(1.0);
    features[7] = (fabsf(meta.angle_of_attack_deg.unwrap_or(0.0)) / 15.0).min(1.0);
    features[8] = (fabsf(meta.formation_yaw_offset_deg.unwrap_or(0.0)) / 180.0).min(1.0);
    match meta.alignment_mode {
        AlignmentMode::Upwind => features[9] = 1.0,
        AlignmentMode::Downwind => features[10] = 1.0,
        AlignmentMode::Crosswind => features[11] = 1.0,
        AlignmentMode::None => {}
    }
    features
}

// ═══════════════════════════════════════════════════════════════════════════
// DECISION TREE
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        label: bool,
    },
    Split {
        feature: u8,
        threshold: f32,
        left: u8,
        right: u8,
    },
}

/// A single depth-limited binary decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<TreeNode, MAX_TREE_NODES>,
}

impl DecisionTree {
    fn fit(
        samples: &[FeatureVector],
        labels: &[bool],
        indices: &[u16],
        config: &ClassifierConfig,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(samples, labels, indices, 0, config);
        tree
    }

    fn build(
        &mut self,
        samples: &[FeatureVector],
        labels: &[bool],
        indices: &[u16],
        depth: u8,
        config: &ClassifierConfig,
    ) -> u8 {
        if self.nodes.is_full() {
            // Node pool exhausted; alias to the last node built.
            return (self.nodes.len() - 1) as u8;
        }

        let positives = indices.iter().filter(|&&i| labels[i as usize]).count();
        let majority = positives * 2 >= indices.len();
        let pure = positives == 0 || positives == indices.len();
        if pure
            || depth >= config.max_depth
            || indices.len() < config.min_split
            || self.nodes.len() + 2 >= MAX_TREE_NODES
        {
            return self.push_leaf(majority);
        }

        let Some((feature, threshold)) = best_split(samples, labels, indices) else {
            return self.push_leaf(majority);
        };

        let mut left: Vec<u16, MAX_TRAINING_SAMPLES> = Vec::new();
        let mut right: Vec<u16, MAX_TRAINING_SAMPLES> = Vec::new();
        for &i in indices {
            if samples[i as usize][feature] <= threshold {
                left.push(i).ok();
            } else {
                right.push(i).ok();
            }
        }

        // Reserve this node's slot before recursing so child indices land
        // after it.
        let slot = self.nodes.len();
        if self.nodes.push(TreeNode::Leaf { label: majority }).is_err() {
            return slot.saturating_sub(1) as u8;
        }
        let left_child = self.build(samples, labels, &left, depth + 1, config);
        let right_child = self.build(samples, labels, &right, depth + 1, config);
        self.nodes[slot] = TreeNode::Split {
            feature: feature as u8,
            threshold,
            left: left_child,
            right: right_child,
        };
        slot as u8
    }

    fn push_leaf(&mut self, label: bool) -> u8 {
        let index = self.nodes.len();
        if self.nodes.push(TreeNode::Leaf { label }).is_err() {
            return index.saturating_sub(1) as u8;
        }
        index as u8
    }

    fn predict(&self, features: &FeatureVector) -> bool {
        let mut index = 0usize;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { label }) => return *label,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if features[*feature as usize] <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                None => return false,
            }
        }
    }
}

fn gini(count: usize, positives: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let p = positives as f32 / count as f32;
    2.0 * p * (1.0 - p)
}

/// Find the (feature, threshold) pair minimizing weighted gini impurity,
/// or `None` when no candidate improves on the parent node.
fn best_split(
    samples: &[FeatureVector],
    labels: &[bool],
    indices: &[u16],
) -> Option<(usize, f32)> {
    let positives = indices.iter().filter(|&&i| labels[i as usize]).count();
    let parent = gini(indices.len(), positives);
    let stride = (indices.len() / 16).max(1);
    let mut best: Option<(usize, f32, f32)> = None;

    for feature in 0..FEATURE_COUNT {
        let mut k = 0;
        while k < indices.len() {
            let threshold = samples[indices[k] as usize][feature];
            let mut left = (0usize, 0usize);
            let mut right = (0usize, 0usize);
            for &i in indices {
                let side = if samples[i as usize][feature] <= threshold {
                    &mut left
                } else {
                    &mut right
                };
                side.0 += 1;
                if labels[i as usize] {
                    side.1 += 1;
                }
            }
            if left.0 != 0 && right.0 != 0 {
                let total = indices.len() as f32;
                let weighted = gini(left.0, left.1) * left.0 as f32 / total
                    + gini(right.0, right.1) * right.0 as f32 / total;
                let improves = match best {
                    None => weighted + 1e-6 < parent,
                    Some((_, _, best_impurity)) => weighted < best_impurity,
                };
                if improves {
                    best = Some((feature, threshold, weighted));
                }
            }
            k += stride;
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

// ═══════════════════════════════════════════════════════════════════════════
// BAGGED ENSEMBLE
// ═══════════════════════════════════════════════════════════════════════════

/// Bagged ensemble of decision trees, majority vote
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BaggedForest {
    trees: Vec<DecisionTree, MAX_TREES>,
}

impl BaggedForest {
    fn fit<R: RandomSource>(
        samples: &[FeatureVector],
        labels: &[bool],
        train_indices: &[u16],
        config: &ClassifierConfig,
        rng: &mut R,
    ) -> Self {
        let mut trees: Vec<DecisionTree, MAX_TREES> = Vec::new();
        for _ in 0..config.tree_count.min(MAX_TREES) {
            // Bootstrap: sample with replacement from the training
            // partition.
            let mut bootstrap: Vec<u16, MAX_TRAINING_SAMPLES> = Vec::new();
            for _ in 0..train_indices.len() {
                bootstrap
                    .push(train_indices[rng.next_index(train_indices.len())])
                    .ok();
            }
            trees
                .push(DecisionTree::fit(samples, labels, &bootstrap, config))
                .ok();
        }
        Self { trees }
    }

    fn predict(&self, features: &FeatureVector) -> bool {
        let votes = self.trees.iter().filter(|t| t.predict(features)).count();
        votes * 2 > self.trees.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ADAPTIVE CLASSIFIER
// ═══════════════════════════════════════════════════════════════════════════

/// Adaptive binary classifier gating focus decisions
#[derive(Debug)]
pub struct AdaptiveClassifier {
    /// Configuration
    config: ClassifierConfig,
    /// Current model; `None` until the first successful training
    model: Option<BaggedForest>,
    /// Holdout accuracy from the last successful training
    last_holdout_accuracy: Option<f32>,
}

impl AdaptiveClassifier {
    /// Create an untrained classifier
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            model: None,
            last_holdout_accuracy: None,
        }
    }

    /// Create an untrained classifier with default configuration
    pub fn new_default() -> Self {
        Self::new(ClassifierConfig::default())
    }

    /// Whether a model has been trained
    pub fn trained(&self) -> bool {
        self.model.is_some()
    }

    /// Holdout accuracy reported by the last successful training
    pub fn last_holdout_accuracy(&self) -> Option<f32> {
        self.last_holdout_accuracy
    }

    /// Train a new model from the dataset.
    ///
    /// With fewer than 2 distinct labels this is an advisory skip: the
    /// prior model (if any) is retained untouched. Otherwise the dataset
    /// is shuffled into an 80/20 holdout split, an ensemble is fitted on
    /// the training partition, holdout accuracy is measured
    /// (informational, never enforced) and the stored model is replaced
    /// wholesale.
    pub fn train<R: RandomSource>(
        &mut self,
        dataset: &[TrainingRecord],
        rng: &mut R,
    ) -> Result<TrainOutcome> {
        let mut samples: Vec<FeatureVector, MAX_TRAINING_SAMPLES> = Vec::new();
        let mut labels: Vec<bool, MAX_TRAINING_SAMPLES> = Vec::new();
        for record in dataset {
            samples
                .push(extract_features(&record.reading))
                .map_err(|_| SwarmError::BufferFull)?;
            labels.push(record.outcome).map_err(|_| SwarmError::BufferFull)?;
        }

        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Ok(TrainOutcome::SkippedLabelDiversity);
        }

        let mut order: Vec<u16, MAX_TRAINING_SAMPLES> = Vec::new();
        for i in 0..samples.len() {
            order.push(i as u16).map_err(|_| SwarmError::BufferFull)?;
        }
        for i in (1..order.len()).rev() {
            let j = rng.next_index(i + 1);
            order.swap(i, j);
        }
        let holdout = (order.len() / 5).max(1);
        let (validation, training) = order.split_at(holdout);

        let forest = BaggedForest::fit(&samples, &labels, training, &self.config, rng);
        let correct = validation
            .iter()
            .filter(|&&i| forest.predict(&samples[i as usize]) == labels[i as usize])
            .count();
        let holdout_accuracy = correct as f32 / validation.len() as f32;

        self.model = Some(forest);
        self.last_holdout_accuracy = Some(holdout_accuracy);
        Ok(TrainOutcome::Trained { holdout_accuracy })
    }

    /// Predict whether a zone merits focus.
    ///
    /// Untrained classifiers fall back to the fixed rule (CAPE and
    /// vorticity both above their minimums); the returned variant records
    /// which path was taken.
    pub fn predict_focus(&self, reading: &ZoneReading) -> FocusPrediction {
        match &self.model {
            Some(forest) => FocusPrediction::Model(forest.predict(&extract_features(reading))),
            None => FocusPrediction::Fallback(
                reading.cape > self.config.fallback_cape_min
                    && reading.vorticity > self.config.fallback_vorticity_min,
            ),
        }
    }

    /// Close the feedback loop on an observed outcome.
    ///
    /// A matched prediction leaves model state untouched (`Ok(None)`); a
    /// mismatch retrains on the dataset.
    pub fn retrain_on_outcome<R: RandomSource>(
        &mut self,
        dataset: &[TrainingRecord],
        success: bool,
        rng: &mut R,
    ) -> Result<Option<TrainOutcome>> {
        if success {
            return Ok(None);
        }
        self.train(dataset, rng).map(Some)
    }
}

impl Default for AdaptiveClassifier {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;
    use crate::types::AngleMeta;

    fn hot_reading() -> ZoneReading {
        ZoneReading::new(0.0, 0.0).with_sensors(3800.0, 0.0014, 0.95, 2.8, 0.9)
    }

    fn quiet_reading() -> ZoneReading {
        ZoneReading::new(0.0, 0.0).with_sensors(400.0, 0.0001, 0.2, 0.1, 0.05)
    }

    fn separable_dataset(n: usize) -> std::vec::Vec<TrainingRecord> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    TrainingRecord {
                        reading: hot_reading(),
                        outcome: true,
                    }
                } else {
                    TrainingRecord {
                        reading: quiet_reading(),
                        outcome: false,
                    }
                }
            })
            .collect()
    }

    #[test]
    fn test_feature_vector_layout() {
        let meta = AngleMeta {
            heading_deg: Some(540.0),
            bank_deg: Some(-15.0),
            angle_of_attack_deg: Some(30.0),
            formation_yaw_offset_deg: Some(90.0),
            alignment_mode: AlignmentMode::Downwind,
        };
        let reading = ZoneReading::new(0.0, 0.0)
            .with_sensors(2000.0, 0.001, 0.8, 1.5, 0.5)
            .with_angle_meta(meta);
        let f = extract_features(&reading);
        assert_eq!(&f[..5], &[2000.0, 0.001, 0.8, 1.5, 0.5]);
        assert_eq!(f[5], 0.5); // 540 mod 360 = 180, /360
        assert_eq!(f[6], 0.5); // |-15|/30
        assert_eq!(f[7], 1.0); // 30/15 capped
        assert_eq!(f[8], 0.5); // 90/180
        assert_eq!(&f[9..], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_angles_encode_as_zero() {
        let f = extract_features(&quiet_reading());
        assert_eq!(&f[5..], &[0.0; 7]);
    }

    #[test]
    fn test_untrained_uses_fallback_rule() {
        let classifier = AdaptiveClassifier::new_default();
        assert!(!classifier.trained());

        let hot = ZoneReading::new(0.0, 0.0).with_sensors(1600.0, 0.0006, 0.0, 0.0, 0.0);
        let prediction = classifier.predict_focus(&hot);
        assert!(prediction.used_fallback());
        assert!(prediction.focus());

        let cape_only = ZoneReading::new(0.0, 0.0).with_sensors(1600.0, 0.0004, 0.0, 0.0, 0.0);
        assert!(!classifier.predict_focus(&cape_only).focus());

        let vorticity_only = ZoneReading::new(0.0, 0.0).with_sensors(1400.0, 0.0006, 0.0, 0.0, 0.0);
        assert!(!classifier.predict_focus(&vorticity_only).focus());
    }

    #[test]
    fn test_single_class_dataset_skips_training() {
        let mut classifier = AdaptiveClassifier::new_default();
        let mut rng = SplitMix64::new(5);
        let dataset: std::vec::Vec<TrainingRecord> = (0..10)
            .map(|_| TrainingRecord {
                reading: hot_reading(),
                outcome: true,
            })
            .collect();
        let outcome = classifier.train(&dataset, &mut rng).unwrap();
        assert_eq!(outcome, TrainOutcome::SkippedLabelDiversity);
        assert!(!classifier.trained());
    }

    #[test]
    fn test_training_on_separable_data() {
        let mut classifier = AdaptiveClassifier::new_default();
        let mut rng = SplitMix64::new(11);
        let outcome = classifier.train(&separable_dataset(40), &mut rng).unwrap();
        let TrainOutcome::Trained { holdout_accuracy } = outcome else {
            panic!("expected a trained model");
        };
        assert!(classifier.trained());
        assert_eq!(classifier.last_holdout_accuracy(), Some(holdout_accuracy));
        // perfectly separable data should validate perfectly
        assert_eq!(holdout_accuracy, 1.0);

        let prediction = classifier.predict_focus(&hot_reading());
        assert!(!prediction.used_fallback());
        assert!(prediction.focus());
        assert!(!classifier.predict_focus(&quiet_reading()).focus());
    }

    #[test]
    fn test_retrain_on_success_is_noop() {
        let mut classifier = AdaptiveClassifier::new_default();
        let mut rng = SplitMix64::new(21);
        let dataset = separable_dataset(40);
        classifier.train(&dataset, &mut rng).unwrap();
        let accuracy_before = classifier.last_holdout_accuracy();
        let result = classifier
            .retrain_on_outcome(&dataset, true, &mut rng)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(classifier.last_holdout_accuracy(), accuracy_before);
    }

    #[test]
    fn test_retrain_on_failure_trains() {
        let mut classifier = AdaptiveClassifier::new_default();
        let mut rng = SplitMix64::new(31);
        let result = classifier
            .retrain_on_outcome(&separable_dataset(40), false, &mut rng)
            .unwrap();
        assert!(matches!(result, Some(TrainOutcome::Trained { .. })));
        assert!(classifier.trained());
    }

    #[test]
    fn test_oversized_dataset_rejected() {
        let mut classifier = AdaptiveClassifier::new_default();
        let mut rng = SplitMix64::new(41);
        let dataset = separable_dataset(MAX_TRAINING_SAMPLES + 1);
        assert_eq!(
            classifier.train(&dataset, &mut rng),
            Err(SwarmError::BufferFull)
        );
    }
}
