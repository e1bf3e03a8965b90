//! Classifier pipelines: the `RiskModel` trait, the tree artifacts that
//! implement it and the `ModelSet` context handed to report assembly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vitals_core::{ReportRow, RiskAxis, RiskLabel, VitalReading, VitalsError, FEATURE_COLUMNS};

/// A trained classifier paired with its label decoder.
pub trait RiskModel {
    /// Class code for one feature vector.
    fn predict(&self, features: &[f64; 5]) -> Result<usize, VitalsError>;

    /// Human-readable label for a class code.
    fn decode(&self, code: usize) -> Result<String, VitalsError>;

    fn label(&self, features: &[f64; 5]) -> Result<RiskLabel, VitalsError> {
        let code = self.predict(features)?;
        self.decode(code).map(RiskLabel::from)
    }
}

/// The three pipelines a report needs, loaded once and only read afterwards.
pub struct ModelSet {
    stress: Box<dyn RiskModel>,
    cardio_respiratory: Box<dyn RiskModel>,
    fever: Box<dyn RiskModel>,
}

impl ModelSet {
    pub fn new(
        stress: Box<dyn RiskModel>,
        cardio_respiratory: Box<dyn RiskModel>,
        fever: Box<dyn RiskModel>,
    ) -> Self {
        Self {
            stress,
            cardio_respiratory,
            fever,
        }
    }

    pub fn model(&self, axis: RiskAxis) -> &dyn RiskModel {
        match axis {
            RiskAxis::Stress => self.stress.as_ref(),
            RiskAxis::CardioRespiratory => self.cardio_respiratory.as_ref(),
            RiskAxis::Fever => self.fever.as_ref(),
        }
    }

    /// Run all three pipelines on the same feature vector.
    pub fn predict_row(&self, reading: &VitalReading) -> Result<ReportRow, VitalsError> {
        let features = reading.features();
        let label_for = |axis: RiskAxis| -> Result<RiskLabel, VitalsError> {
            let label = self
                .model(axis)
                .label(&features)
                .map_err(|err| VitalsError::Model {
                    axis,
                    message: err.to_string(),
                })?;
            debug!(%axis, label = label.as_str(), tier = %label.tier(), "decoded prediction");
            Ok(label)
        };

        Ok(ReportRow {
            reading: *reading,
            stress: label_for(RiskAxis::Stress)?,
            cardio_respiratory: label_for(RiskAxis::CardioRespiratory)?,
            fever: label_for(RiskAxis::Fever)?,
        })
    }
}

impl From<ModelBundle> for ModelSet {
    fn from(bundle: ModelBundle) -> Self {
        ModelSet::new(
            Box::new(bundle.stress),
            Box::new(bundle.cardio),
            Box::new(bundle.fever),
        )
    }
}

/// One node of a flattened decision tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TreeNode {
    /// Samples with `features[feature] <= threshold` go to `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

/// Decision tree stored as a node array rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn predict(&self, features: &[f64; 5]) -> Result<usize, VitalsError> {
        let mut index = 0;
        // Children always sit after their parent, so this visits each node at most once.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        VitalsError::InvalidArtifact(format!("feature index {feature} out of range"))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(VitalsError::InvalidArtifact(format!(
            "tree walk left the node array at index {index}"
        )))
    }

    /// Structural checks: non-empty, in-range features, forward-only children.
    pub fn validate(&self) -> Result<(), VitalsError> {
        if self.nodes.is_empty() {
            return Err(VitalsError::InvalidArtifact("tree has no nodes".into()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= FEATURE_COLUMNS.len() {
                    return Err(VitalsError::InvalidArtifact(format!(
                        "node {index} splits on feature {feature}, only {} exist",
                        FEATURE_COLUMNS.len()
                    )));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(VitalsError::InvalidArtifact(format!(
                            "node {index} points to invalid child {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn max_class(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Leaf { class } => Some(*class),
                TreeNode::Split { .. } => None,
            })
            .max()
    }
}

/// Serialized classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    DecisionTree(DecisionTree),
    /// Majority vote; ties go to the smallest class code.
    RandomForest { trees: Vec<DecisionTree> },
}

impl ModelArtifact {
    pub fn predict(&self, features: &[f64; 5]) -> Result<usize, VitalsError> {
        match self {
            ModelArtifact::DecisionTree(tree) => tree.predict(features),
            ModelArtifact::RandomForest { trees } => {
                let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
                for tree in trees {
                    *votes.entry(tree.predict(features)?).or_default() += 1;
                }
                let mut winner: Option<(usize, usize)> = None;
                for (class, count) in votes {
                    if winner.map_or(true, |(_, best)| count > best) {
                        winner = Some((class, count));
                    }
                }
                winner
                    .map(|(class, _)| class)
                    .ok_or_else(|| VitalsError::InvalidArtifact("forest has no trees".into()))
            }
        }
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        match self {
            ModelArtifact::DecisionTree(tree) => tree.validate(),
            ModelArtifact::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(VitalsError::InvalidArtifact("forest has no trees".into()));
                }
                trees.iter().try_for_each(DecisionTree::validate)
            }
        }
    }

    fn max_class(&self) -> Option<usize> {
        match self {
            ModelArtifact::DecisionTree(tree) => tree.max_class(),
            ModelArtifact::RandomForest { trees } => {
                trees.iter().filter_map(DecisionTree::max_class).max()
            }
        }
    }
}

/// Maps class codes back to the label strings the model was trained on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn decode(&self, code: usize) -> Result<String, VitalsError> {
        self.classes
            .get(code)
            .cloned()
            .ok_or(VitalsError::UnknownLabel {
                code,
                classes: self.classes.len(),
            })
    }
}

/// Classifier plus decoder for one axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineArtifact {
    pub model: ModelArtifact,
    pub encoder: LabelEncoder,
}

impl PipelineArtifact {
    /// Also checks that every leaf class has a label.
    pub fn validate(&self) -> Result<(), VitalsError> {
        self.model.validate()?;
        if self.encoder.classes.is_empty() {
            return Err(VitalsError::InvalidArtifact(
                "label encoder has no classes".into(),
            ));
        }
        if let Some(max) = self.model.max_class() {
            if max >= self.encoder.classes.len() {
                return Err(VitalsError::InvalidArtifact(format!(
                    "model emits class {max} but encoder knows {} classes",
                    self.encoder.classes.len()
                )));
            }
        }
        Ok(())
    }
}

impl RiskModel for PipelineArtifact {
    fn predict(&self, features: &[f64; 5]) -> Result<usize, VitalsError> {
        self.model.predict(features)
    }

    fn decode(&self, code: usize) -> Result<String, VitalsError> {
        self.encoder.decode(code)
    }
}

/// All three pipelines as stored on disk or passed in from JavaScript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelBundle {
    pub stress: PipelineArtifact,
    pub cardio: PipelineArtifact,
    pub fever: PipelineArtifact,
}

impl ModelBundle {
    pub fn from_json_str(json: &str) -> Result<Self, VitalsError> {
        let bundle: ModelBundle =
            serde_json::from_str(json).map_err(|err| VitalsError::Parse(err.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Load a single bundle file, or a directory of per-axis files.
    pub fn load(path: &Path) -> Result<Self, VitalsError> {
        if path.is_dir() {
            return Self::load_dir(path);
        }
        let json = read_file(path)?;
        let bundle = Self::from_json_str(&json)?;
        info!(path = %path.display(), "loaded model bundle");
        Ok(bundle)
    }

    /// Expects `{stem}_model.json` and `label_encoder_{stem}.json` per axis.
    pub fn load_dir(dir: &Path) -> Result<Self, VitalsError> {
        let load_axis = |axis: RiskAxis| -> Result<PipelineArtifact, VitalsError> {
            let model_path = dir.join(format!("{}_model.json", axis.stem()));
            let encoder_path = dir.join(format!("label_encoder_{}.json", axis.stem()));
            let model: ModelArtifact = parse_file(&model_path)?;
            let encoder: LabelEncoder = parse_file(&encoder_path)?;
            debug!(%axis, classes = encoder.classes.len(), "loaded pipeline");
            Ok(PipelineArtifact { model, encoder })
        };

        let bundle = ModelBundle {
            stress: load_axis(RiskAxis::Stress)?,
            cardio: load_axis(RiskAxis::CardioRespiratory)?,
            fever: load_axis(RiskAxis::Fever)?,
        };
        bundle.validate()?;
        info!(dir = %dir.display(), "loaded model directory");
        Ok(bundle)
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        for (axis, pipeline) in [
            (RiskAxis::Stress, &self.stress),
            (RiskAxis::CardioRespiratory, &self.cardio),
            (RiskAxis::Fever, &self.fever),
        ] {
            pipeline.validate().map_err(|err| VitalsError::Model {
                axis,
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String, VitalsError> {
    fs::read_to_string(path).map_err(|err| VitalsError::Io(format!("{}: {err}", path.display())))
}

fn parse_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, VitalsError> {
    let json = read_file(path)?;
    serde_json::from_str(&json)
        .map_err(|err| VitalsError::Parse(format!("{}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    fn fever_tree() -> DecisionTree {
        // Temperature <= 37.5 -> class 1, else (<= 38.5 -> 2, else 0).
        DecisionTree {
            nodes: vec![
                split(4, 37.5, 1, 2),
                TreeNode::Leaf { class: 1 },
                split(4, 38.5, 3, 4),
                TreeNode::Leaf { class: 2 },
                TreeNode::Leaf { class: 0 },
            ],
        }
    }

    #[test]
    fn tree_walks_thresholds_inclusively() {
        let tree = fever_tree();
        assert_eq!(tree.predict(&[75.0, 50.0, 98.0, 16.0, 37.5]).unwrap(), 1);
        assert_eq!(tree.predict(&[75.0, 50.0, 98.0, 16.0, 38.0]).unwrap(), 2);
        assert_eq!(tree.predict(&[75.0, 50.0, 98.0, 16.0, 39.4]).unwrap(), 0);
    }

    #[test]
    fn forest_takes_majority_and_breaks_ties_low() {
        let constant = |class| DecisionTree {
            nodes: vec![TreeNode::Leaf { class }],
        };
        let features = [0.0; 5];

        let forest = ModelArtifact::RandomForest {
            trees: vec![constant(2), constant(1), constant(2)],
        };
        assert_eq!(forest.predict(&features).unwrap(), 2);

        let tied = ModelArtifact::RandomForest {
            trees: vec![constant(2), constant(1)],
        };
        assert_eq!(tied.predict(&features).unwrap(), 1);
    }

    #[test]
    fn validation_rejects_backward_and_dangling_children() {
        let backward = DecisionTree {
            nodes: vec![split(0, 1.0, 0, 1), TreeNode::Leaf { class: 0 }],
        };
        assert!(backward.validate().is_err());

        let dangling = DecisionTree {
            nodes: vec![split(0, 1.0, 1, 7), TreeNode::Leaf { class: 0 }],
        };
        assert!(dangling.validate().is_err());

        let bad_feature = DecisionTree {
            nodes: vec![
                split(5, 1.0, 1, 2),
                TreeNode::Leaf { class: 0 },
                TreeNode::Leaf { class: 1 },
            ],
        };
        assert!(bad_feature.validate().is_err());
        assert!(fever_tree().validate().is_ok());
    }

    #[test]
    fn encoder_rejects_unseen_codes() {
        let encoder = LabelEncoder {
            classes: vec!["High".into(), "Low".into(), "Medium".into()],
        };
        assert_eq!(encoder.decode(2).unwrap(), "Medium");
        assert!(matches!(
            encoder.decode(3),
            Err(VitalsError::UnknownLabel {
                code: 3,
                classes: 3
            })
        ));
    }

    #[test]
    fn pipeline_needs_a_label_for_every_leaf() {
        let pipeline = PipelineArtifact {
            model: ModelArtifact::DecisionTree(fever_tree()),
            encoder: LabelEncoder {
                classes: vec!["High".into(), "Low".into()],
            },
        };
        assert!(matches!(
            pipeline.validate(),
            Err(VitalsError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn artifact_json_is_tagged_by_kind() {
        let json = r#"{
            "kind": "decision_tree",
            "nodes": [
                {"feature": 2, "threshold": 92.0, "left": 1, "right": 2},
                {"class": 0},
                {"class": 1}
            ]
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.predict(&[80.0, 40.0, 90.0, 20.0, 37.0]).unwrap(), 0);
        assert_eq!(artifact.predict(&[80.0, 40.0, 97.0, 20.0, 37.0]).unwrap(), 1);
    }
}
