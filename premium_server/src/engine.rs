use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use ndarray::{Array2, ArrayView1, ArrayView2};
use premium_features::schema::feature_names;
use premium_features::{FeatureVector, NUM_FEATURES};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelLoadError};

const ARTIFACT_MAGIC: [u8; 8] = *b"PREMFRST";
const ARTIFACT_VERSION: u32 = 1;

/// A fitted expense regressor. Read-only once loaded, shared across requests.
pub trait PremiumModel: Send + Sync {
    /// One expense estimate per input row. Rows are in `FEATURE_SCHEMA` order.
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError>;

    fn name(&self) -> &str;
}

/// Stack feature vectors into an `n x NUM_FEATURES` model input.
pub fn to_rows(features: &[FeatureVector]) -> Array2<f64> {
    Array2::from_shape_fn((features.len(), NUM_FEATURES), |(row, col)| {
        features[row].as_slice()[col]
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Rows with `x[feature] <= threshold` continue at `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Flattened binary tree; node 0 is the root and children always come after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn new(nodes: Vec<Node>) -> Result<Self, ModelLoadError> {
        let tree = Self { nodes };
        tree.validate()?;
        Ok(tree)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::Malformed("tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= NUM_FEATURES {
                        return Err(ModelLoadError::Malformed(format!(
                            "node {index} splits on feature {feature}, only {NUM_FEATURES} exist"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelLoadError::Malformed(format!(
                            "node {index} has non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelLoadError::Malformed(format!(
                                "node {index} points to invalid child {child}"
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelLoadError::Malformed(format!(
                            "leaf {index} has non-finite value"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ArtifactHeader {
    magic: [u8; 8],
    format_version: u32,
}

#[derive(Serialize, Deserialize)]
struct ArtifactBody {
    feature_names: Vec<String>,
    trees: Vec<RegressionTree>,
}

/// Averaging ensemble of regression trees.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestModel {
    trees: Vec<RegressionTree>,
}

impl ForestModel {
    pub fn from_trees(trees: Vec<RegressionTree>) -> Result<Self, ModelLoadError> {
        if trees.is_empty() {
            return Err(ModelLoadError::Malformed("forest has no trees".to_string()));
        }
        Ok(Self { trees })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let header: ArtifactHeader = bincode::deserialize_from(&mut reader)?;
        if header.magic != ARTIFACT_MAGIC {
            return Err(ModelLoadError::BadMagic);
        }
        if header.format_version != ARTIFACT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion(header.format_version));
        }

        let body: ArtifactBody = bincode::deserialize_from(&mut reader)?;
        let expected = feature_names();
        if body.feature_names != expected {
            return Err(ModelLoadError::SchemaMismatch {
                expected,
                found: body.feature_names,
            });
        }

        for tree in &body.trees {
            tree.validate()?;
        }
        let model = Self::from_trees(body.trees)?;

        info!(
            "Loaded premium model from {} ({} trees)",
            path.display(),
            model.tree_count()
        );
        Ok(model)
    }

    /// Write the model in the artifact format `load` reads.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), bincode::Error> {
        write_artifact(path.as_ref(), feature_names(), &self.trees)
    }
}

fn write_artifact(
    path: &Path,
    feature_names: Vec<String>,
    trees: &[RegressionTree],
) -> Result<(), bincode::Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    let header = ArtifactHeader {
        magic: ARTIFACT_MAGIC,
        format_version: ARTIFACT_VERSION,
    };
    let body = ArtifactBody {
        feature_names,
        trees: trees.to_vec(),
    };

    bincode::serialize_into(&mut writer, &header)?;
    bincode::serialize_into(&mut writer, &body)?;
    writer.flush()?;
    Ok(())
}

pub fn load_model(path: impl AsRef<Path>) -> Result<ForestModel, ModelLoadError> {
    ForestModel::load(path)
}

impl PremiumModel for ForestModel {
    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<f64>, ModelError> {
        if rows.ncols() != NUM_FEATURES {
            return Err(ModelError::InvalidFeatureVector(format!(
                "expected {NUM_FEATURES} features per row, got {}",
                rows.ncols()
            )));
        }

        rows.rows()
            .into_iter()
            .map(|row| {
                if let Some(col) = row.iter().position(|v| !v.is_finite()) {
                    return Err(ModelError::InvalidFeatureVector(format!(
                        "non-finite value in column {col}"
                    )));
                }

                let total: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
                let estimate = total / self.trees.len() as f64;
                if !estimate.is_finite() {
                    return Err(ModelError::Inference(
                        "expense estimate overflowed".to_string(),
                    ));
                }
                Ok(estimate)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use premium_features::Feature;

    fn split(feature: Feature, threshold: f64, left: usize, right: usize) -> Node {
        Node::Split {
            feature: feature.column(),
            threshold,
            left,
            right,
        }
    }

    fn leaf(value: f64) -> Node {
        Node::Leaf { value }
    }

    fn sample_forest() -> ForestModel {
        let by_age =
            RegressionTree::new(vec![split(Feature::Age, 30.0, 1, 2), leaf(1000.0), leaf(3000.0)])
                .unwrap();
        let by_smoker = RegressionTree::new(vec![
            split(Feature::Smoker, 0.5, 1, 2),
            leaf(2000.0),
            leaf(20000.0),
        ])
        .unwrap();
        ForestModel::from_trees(vec![by_age, by_smoker]).unwrap()
    }

    #[test]
    fn test_forest_averages_trees() {
        let model = sample_forest();
        let rows = array![[19.0, 1.0, 27.9, 0.0, 0.0], [45.0, 0.0, 30.0, 2.0, 1.0]];

        let estimates = model.predict(rows.view()).unwrap();
        assert_eq!(estimates, vec![1500.0, 11500.0]);
    }

    #[test]
    fn test_threshold_goes_left() {
        let model = sample_forest();
        let rows = array![[30.0, 1.0, 27.9, 0.0, 0.5]];
        assert_eq!(model.predict(rows.view()).unwrap(), vec![1500.0]);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let model = sample_forest();
        let rows = array![[19.0, 1.0, 27.9, 0.0]];
        assert!(matches!(
            model.predict(rows.view()),
            Err(ModelError::InvalidFeatureVector(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_feature() {
        let model = sample_forest();
        let rows = array![[19.0, 1.0, f64::NAN, 0.0, 0.0]];
        assert!(matches!(
            model.predict(rows.view()),
            Err(ModelError::InvalidFeatureVector(_))
        ));
    }

    #[test]
    fn test_overflowing_estimate_is_inference_error() {
        let huge = RegressionTree::new(vec![leaf(f64::MAX)]).unwrap();
        let model = ForestModel::from_trees(vec![huge.clone(), huge]).unwrap();
        let rows = array![[19.0, 1.0, 27.9, 0.0, 0.0]];
        assert!(matches!(
            model.predict(rows.view()),
            Err(ModelError::Inference(_))
        ));
    }

    #[test]
    fn test_to_rows_keeps_schema_order() {
        let vector = FeatureVector::assemble(|feature| feature.column() as f64 + 1.0);
        let rows = to_rows(&[vector]);
        assert_eq!(rows.dim(), (1, NUM_FEATURES));
        assert_eq!(rows.row(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_save_and_load_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_model.bin");
        let model = sample_forest();

        model.save(&path).unwrap();
        let loaded = load_model(&path).unwrap();

        assert_eq!(loaded, model);
        assert_eq!(loaded.tree_count(), 2);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_model(dir.path().join("absent.bin")),
            Err(ModelLoadError::Io { .. })
        ));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_model.joblib");
        std::fs::write(&path, b"\x80\x04\x95 definitely not ours").unwrap();

        assert!(matches!(
            load_model(&path),
            Err(ModelLoadError::BadMagic) | Err(ModelLoadError::Decode(_))
        ));
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_model.bin");
        let reordered = ["age", "sex", "children", "bmi", "smoker"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        write_artifact(&path, reordered, &sample_forest().trees).unwrap();

        assert!(matches!(
            load_model(&path),
            Err(ModelLoadError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_trees_are_rejected() {
        let backwards = vec![split(Feature::Age, 30.0, 0, 1), leaf(1.0)];
        let out_of_bounds = vec![split(Feature::Age, 30.0, 1, 5), leaf(1.0)];
        let bad_feature = vec![
            Node::Split {
                feature: NUM_FEATURES,
                threshold: 1.0,
                left: 1,
                right: 2,
            },
            leaf(1.0),
            leaf(2.0),
        ];
        let bad_threshold = vec![split(Feature::Bmi, f64::INFINITY, 1, 2), leaf(1.0), leaf(2.0)];

        for nodes in [vec![], backwards, out_of_bounds, bad_feature, bad_threshold] {
            assert!(matches!(
                RegressionTree::new(nodes),
                Err(ModelLoadError::Malformed(_))
            ));
        }
        assert!(matches!(
            ForestModel::from_trees(vec![]),
            Err(ModelLoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_unvalidated_tree_in_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("premium_model.bin");
        let cyclic = RegressionTree {
            nodes: vec![split(Feature::Age, 30.0, 0, 0)],
        };
        write_artifact(&path, feature_names(), &[cyclic]).unwrap();

        assert!(matches!(
            load_model(&path),
            Err(ModelLoadError::Malformed(_))
        ));
    }
}
