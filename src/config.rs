//! Whole-pipeline configuration
//!
//! One serde document covering preprocessing, splitting and training, so a
//! run can be described in a single JSON file:
//!
//! ```json
//! {
//!   "preprocessing": { "steps": [{ "type": "scale", "method": "standardize", "columns": ["age"] }] },
//!   "split": { "test_fraction": 0.2, "seed": 42 },
//!   "training": {
//!     "model_type": "random_forest",
//!     "task_type": "classification",
//!     "target_column": "label",
//!     "feature_columns": ["age_scaled", "income"]
//!   }
//! }
//! ```

use crate::error::Result;
use crate::preprocessing::PreprocessingConfig;
use crate::split::SplitConfig;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub split: SplitConfig,
    pub training: TrainingConfig,
}

impl PipelineConfig {
    pub fn new(training: TrainingConfig) -> Self {
        Self {
            preprocessing: PreprocessingConfig::default(),
            split: SplitConfig::default(),
            training,
        }
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Reject invalid configuration before any data is touched
    pub fn validate(&self) -> Result<()> {
        self.preprocessing.validate()?;
        self.split.validate()?;
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TabulaError;
    use crate::training::ModelType;

    const CONFIG: &str = r#"{
        "preprocessing": {
            "steps": [
                {"type": "missing_values", "rules": [{"column": "age", "strategy": "mean"}]},
                {"type": "scale", "method": "normalize", "columns": ["age"]}
            ]
        },
        "split": {"test_fraction": 0.25, "seed": 7},
        "training": {
            "model_type": "decision_tree",
            "task_type": "classification",
            "target_column": "label",
            "feature_columns": ["age_scaled"],
            "hyperparameters": {"max_depth": 4}
        }
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = PipelineConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.preprocessing.steps.len(), 2);
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.training.model_type, ModelType::DecisionTree);
        assert_eq!(config.training.hyperparameters.max_depth, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let json = r#"{"training": {"model_type": "linear_regression",
            "target_column": "y", "feature_columns": ["x"]}}"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.split, SplitConfig::default());
        assert!(config.preprocessing.steps.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_split_is_rejected() {
        let mut config = PipelineConfig::from_json_str(CONFIG).unwrap();
        config.split.test_fraction = 1.0;
        assert!(matches!(config.validate(), Err(TabulaError::InvalidParameter { .. })));
    }

    #[test]
    fn test_unknown_model_type_is_rejected() {
        let json = CONFIG.replace("decision_tree", "svm");
        assert!(matches!(
            PipelineConfig::from_json_str(&json),
            Err(TabulaError::SerializationError(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("tabula_config_{}.json", std::process::id()));
        std::fs::write(&path, CONFIG).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.training.target_column, "label");
    }
}
