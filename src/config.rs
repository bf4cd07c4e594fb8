use crate::augment::EmptyLabelMode;
use crate::split::{SplitPolicy, UnlabeledPolicy, DEFAULT_TRAIN_RATIO};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Pipeline settings, loadable from YAML; missing keys take their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Seed of the single random source used by augmenter and splitter
    pub seed: u64,

    /// Transformed copies written per source image
    pub num_augmentations: usize,

    /// Fraction of each split group that goes to training
    pub train_ratio: f64,

    /// Image file extensions to pick up (case-insensitive)
    pub extensions: Vec<String>,

    pub empty_label_mode: EmptyLabelMode,

    pub policy: SplitPolicy,

    pub unlabeled_policy: UnlabeledPolicy,

    /// Class names in id order, written to `data.yaml`
    pub class_names: Vec<String>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_augmentations: 3,
            train_ratio: DEFAULT_TRAIN_RATIO,
            extensions: vec!["jpg".to_string()],
            empty_label_mode: EmptyLabelMode::default(),
            policy: SplitPolicy::default(),
            unlabeled_policy: UnlabeledPolicy::default(),
            class_names: Vec::new(),
        }
    }
}

impl PrepConfig {
    /// Load from a YAML file, or return defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: PrepConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            anyhow::bail!("train_ratio must be between 0 and 1 (exclusive), got {}", self.train_ratio);
        }
        if self.extensions.is_empty() {
            anyhow::bail!("At least one image extension is required");
        }
        if let Some(bad) = self.extensions.iter().find(|e| e.is_empty() || e.starts_with('.')) {
            anyhow::bail!("Invalid image extension '{}' (expected e.g. \"jpg\")", bad);
        }
        Ok(())
    }
}
