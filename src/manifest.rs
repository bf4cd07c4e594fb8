use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "data.yaml";

/// Dataset descriptor read by the detection trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Dataset root; `train` and `val` are relative to it
    pub path: PathBuf,
    pub train: String,
    pub val: String,
    /// Number of classes
    pub nc: usize,
    pub names: BTreeMap<u32, String>,
}

impl DatasetManifest {
    pub fn new(root: impl Into<PathBuf>, class_names: &[String]) -> Self {
        Self {
            path: root.into(),
            train: "train/images".to_string(),
            val: "val/images".to_string(),
            nc: class_names.len(),
            names: class_names
                .iter()
                .enumerate()
                .map(|(id, name)| (id as u32, name.clone()))
                .collect(),
        }
    }

    pub fn class_name(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// Write `data.yaml` into the split root and return its path
    pub fn write(&self, split_root: &Path) -> Result<PathBuf> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize dataset manifest")?;
        let path = split_root.join(MANIFEST_FILE);
        fs::write(&path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote dataset manifest {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
