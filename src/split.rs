//! Train/validation partitioning of an augmented dataset.
//!
//! Both policies clear the destination before copying, and the returned
//! [`SplitReport`] is built by rescanning the written tree rather than from
//! the planned lists.

use crate::dataset::{DatasetDir, SplitLayout, DEFAULT_EXTENSIONS};
use crate::labels;
use anyhow::Result;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// One shuffle over the whole corpus
    Uniform,
    /// Shuffle and cut each primary-class group on its own
    #[default]
    Stratified,
}

/// What stratification does with images whose label file is missing or empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UnlabeledPolicy {
    /// Leave them out of the split entirely
    #[default]
    Exclude,
    /// Split them 70/30 as one extra group
    Background,
}

/// Stratification key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SplitGroup {
    Class(u32),
    Background,
}

impl fmt::Display for SplitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitGroup::Class(id) => write!(f, "class {}", id),
            SplitGroup::Background => write!(f, "background"),
        }
    }
}

/// Planned image counts for one stratification group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSplit {
    pub group: SplitGroup,
    pub train: usize,
    pub val: usize,
}

/// Which images go where, before anything is copied
#[derive(Debug, Clone, Default)]
pub struct SplitPlan {
    pub train: Vec<PathBuf>,
    pub val: Vec<PathBuf>,
    /// Per-group counts (stratified only)
    pub groups: Vec<GroupSplit>,
    /// Images left out of the split
    pub excluded: usize,
}

/// Realized split, counted from the written directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub policy: SplitPolicy,
    pub train_images: usize,
    pub val_images: usize,
    pub train_instances: BTreeMap<u32, usize>,
    pub val_instances: BTreeMap<u32, usize>,
    pub groups: Vec<GroupSplit>,
    pub excluded: usize,
}

/// Number of items that go to training out of `total`
pub fn split_index(total: usize, train_ratio: f64) -> usize {
    (total as f64 * train_ratio).floor() as usize
}

pub struct Splitter {
    policy: SplitPolicy,
    train_ratio: f64,
    unlabeled: UnlabeledPolicy,
    extensions: Vec<String>,
}

impl Splitter {
    pub fn new(policy: SplitPolicy) -> Self {
        Self {
            policy,
            train_ratio: DEFAULT_TRAIN_RATIO,
            unlabeled: UnlabeledPolicy::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_train_ratio(mut self, train_ratio: f64) -> Self {
        self.train_ratio = train_ratio;
        self
    }

    pub fn with_unlabeled_policy(mut self, unlabeled: UnlabeledPolicy) -> Self {
        self.unlabeled = unlabeled;
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Decide the train/val membership of every image in `source`
    pub fn plan(&self, source: &DatasetDir, rng: &mut dyn RngCore) -> Result<SplitPlan> {
        let images = source.list_images(&self.extensions)?;
        info!("Total images: {}", images.len());

        match self.policy {
            SplitPolicy::Uniform => Ok(self.plan_uniform(images, rng)),
            SplitPolicy::Stratified => self.plan_stratified(source, images, rng),
        }
    }

    fn plan_uniform(&self, mut images: Vec<PathBuf>, rng: &mut dyn RngCore) -> SplitPlan {
        images.shuffle(rng);
        let cut = split_index(images.len(), self.train_ratio);
        let val = images.split_off(cut);
        SplitPlan {
            train: images,
            val,
            groups: Vec::new(),
            excluded: 0,
        }
    }

    fn plan_stratified(
        &self,
        source: &DatasetDir,
        images: Vec<PathBuf>,
        rng: &mut dyn RngCore,
    ) -> Result<SplitPlan> {
        let mut grouped: BTreeMap<SplitGroup, Vec<PathBuf>> = BTreeMap::new();
        let mut excluded = 0;

        for image in images {
            let group = match labels::read_primary_class(&source.label_for(&image)?)? {
                Some(class_id) => SplitGroup::Class(class_id),
                None if self.unlabeled == UnlabeledPolicy::Background => SplitGroup::Background,
                None => {
                    debug!("Excluding unlabeled {}", image.display());
                    excluded += 1;
                    continue;
                }
            };
            grouped.entry(group).or_default().push(image);
        }

        let mut plan = SplitPlan {
            excluded,
            ..Default::default()
        };
        for (group, mut members) in grouped {
            members.shuffle(rng);
            let cut = split_index(members.len(), self.train_ratio);
            let val = members.split_off(cut);
            info!("  {}: train={}, val={}", group, members.len(), val.len());
            plan.groups.push(GroupSplit {
                group,
                train: members.len(),
                val: val.len(),
            });
            plan.train.extend(members);
            plan.val.extend(val);
        }
        Ok(plan)
    }

    /// Plan, clear the destination, copy every pair and rescan the result
    pub fn run(&self, source: &DatasetDir, layout: &SplitLayout, rng: &mut dyn RngCore) -> Result<SplitReport> {
        let plan = self.plan(source, rng)?;
        if plan.excluded > 0 {
            info!("{} images without a primary class left out of the split", plan.excluded);
        }

        layout.recreate()?;
        let train = layout.train();
        let val = layout.val();

        info!("Copying {} training files...", plan.train.len());
        for image in &plan.train {
            source.copy_pair(image, &train)?;
        }
        info!("Copying {} validation files...", plan.val.len());
        for image in &plan.val {
            source.copy_pair(image, &val)?;
        }

        let report = SplitReport {
            policy: self.policy,
            train_images: train.count_images(&self.extensions)?,
            val_images: val.count_images(&self.extensions)?,
            train_instances: labels::count_class_instances(&train.labels_dir())?,
            val_instances: labels::count_class_instances(&val.labels_dir())?,
            groups: plan.groups,
            excluded: plan.excluded,
        };
        info!(
            "Split complete: train={} val={} in {}",
            report.train_images,
            report.val_images,
            layout.root().display()
        );
        Ok(report)
    }
}
