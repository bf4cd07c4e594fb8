pub mod color;
pub mod ops;
pub mod steps;

use crate::dataset::{file_stem, DatasetDir, DEFAULT_EXTENSIONS};
use crate::labels;
use crate::models::Sample;
use crate::pipeline::AugmentPipeline;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use steps::*;

/// Which steps run for images that carry no annotations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EmptyLabelMode {
    /// Flip and brightness/contrast only
    #[default]
    FlipAndColorOnly,
    /// The same five steps as annotated images
    Full,
}

/// Flip, brightness/contrast, noise, blur, HSV jitter
pub fn default_pipeline() -> AugmentPipeline {
    AugmentPipeline::new()
        .add_step_boxed(Box::new(HorizontalFlipStep::default()))
        .add_step_boxed(Box::new(BrightnessContrastStep::default()))
        .add_step_boxed(Box::new(GaussianNoiseStep::default()))
        .add_step_boxed(Box::new(GaussianBlurStep::default()))
        .add_step_boxed(Box::new(HsvJitterStep::default()))
}

/// Flip and brightness/contrast
pub fn flip_and_color_pipeline() -> AugmentPipeline {
    AugmentPipeline::new()
        .add_step_boxed(Box::new(HorizontalFlipStep::default()))
        .add_step_boxed(Box::new(BrightnessContrastStep::default()))
}

/// Counts gathered while augmenting a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentReport {
    pub sources: usize,
    pub skipped_sources: usize,
    pub variants_written: usize,
    pub variants_failed: usize,
    /// Images present in the output after the run (originals plus variants)
    pub output_images: usize,
}

/// Writes every source pair untouched plus `num_augmentations` transformed copies
pub struct Augmenter {
    annotated: AugmentPipeline,
    label_less: AugmentPipeline,
    num_augmentations: usize,
    extensions: Vec<String>,
}

impl Augmenter {
    pub fn new(num_augmentations: usize, empty_label_mode: EmptyLabelMode) -> Self {
        let label_less = match empty_label_mode {
            EmptyLabelMode::FlipAndColorOnly => flip_and_color_pipeline(),
            EmptyLabelMode::Full => default_pipeline(),
        };
        Self::from_pipelines(default_pipeline(), label_less, num_augmentations)
    }

    pub fn from_pipelines(
        annotated: AugmentPipeline,
        label_less: AugmentPipeline,
        num_augmentations: usize,
    ) -> Self {
        Self {
            annotated,
            label_less,
            num_augmentations,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Dump every step's output image into `output_dir` (must be empty)
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.annotated = self.annotated.with_debug(output_dir)?;
        let context = self.annotated.context().clone();
        self.label_less = self.label_less.with_context(context);
        Ok(self)
    }

    pub fn num_augmentations(&self) -> usize {
        self.num_augmentations
    }

    /// Produce one transformed copy of a sample
    pub fn augment_sample(&self, sample: &Sample, rng: &mut dyn RngCore, tag: &str) -> Result<Sample> {
        let pipeline = if sample.has_annotations() {
            &self.annotated
        } else {
            &self.label_less
        };
        pipeline.run(sample.clone(), rng, tag)
    }

    /// Augment every image of `source` into `output`.
    ///
    /// `output` is cleared first. One unreadable image or one failed variant
    /// is logged and skipped; failing to write output aborts the run.
    pub fn run(&self, source: &DatasetDir, output: &DatasetDir, rng: &mut dyn RngCore) -> Result<AugmentReport> {
        if !source.images_dir().is_dir() {
            anyhow::bail!("Source images directory not found: {}", source.images_dir().display());
        }
        if same_location(source.root(), output.root()) {
            anyhow::bail!(
                "Output directory must differ from source: {}",
                output.root().display()
            );
        }

        let images = source.list_images(&self.extensions)?;
        info!("Augmenting {} source images ({} variants each)", images.len(), self.num_augmentations);

        output.recreate()?;

        let mut report = AugmentReport {
            sources: images.len(),
            ..Default::default()
        };

        for image_path in &images {
            let stem = file_stem(image_path)?;
            let Some(sample) = load_sample(source, image_path) else {
                report.skipped_sources += 1;
                continue;
            };

            copy_original(source, output, image_path, stem)?;

            let ext = image_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("jpg");

            for aug_idx in 0..self.num_augmentations {
                let aug_stem = format!("{}_aug{}", stem, aug_idx);
                let augmented = match self.augment_sample(&sample, rng, &aug_stem) {
                    Ok(a) => a,
                    Err(e) => {
                        warn!("Error augmenting {} (variant {}): {:#}", image_path.display(), aug_idx, e);
                        report.variants_failed += 1;
                        continue;
                    }
                };

                let aug_image_path = output.image_path(&format!("{}.{}", aug_stem, ext));
                augmented
                    .image
                    .save(&aug_image_path)
                    .with_context(|| format!("Failed to write {}", aug_image_path.display()))?;
                labels::write_labels(&output.label_path(&aug_stem), &augmented.labels)?;

                report.variants_written += 1;
                if report.variants_written % 50 == 0 {
                    info!("Created {} augmented images...", report.variants_written);
                }
            }
        }

        report.output_images = output.count_images(&self.extensions)?;
        info!(
            "Augmentation complete: {} sources, {} variants, {} images in {}",
            report.sources - report.skipped_sources,
            report.variants_written,
            report.output_images,
            output.root().display()
        );
        Ok(report)
    }
}

/// Decode an image and read its labels, logging and returning `None` on failure
fn load_sample(source: &DatasetDir, image_path: &Path) -> Option<Sample> {
    let image = match image::open(image_path) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            warn!("Skipping unreadable image {}: {}", image_path.display(), e);
            return None;
        }
    };

    let label_path = match source.label_for(image_path) {
        Ok(p) => p,
        Err(e) => {
            warn!("Skipping {}: {:#}", image_path.display(), e);
            return None;
        }
    };
    match labels::read_labels(&label_path) {
        Ok(labels) => {
            debug!("{}: {} annotations", image_path.display(), labels.len());
            Some(Sample::new(image, labels))
        }
        Err(e) => {
            warn!("Skipping {}: {:#}", image_path.display(), e);
            None
        }
    }
}

/// Copy the untouched pair; a missing label file becomes an empty one
fn copy_original(source: &DatasetDir, output: &DatasetDir, image_path: &Path, stem: &str) -> Result<()> {
    if !source.copy_pair(image_path, output)? {
        let empty = output.label_path(stem);
        fs::write(&empty, "").with_context(|| format!("Failed to write {}", empty.display()))?;
    }
    Ok(())
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
