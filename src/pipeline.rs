use crate::models::Sample;
use anyhow::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::debug;
use rand::RngCore;
use std::path::PathBuf;
use std::sync::Arc;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all augmentation steps
#[derive(Clone, Debug, Default)]
pub struct StepContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all augmentation steps must implement
///
/// A step takes one sample and returns exactly one sample. Every random draw
/// goes through `rng` so a run is reproducible from its seed.
pub trait AugmentStep: Send + Sync {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore, context: &StepContext) -> Result<Sample>;

    /// Human-readable name for this step (used in logs and debug directories)
    fn name(&self) -> &str;
}

/// Composable, ordered chain of augmentation steps
#[derive(Clone)]
pub struct AugmentPipeline {
    steps: Vec<Arc<dyn AugmentStep>>,
    context: StepContext,
}

impl AugmentPipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: StepContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Share the debug settings of another pipeline
    pub fn with_context(mut self, context: StepContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &StepContext {
        &self.context
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn AugmentStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order on one sample.
    ///
    /// `tag` names the debug images written for this run (usually the output stem).
    pub fn run(&self, input: Sample, rng: &mut dyn RngCore, tag: &str) -> Result<Sample> {
        self.save_debug_output(&input, "00_input", tag)?;

        let mut sample = input;
        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!("{}: running step {}", tag, step.name());
            sample = step.apply(sample, rng, &self.context)?;

            let step_dir_name = format!(
                "{:02}_{}",
                step_idx + 1,
                step.name().to_lowercase().replace(' ', "_")
            );
            self.save_debug_output(&sample, &step_dir_name, tag)?;
        }

        Ok(sample)
    }

    fn save_debug_output(&self, sample: &Sample, step_dir_name: &str, tag: &str) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let step_dir = debug_config.output_dir.join(step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let filename = format!("{}.png", tag);
        overlay_labels(sample)
            .save(step_dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        debug!("Debug: saved {}/{}", step_dir_name, filename);

        Ok(())
    }
}

const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy of the sample image with its label boxes outlined
pub fn overlay_labels(sample: &Sample) -> RgbImage {
    let mut canvas = sample.image.clone();
    let (width, height) = canvas.dimensions();
    for a in sample.labels.iter() {
        let (x0, y0, x1, y1) = a.to_pixels(width, height);
        let w = (x1 - x0).round().max(1.0) as u32;
        let h = (y1 - y0).round().max(1.0) as u32;
        let rect = Rect::at(x0.round() as i32, y0.round() as i32).of_size(w, h);
        draw_hollow_rect_mut(&mut canvas, rect, OVERLAY_COLOR);
    }
    canvas
}

impl Default for AugmentPipeline {
    fn default() -> Self {
        Self::new()
    }
}
