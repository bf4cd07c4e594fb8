use crate::augment::ops;
use crate::models::{LabelSet, Sample};
use crate::pipeline::{AugmentStep, StepContext};
use anyhow::Result;
use rand::{Rng, RngCore};

/// Draw once and report whether a step with this probability fires
fn roll(rng: &mut dyn RngCore, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

/// Mirror image and boxes left to right
pub struct HorizontalFlipStep {
    pub probability: f64,
}

impl Default for HorizontalFlipStep {
    fn default() -> Self {
        Self { probability: 0.5 }
    }
}

impl AugmentStep for HorizontalFlipStep {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore, _context: &StepContext) -> Result<Sample> {
        if !roll(rng, self.probability) {
            return Ok(sample);
        }
        let labels = LabelSet::new(
            sample
                .labels
                .iter()
                .map(|a| a.flipped_horizontally())
                .collect(),
        );
        Ok(Sample::new(ops::flip_horizontal(&sample.image), labels))
    }

    fn name(&self) -> &str {
        "Horizontal Flip"
    }
}

/// Random contrast multiplier and brightness offset, always applied
pub struct BrightnessContrastStep {
    pub contrast: (f32, f32),
    pub brightness: (i32, i32),
}

impl Default for BrightnessContrastStep {
    fn default() -> Self {
        Self {
            contrast: (0.7, 1.3),
            brightness: (-30, 30),
        }
    }
}

impl AugmentStep for BrightnessContrastStep {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore, _context: &StepContext) -> Result<Sample> {
        let alpha = rng.random_range(self.contrast.0..=self.contrast.1);
        let beta = rng.random_range(self.brightness.0..=self.brightness.1);
        Ok(Sample::new(ops::scale_abs(&sample.image, alpha, beta), sample.labels))
    }

    fn name(&self) -> &str {
        "Brightness Contrast"
    }
}

/// Additive per-channel Gaussian pixel noise
pub struct GaussianNoiseStep {
    pub probability: f64,
    pub std_dev: f32,
}

impl Default for GaussianNoiseStep {
    fn default() -> Self {
        Self {
            probability: 0.3,
            std_dev: 15.0,
        }
    }
}

impl AugmentStep for GaussianNoiseStep {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore, _context: &StepContext) -> Result<Sample> {
        if !roll(rng, self.probability) {
            return Ok(sample);
        }
        let noisy = ops::add_gaussian_noise(&sample.image, self.std_dev, rng);
        Ok(Sample::new(noisy, sample.labels))
    }

    fn name(&self) -> &str {
        "Gaussian Noise"
    }
}

/// Fixed 5x5 Gaussian smoothing
pub struct GaussianBlurStep {
    pub probability: f64,
}

impl Default for GaussianBlurStep {
    fn default() -> Self {
        Self { probability: 0.3 }
    }
}

impl AugmentStep for GaussianBlurStep {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore, _context: &StepContext) -> Result<Sample> {
        if !roll(rng, self.probability) {
            return Ok(sample);
        }
        Ok(Sample::new(ops::gaussian_blur_5x5(&sample.image), sample.labels))
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Hue shift plus independent saturation and value scaling, always applied
pub struct HsvJitterStep {
    pub hue_shift: i32,
    pub saturation: (f32, f32),
    pub value: (f32, f32),
}

impl Default for HsvJitterStep {
    fn default() -> Self {
        Self {
            hue_shift: 10,
            saturation: (0.8, 1.2),
            value: (0.8, 1.2),
        }
    }
}

impl AugmentStep for HsvJitterStep {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore, _context: &StepContext) -> Result<Sample> {
        let shift = rng.random_range(-self.hue_shift..=self.hue_shift);
        let s = rng.random_range(self.saturation.0..=self.saturation.1);
        let v = rng.random_range(self.value.0..=self.value.1);
        Ok(Sample::new(ops::jitter_hsv(&sample.image, shift, s, v), sample.labels))
    }

    fn name(&self) -> &str {
        "HSV Jitter"
    }
}
