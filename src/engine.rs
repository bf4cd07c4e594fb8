//! Boundary to the external detection/training engine.
//!
//! The engine is a capability: train on a split dataset, run inference on an
//! image. Nothing here knows how a model works.

use crate::manifest::DatasetManifest;
use anyhow::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::collections::BTreeMap;

/// Confidence threshold used by the front-ends when none is given
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// Bounding box in the original image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Raw engine output for one box
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Detection with its class id resolved to a name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDetection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

pub trait DetectionEngine {
    type Model;

    fn train(&self, dataset: &DatasetManifest) -> Result<Self::Model>;

    fn infer(&self, model: &Self::Model, image: &RgbImage) -> Result<Vec<Detection>>;
}

const PALETTE: [[u8; 3]; 6] = [
    [255, 56, 56],
    [56, 56, 255],
    [56, 255, 56],
    [255, 157, 0],
    [255, 0, 255],
    [0, 212, 255],
];

fn class_color(class_id: u32) -> Rgb<u8> {
    Rgb(PALETTE[class_id as usize % PALETTE.len()])
}

/// Run inference, keep detections at or above `threshold`, and draw them.
///
/// Class ids without a name in `names` are reported as `class_{id}`.
pub fn detect_and_annotate<E: DetectionEngine>(
    engine: &E,
    model: &E::Model,
    image: &RgbImage,
    threshold: f32,
    names: &BTreeMap<u32, String>,
) -> Result<(Vec<NamedDetection>, RgbImage)> {
    let mut annotated = image.clone();
    let mut kept = Vec::new();

    for det in engine.infer(model, image)? {
        if det.confidence < threshold {
            continue;
        }
        if let Some(rect) = clip_rect(&det.bbox, image.width(), image.height()) {
            draw_hollow_rect_mut(&mut annotated, rect, class_color(det.class_id));
        }
        let class_name = names
            .get(&det.class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", det.class_id));
        kept.push(NamedDetection {
            class_name,
            confidence: det.confidence,
            bbox: det.bbox,
        });
    }

    Ok((kept, annotated))
}

/// Detections per class name
pub fn count_by_class(detections: &[NamedDetection]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(det.class_name.clone()).or_insert(0) += 1;
    }
    counts
}

fn clip_rect(bbox: &BoundingBox, width: u32, height: u32) -> Option<Rect> {
    if bbox.x >= width || bbox.y >= height {
        return None;
    }
    let w = bbox.width.min(width - bbox.x).max(1);
    let h = bbox.height.min(height - bbox.y).max(1);
    Some(Rect::at(bbox.x as i32, bbox.y as i32).of_size(w, h))
}
