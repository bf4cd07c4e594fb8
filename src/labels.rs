//! Flat label files: one `class_id x_center y_center width height` line per box.
//!
//! A missing label file is an image with zero annotations, never an error.

use crate::models::{Annotation, LabelSet};
use anyhow::{Context, Result};
use log::warn;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Extension used for every label file
pub const LABEL_EXTENSION: &str = "txt";

/// Parse a single label line.
///
/// Returns `None` for lines that do not have exactly five fields or whose
/// fields do not parse to finite numbers. Out-of-range geometry is clamped
/// into [0, 1].
pub fn parse_line(line: &str) -> Option<Annotation> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return None;
    }

    let class_id = parts[0].parse::<u32>().ok()?;
    let mut values = [0.0f64; 4];
    for (slot, raw) in values.iter_mut().zip(&parts[1..]) {
        let v = raw.parse::<f64>().ok()?;
        if !v.is_finite() {
            return None;
        }
        *slot = v;
    }

    let annotation = Annotation::new(class_id, values[0], values[1], values[2], values[3]);
    if annotation.is_normalized() {
        Some(annotation)
    } else {
        warn!("Clamping out-of-range box: {}", line.trim());
        Some(annotation.clamped())
    }
}

/// Parse the full contents of a label file
pub fn parse(contents: &str) -> LabelSet {
    let mut annotations = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_line(trimmed) {
            Some(a) => annotations.push(a),
            None if trimmed.split_whitespace().count() == 5 => {
                warn!("Skipping unparsable label line: {}", trimmed);
            }
            None => {}
        }
    }
    LabelSet::new(annotations)
}

pub fn format_line(a: &Annotation) -> String {
    format!(
        "{} {} {} {} {}",
        a.class_id, a.x_center, a.y_center, a.width, a.height
    )
}

/// Render a label set, one newline-terminated line per annotation
pub fn format(labels: &LabelSet) -> String {
    let mut out = String::new();
    for a in labels.iter() {
        out.push_str(&format_line(a));
        out.push('\n');
    }
    out
}

/// Read a label file, treating a missing file as an empty label set
pub fn read_labels(path: &Path) -> Result<LabelSet> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse(&contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(LabelSet::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read label file {}", path.display())),
    }
}

pub fn write_labels(path: &Path, labels: &LabelSet) -> Result<()> {
    fs::write(path, format(labels))
        .with_context(|| format!("Failed to write label file {}", path.display()))
}

/// Class id on the first line of a label file.
///
/// `None` when the file is missing, empty, or starts with a blank line.
pub fn read_primary_class(path: &Path) -> Result<Option<u32>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read label file {}", path.display()));
        }
    };

    let first_line = contents.lines().next().unwrap_or("").trim();
    let Some(token) = first_line.split_whitespace().next() else {
        return Ok(None);
    };
    match token.parse::<u32>() {
        Ok(class_id) => Ok(Some(class_id)),
        Err(_) => {
            warn!("Unreadable class id '{}' in {}", token, path.display());
            Ok(None)
        }
    }
}

/// Count annotation lines per class across every label file in a directory
pub fn count_class_instances(labels_dir: &Path) -> Result<BTreeMap<u32, usize>> {
    let mut counts = BTreeMap::new();
    if !labels_dir.exists() {
        return Ok(counts);
    }

    let entries = fs::read_dir(labels_dir)
        .with_context(|| format!("Failed to list {}", labels_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LABEL_EXTENSION) {
            continue;
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read label file {}", path.display()))?;
        for line in contents.lines() {
            if let Some(class_id) = line
                .split_whitespace()
                .next()
                .and_then(|t| t.parse::<u32>().ok())
            {
                *counts.entry(class_id).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}
