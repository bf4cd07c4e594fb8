#![allow(dead_code)]

use detprep::DatasetDir;
use image::{ImageBuffer, Rgb};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Writes a small gradient JPEG into the dataset's images/ directory.
pub fn write_test_image(ds: &DatasetDir, stem: &str) {
    let img = ImageBuffer::from_fn(16, 12, |x, y| {
        Rgb([(x * 15) as u8, (y * 20) as u8, ((x + y) * 5) as u8])
    });
    img.save_with_format(ds.image_path(&format!("{}.jpg", stem)), image::ImageFormat::Jpeg)
        .expect("Failed to save test image");
}

/// Creates `images/` and `labels/` under `root` and fills them.
/// `None` labels mean no label file is written for that stem.
pub fn make_source(root: &Path, items: &[(&str, Option<&str>)]) -> DatasetDir {
    let ds = DatasetDir::new(root);
    ds.create().expect("Failed to create dataset dirs");
    for (stem, labels) in items {
        write_test_image(&ds, stem);
        if let Some(contents) = labels {
            fs::write(ds.label_path(stem), contents).expect("Failed to write label file");
        }
    }
    ds
}

/// Corpus for split tests: `count` placeholder images per class, one box each.
/// Image bytes are not decoded by the splitter, so they are stubs.
pub fn make_class_corpus(root: &Path, per_class: &[(u32, usize)]) -> DatasetDir {
    let ds = DatasetDir::new(root);
    ds.create().expect("Failed to create dataset dirs");
    for (class_id, count) in per_class {
        for i in 0..*count {
            let stem = format!("c{}_{:03}", class_id, i);
            fs::write(ds.image_path(&format!("{}.jpg", stem)), stem.as_bytes())
                .expect("Failed to write image stub");
            fs::write(ds.label_path(&stem), format!("{} 0.5 0.5 0.2 0.2\n", class_id))
                .expect("Failed to write label file");
        }
    }
    ds
}

pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Every file under `root`, keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Bad dir entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            files.insert(rel, fs::read(&path).expect("Failed to read file"));
        }
    }
}

/// File names in a directory, sorted.
pub fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn stems_in(dir: &Path) -> Vec<String> {
    names_in(dir)
        .into_iter()
        .map(|n| match n.rsplit_once('.') {
            Some((stem, _)) => stem.to_string(),
            None => n,
        })
        .collect()
}
