use crate::labels::LABEL_EXTENSION;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Image extensions picked up when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg"];

/// A dataset root holding parallel `images/` and `labels/` directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDir {
    root: PathBuf,
}

impl DatasetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.root.join("labels")
    }

    pub fn image_path(&self, file_name: &str) -> PathBuf {
        self.images_dir().join(file_name)
    }

    /// Label file that belongs to an image stem
    pub fn label_path(&self, stem: &str) -> PathBuf {
        self.labels_dir().join(format!("{}.{}", stem, LABEL_EXTENSION))
    }

    /// Create both directories; succeeds when they already exist
    pub fn create(&self) -> Result<()> {
        for dir in [self.images_dir(), self.labels_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Delete both directories (if present) and create them empty
    pub fn recreate(&self) -> Result<()> {
        for dir in [self.images_dir(), self.labels_dir()] {
            if dir.exists() {
                debug!("Clearing {}", dir.display());
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("Failed to clear directory {}", dir.display()))?;
            }
        }
        self.create()
    }

    /// Images in `images/` whose extension matches (case-insensitively), sorted by file name.
    ///
    /// Label files are keyed by stem, so only the first image of each stem is
    /// returned; later ones are skipped with a warning.
    pub fn list_images<S: AsRef<str>>(&self, extensions: &[S]) -> Result<Vec<PathBuf>> {
        let dir = self.images_dir();
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))?;

        let mut images = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, extensions) {
                images.push(path);
            }
        }
        images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut stems = HashSet::new();
        images.retain(|path| {
            let stem = path.file_stem().map(|s| s.to_os_string());
            if stems.insert(stem) {
                true
            } else {
                warn!("Skipping {}: another image already uses its stem", path.display());
                false
            }
        });
        Ok(images)
    }

    /// Number of matching images, zero when `images/` is missing
    pub fn count_images<S: AsRef<str>>(&self, extensions: &[S]) -> Result<usize> {
        if !self.images_dir().exists() {
            return Ok(0);
        }
        Ok(self.list_images(extensions)?.len())
    }

    /// Label file belonging to an image path from this dataset
    pub fn label_for(&self, image: &Path) -> Result<PathBuf> {
        Ok(self.label_path(file_stem(image)?))
    }

    /// Copy an image of this dataset and its label file (if present) into `dest`,
    /// keeping file names. Returns whether a label file was copied.
    pub fn copy_pair(&self, image: &Path, dest: &DatasetDir) -> Result<bool> {
        let file_name = file_name(image)?;
        let target = dest.image_path(file_name);
        fs::copy(image, &target).with_context(|| {
            format!("Failed to copy {} to {}", image.display(), target.display())
        })?;

        let label = self.label_for(image)?;
        if !label.exists() {
            return Ok(false);
        }
        let label_target = dest.label_path(file_stem(image)?);
        fs::copy(&label, &label_target).with_context(|| {
            format!("Failed to copy {} to {}", label.display(), label_target.display())
        })?;
        Ok(true)
    }
}

/// Output layout of a split: `train/{images,labels}` and `val/{images,labels}`
#[derive(Debug, Clone)]
pub struct SplitLayout {
    root: PathBuf,
}

impl SplitLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn train(&self) -> DatasetDir {
        DatasetDir::new(self.root.join("train"))
    }

    pub fn val(&self) -> DatasetDir {
        DatasetDir::new(self.root.join("val"))
    }

    /// Clear and recreate all four output directories
    pub fn recreate(&self) -> Result<()> {
        self.train().recreate()?;
        self.val().recreate()
    }
}

pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.as_ref().eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

pub fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))
}
