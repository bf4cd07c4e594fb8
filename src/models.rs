use image::RgbImage;

/// One bounding box in normalized `(x_center, y_center, width, height)` form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl Annotation {
    pub fn new(class_id: u32, x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            class_id,
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Mirror the box across the vertical axis of the image
    pub fn flipped_horizontally(&self) -> Self {
        Self {
            x_center: 1.0 - self.x_center,
            ..*self
        }
    }

    /// Every geometric field lies in [0, 1]
    pub fn is_normalized(&self) -> bool {
        [self.x_center, self.y_center, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    /// Copy with every geometric field clamped to [0, 1]
    pub fn clamped(&self) -> Self {
        Self {
            class_id: self.class_id,
            x_center: self.x_center.clamp(0.0, 1.0),
            y_center: self.y_center.clamp(0.0, 1.0),
            width: self.width.clamp(0.0, 1.0),
            height: self.height.clamp(0.0, 1.0),
        }
    }

    /// Box corners in pixel space as `(x_min, y_min, x_max, y_max)`
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> (f32, f32, f32, f32) {
        let w = image_width as f64;
        let h = image_height as f64;
        let half_w = self.width * w / 2.0;
        let half_h = self.height * h / 2.0;
        (
            (self.x_center * w - half_w) as f32,
            (self.y_center * h - half_h) as f32,
            (self.x_center * w + half_w) as f32,
            (self.y_center * h + half_h) as f32,
        )
    }
}

/// Annotations of a single image, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    pub annotations: Vec<Annotation>,
}

impl LabelSet {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Class of the first annotation, used as the stratification key
    pub fn primary_class(&self) -> Option<u32> {
        self.annotations.first().map(|a| a.class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }
}

/// An image together with its labels as it moves through the augmentation steps
#[derive(Debug, Clone)]
pub struct Sample {
    pub image: RgbImage,
    pub labels: LabelSet,
}

impl Sample {
    pub fn new(image: RgbImage, labels: LabelSet) -> Self {
        Self { image, labels }
    }

    pub fn has_annotations(&self) -> bool {
        !self.labels.is_empty()
    }
}
