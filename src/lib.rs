pub mod augment;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod labels;
pub mod manifest;
pub mod models;
pub mod pipeline;
pub mod split;

pub use augment::{AugmentReport, Augmenter, EmptyLabelMode};
pub use config::PrepConfig;
pub use dataset::{DatasetDir, SplitLayout};
pub use engine::{BoundingBox, Detection, DetectionEngine, NamedDetection};
pub use manifest::DatasetManifest;
pub use models::{Annotation, LabelSet, Sample};
pub use pipeline::{overlay_labels, AugmentPipeline, AugmentStep, DebugConfig, StepContext};
pub use split::{SplitPolicy, SplitReport, Splitter, UnlabeledPolicy};
