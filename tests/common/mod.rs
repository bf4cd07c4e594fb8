mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from detprep for tests
pub use detprep::{
    Augmenter, DatasetDir, DatasetManifest, EmptyLabelMode,
    LabelSet, SplitLayout, SplitPolicy, SplitReport, Splitter, UnlabeledPolicy,
};
