mod common;

use common::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn pipeline(root: &std::path::Path, raw: &DatasetDir, seed: u64) -> SplitReport {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let augmented = DatasetDir::new(root.join("aug"));
    Augmenter::new(3, EmptyLabelMode::FlipAndColorOnly)
        .run(raw, &augmented, &mut rng)
        .expect("augment failed");
    Splitter::new(SplitPolicy::Stratified)
        .run(&augmented, &SplitLayout::new(root.join("split")), &mut rng)
        .expect("split failed")
}

#[test]
fn augment_then_split_is_reproducible() -> anyhow::Result<()> {
    let dir = temp_dir();
    let raw = make_source(
        &dir.path().join("raw"),
        &[
            ("a", Some("0 0.2 0.5 0.2 0.3\n")),
            ("b", Some("0 0.6 0.4 0.1 0.1\n1 0.3 0.3 0.2 0.2\n")),
            ("c", Some("1 0.5 0.5 0.5 0.5\n")),
            ("d", None),
        ],
    );

    let first = pipeline(&dir.path().join("run1"), &raw, 42);
    let second = pipeline(&dir.path().join("run2"), &raw, 42);

    assert_eq!(first, second);
    assert_eq!(snapshot(&dir.path().join("run1")), snapshot(&dir.path().join("run2")));

    // 4 sources x 4 files each; the label-less one is excluded from stratification
    assert_eq!(first.excluded, 4);
    assert_eq!(first.train_images + first.val_images, 12);
    Ok(())
}

#[test]
fn manifest_points_at_split_directories() -> anyhow::Result<()> {
    let dir = temp_dir();
    let names = vec!["betty".to_string(), "haagen".to_string()];
    let path = DatasetManifest::new(dir.path(), &names).write(dir.path())?;
    let loaded = DatasetManifest::load(&path)?;
    assert_eq!(loaded.train, "train/images");
    assert_eq!(loaded.val, "val/images");
    assert_eq!(loaded.nc, 2);
    assert_eq!(loaded.class_name(0), Some("betty"));
    Ok(())
}
