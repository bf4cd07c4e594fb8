mod common;

use common::*;
use detprep::split::{split_index, GroupSplit, SplitGroup};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use std::fs;

fn run(splitter: &Splitter, source: &DatasetDir, out: &std::path::Path, seed: u64) -> SplitReport {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    splitter
        .run(source, &SplitLayout::new(out), &mut rng)
        .expect("split failed")
}

#[test]
fn uniform_split_is_a_disjoint_70_30_partition() {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 6), (1, 4)]);
    let out = dir.path().join("split");

    let report = run(&Splitter::new(SplitPolicy::Uniform), &source, &out, 42);
    assert_eq!(report.train_images, 7);
    assert_eq!(report.val_images, 3);
    assert!(report.groups.is_empty());

    let layout = SplitLayout::new(&out);
    let train: BTreeSet<_> = names_in(&layout.train().images_dir()).into_iter().collect();
    let val: BTreeSet<_> = names_in(&layout.val().images_dir()).into_iter().collect();
    let all: BTreeSet<_> = names_in(&source.images_dir()).into_iter().collect();
    assert!(train.is_disjoint(&val));
    assert_eq!(train.union(&val).cloned().collect::<BTreeSet<_>>(), all);

    // labels follow their images
    assert_eq!(stems_in(&layout.train().labels_dir()), stems_in(&layout.train().images_dir()));
    assert_eq!(stems_in(&layout.val().labels_dir()), stems_in(&layout.val().images_dir()));
}

#[test]
fn uniform_counts_follow_floor_for_many_sizes() {
    for m in [1usize, 2, 3, 9, 12, 17] {
        let dir = temp_dir();
        let source = make_class_corpus(&dir.path().join("aug"), &[(0, m)]);
        let report = run(&Splitter::new(SplitPolicy::Uniform), &source, &dir.path().join("split"), 1);
        assert_eq!(report.train_images, split_index(m, 0.7), "m={}", m);
        assert_eq!(report.train_images + report.val_images, m);
    }
}

#[test]
fn stratified_keeps_rare_class_in_both_splits() {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 100), (1, 10)]);
    let report = run(&Splitter::new(SplitPolicy::Stratified), &source, &dir.path().join("split"), 42);

    assert_eq!(
        report.groups,
        vec![
            GroupSplit { group: SplitGroup::Class(0), train: 70, val: 30 },
            GroupSplit { group: SplitGroup::Class(1), train: 7, val: 3 },
        ]
    );
    assert_eq!(report.train_images, 77);
    assert_eq!(report.val_images, 33);

    // one box per file, so rescanned instances equal planned image counts
    assert_eq!(report.train_instances.get(&0), Some(&70));
    assert_eq!(report.train_instances.get(&1), Some(&7));
    assert_eq!(report.val_instances.get(&0), Some(&30));
    assert_eq!(report.val_instances.get(&1), Some(&3));
}

#[test]
fn stratified_excludes_unlabeled_by_default() -> anyhow::Result<()> {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 10)]);
    fs::write(source.image_path("bg_none.jpg"), b"x")?;
    fs::write(source.image_path("bg_empty.jpg"), b"x")?;
    fs::write(source.label_path("bg_empty"), "")?;

    let report = run(&Splitter::new(SplitPolicy::Stratified), &source, &dir.path().join("split"), 42);
    assert_eq!(report.excluded, 2);
    assert_eq!(report.train_images + report.val_images, 10);
    Ok(())
}

#[test]
fn background_policy_splits_unlabeled_as_a_group() -> anyhow::Result<()> {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 10)]);
    for i in 0..10 {
        fs::write(source.image_path(&format!("bg_{}.jpg", i)), b"x")?;
    }
    let splitter = Splitter::new(SplitPolicy::Stratified).with_unlabeled_policy(UnlabeledPolicy::Background);
    let report = run(&splitter, &source, &dir.path().join("split"), 42);

    assert_eq!(report.excluded, 0);
    assert_eq!(
        report.groups.last(),
        Some(&GroupSplit { group: SplitGroup::Background, train: 7, val: 3 })
    );
    assert_eq!(report.train_images, 14);
    assert_eq!(report.val_images, 6);
    Ok(())
}

#[test]
fn per_class_ratio_holds_for_uneven_groups() {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 13), (1, 4), (2, 29)]);
    let report = run(&Splitter::new(SplitPolicy::Stratified), &source, &dir.path().join("split"), 9);
    for g in &report.groups {
        let total = g.train + g.val;
        let ideal = total as f64 * 0.7;
        assert!((g.train as f64 - ideal).abs() < 1.0, "{:?}", g);
    }
}

#[test]
fn both_policies_clear_previous_output() -> anyhow::Result<()> {
    for policy in [SplitPolicy::Uniform, SplitPolicy::Stratified] {
        let dir = temp_dir();
        let source = make_class_corpus(&dir.path().join("aug"), &[(0, 5)]);
        let out = dir.path().join("split");
        let layout = SplitLayout::new(&out);
        layout.train().create()?;
        layout.val().create()?;
        fs::write(layout.train().image_path("old.jpg"), b"old")?;
        fs::write(layout.val().label_path("old"), "3 0.5 0.5 0.1 0.1\n")?;

        let report = run(&Splitter::new(policy), &source, &out, 42);
        assert_eq!(report.train_images + report.val_images, 5);
        assert!(!layout.train().image_path("old.jpg").exists());
        assert!(report.val_instances.get(&3).is_none());
    }
    Ok(())
}

#[test]
fn same_seed_gives_same_membership() {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 20), (1, 20)]);
    for policy in [SplitPolicy::Uniform, SplitPolicy::Stratified] {
        run(&Splitter::new(policy), &source, &dir.path().join("s1"), 42);
        run(&Splitter::new(policy), &source, &dir.path().join("s2"), 42);
        assert_eq!(snapshot(&dir.path().join("s1")), snapshot(&dir.path().join("s2")));
    }
}

#[test]
fn custom_ratio_is_respected() {
    let dir = temp_dir();
    let source = make_class_corpus(&dir.path().join("aug"), &[(0, 10)]);
    let splitter = Splitter::new(SplitPolicy::Uniform).with_train_ratio(0.5);
    let report = run(&splitter, &source, &dir.path().join("split"), 42);
    assert_eq!((report.train_images, report.val_images), (5, 5));
}
