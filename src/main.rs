use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

use detprep::split::SplitGroup;
use detprep::{
    AugmentReport, Augmenter, DatasetDir, DatasetManifest, EmptyLabelMode, PrepConfig,
    SplitLayout, SplitPolicy, SplitReport, Splitter, UnlabeledPolicy,
};

#[derive(Parser)]
#[command(name = "detprep")]
#[command(about = "Augment and split object-detection datasets")]
struct Cli {
    /// YAML config file (missing keys use defaults)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for every random draw
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Image extensions to pick up, comma separated
    #[arg(long = "ext", global = true, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write originals plus transformed copies into a new dataset
    Augment {
        #[arg(value_name = "SRC")]
        source: PathBuf,
        #[arg(value_name = "OUT")]
        output: PathBuf,
        #[command(flatten)]
        opts: AugmentArgs,
    },
    /// Partition a dataset into train/ and val/
    Split {
        #[arg(value_name = "SRC")]
        source: PathBuf,
        #[arg(value_name = "OUT")]
        output: PathBuf,
        #[command(flatten)]
        opts: SplitArgs,
    },
    /// Augment, then split the augmented dataset
    Run {
        #[arg(value_name = "SRC")]
        source: PathBuf,
        #[arg(value_name = "AUG")]
        augmented: PathBuf,
        #[arg(value_name = "SPLIT")]
        split: PathBuf,
        #[command(flatten)]
        augment: AugmentArgs,
        #[command(flatten)]
        split_opts: SplitArgs,
    },
    /// Write data.yaml for an existing split
    Manifest {
        #[arg(value_name = "SPLIT")]
        split: PathBuf,
        /// Class names in id order, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        names: Vec<String>,
    },
}

#[derive(Args)]
struct AugmentArgs {
    /// Transformed copies per source image
    #[arg(short = 'n', long)]
    num_augmentations: Option<usize>,

    #[arg(long, value_enum)]
    empty_label_mode: Option<EmptyLabelMode>,

    /// Save every step's output to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

impl AugmentArgs {
    fn apply(&self, config: &mut PrepConfig) {
        if let Some(n) = self.num_augmentations {
            config.num_augmentations = n;
        }
        if let Some(mode) = self.empty_label_mode {
            config.empty_label_mode = mode;
        }
    }
}

#[derive(Args)]
struct SplitArgs {
    #[arg(long, value_enum)]
    policy: Option<SplitPolicy>,

    #[arg(long)]
    train_ratio: Option<f64>,

    #[arg(long, value_enum)]
    unlabeled_policy: Option<UnlabeledPolicy>,

    /// Class names in id order; writes data.yaml when given
    #[arg(long, value_delimiter = ',')]
    names: Vec<String>,
}

impl SplitArgs {
    fn apply(&self, config: &mut PrepConfig) {
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(ratio) = self.train_ratio {
            config.train_ratio = ratio;
        }
        if let Some(unlabeled) = self.unlabeled_policy {
            config.unlabeled_policy = unlabeled;
        }
        if !self.names.is_empty() {
            config.class_names = self.names.clone();
        }
    }
}

fn setup_logger(verbose: bool) {
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        builder.filter(None, LevelFilter::Warn);
        let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
        builder.filter(Some("detprep"), level);
    }

    builder.init();
}

fn build_augmenter(config: &PrepConfig, debug_out: Option<PathBuf>) -> anyhow::Result<Augmenter> {
    let mut augmenter = Augmenter::new(config.num_augmentations, config.empty_label_mode)
        .with_extensions(config.extensions.clone());
    if let Some(dir) = debug_out {
        augmenter = augmenter.with_debug(dir)?;
    }
    Ok(augmenter)
}

fn build_splitter(config: &PrepConfig) -> Splitter {
    Splitter::new(config.policy)
        .with_train_ratio(config.train_ratio)
        .with_unlabeled_policy(config.unlabeled_policy)
        .with_extensions(config.extensions.clone())
}

fn write_manifest(config: &PrepConfig, split_root: &Path) -> anyhow::Result<()> {
    if config.class_names.is_empty() {
        return Ok(());
    }
    let path = DatasetManifest::new(split_root, &config.class_names).write(split_root)?;
    println!("Dataset manifest: {}", path.display());
    Ok(())
}

fn print_augment_report(report: &AugmentReport, augmenter: &Augmenter, output: &Path) {
    println!("\n=== Augmentation Results ===");
    println!("Original images: {}", report.sources - report.skipped_sources);
    if report.skipped_sources > 0 {
        println!("Skipped (unreadable): {}", report.skipped_sources);
    }
    println!(
        "Augmented copies: {} ({} per image)",
        report.variants_written,
        augmenter.num_augmentations()
    );
    if report.variants_failed > 0 {
        println!("Failed variants: {}", report.variants_failed);
    }
    println!("Total images (original + augmented): {}", report.output_images);
    println!("Output: {}", output.display());
}

fn print_split_report(report: &SplitReport, output: &Path, class_names: &[String]) {
    let name = |id: u32| {
        class_names
            .get(id as usize)
            .map(|n| format!("{} ({})", id, n))
            .unwrap_or_else(|| id.to_string())
    };

    println!("\n=== Split Results ({:?}) ===", report.policy);
    if !report.groups.is_empty() {
        println!("Planned per group:");
        for g in &report.groups {
            let label = match g.group {
                SplitGroup::Class(id) => format!("Class {}", name(id)),
                SplitGroup::Background => "Background".to_string(),
            };
            println!("  {}: train={}, val={}", label, g.train, g.val);
        }
    }
    if report.excluded > 0 {
        println!("Excluded (no primary class): {}", report.excluded);
    }

    println!("Training images: {}", report.train_images);
    println!("Validation images: {}", report.val_images);

    if report.policy == SplitPolicy::Stratified {
        println!("\nTRAIN set class distribution:");
        for (id, count) in &report.train_instances {
            println!("  Class {}: {} instances", name(*id), count);
        }
        println!("\nVAL set class distribution:");
        for (id, count) in &report.val_instances {
            println!("  Class {}: {} instances", name(*id), count);
        }
    }
    println!("\nTrain: {}", output.join("train").display());
    println!("Val: {}", output.join("val").display());
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let mut config = PrepConfig::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if !cli.extensions.is_empty() {
        config.extensions = cli.extensions.clone();
    }

    match cli.command {
        Command::Augment { source, output, opts } => {
            opts.apply(&mut config);
            config.validate()?;
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

            let augmenter = build_augmenter(&config, opts.debug_out)?;
            let report = augmenter.run(&DatasetDir::new(&source), &DatasetDir::new(&output), &mut rng)?;
            print_augment_report(&report, &augmenter, &output);
        }
        Command::Split { source, output, opts } => {
            opts.apply(&mut config);
            config.validate()?;
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

            let report = build_splitter(&config).run(&DatasetDir::new(&source), &SplitLayout::new(&output), &mut rng)?;
            print_split_report(&report, &output, &config.class_names);
            write_manifest(&config, &output)?;
        }
        Command::Run { source, augmented, split, augment, split_opts } => {
            augment.apply(&mut config);
            split_opts.apply(&mut config);
            config.validate()?;
            // one random source for both stages
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

            let augmenter = build_augmenter(&config, augment.debug_out)?;
            let aug_report = augmenter.run(&DatasetDir::new(&source), &DatasetDir::new(&augmented), &mut rng)?;
            print_augment_report(&aug_report, &augmenter, &augmented);

            let split_report = build_splitter(&config).run(&DatasetDir::new(&augmented), &SplitLayout::new(&split), &mut rng)?;
            print_split_report(&split_report, &split, &config.class_names);
            write_manifest(&config, &split)?;
        }
        Command::Manifest { split, names } => {
            config.class_names = names;
            write_manifest(&config, &split)?;
        }
    }

    Ok(())
}
