use anyhow::{Context, Result};
use clap::Parser;
use det_zoo::{transform::load_transforms, DetectorConfig, Mode};
use log::info;
use prettytable::{cell, row, Table};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Parser)]
/// Inspect detector configurations and their batch pipelines.
enum Opts {
    /// Print the batch pipeline composed for a detector.
    Compose {
        /// detector configuration file
        config_file: PathBuf,
        /// custom batch transforms file
        #[clap(long)]
        transforms: Option<PathBuf>,
        /// dataset split, one of train, eval and predict
        #[clap(long, default_value = "train")]
        mode: Mode,
    },
    /// Print the detector summary.
    Info {
        /// detector configuration file
        config_file: PathBuf,
    },
    /// Remove downloaded official models.
    ClearCache {
        /// cache root directory
        #[clap(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Compose {
            config_file,
            transforms,
            mode,
        } => compose(config_file, transforms, mode)?,
        Opts::Info { config_file } => info(config_file)?,
        Opts::ClearCache { cache_dir } => clear_cache(cache_dir)?,
    }

    Ok(())
}

fn compose(
    config_file: impl AsRef<Path>,
    transforms_file: Option<impl AsRef<Path>>,
    mode: Mode,
) -> Result<()> {
    let detector = DetectorConfig::open(config_file)?.build()?;
    let transforms = match transforms_file {
        Some(path) => load_transforms(path)?,
        None => vec![],
    };
    let pipeline = detector.compose_batch_transforms(&transforms, mode)?;

    let mut table = Table::new();
    table.add_row(row!["index", "kind", "options"]);
    pipeline
        .operators()
        .iter()
        .enumerate()
        .try_for_each(|(index, op)| -> Result<_> {
            table.add_row(row![index, op.kind(), serde_json::to_string(op)?]);
            Ok(())
        })?;
    table.printstd();

    println!("collate: {}", pipeline.collate());
    Ok(())
}

fn info(config_file: impl AsRef<Path>) -> Result<()> {
    let config = DetectorConfig::open(config_file)?;
    let deprecations = config.deprecations();
    let detector = config.build()?;

    println!("model: {}", detector.name());
    println!("backbone: {}", detector.backbone());
    deprecations
        .iter()
        .for_each(|note| println!("deprecated: {}", note));

    if let Some(model) = detector.model_config() {
        let mut table = Table::new();
        table.add_row(row!["head", "downsample ratio", "anchors"]);
        model
            .anchor_masks
            .iter()
            .zip(model.downsample_ratios())
            .enumerate()
            .for_each(|(head, (mask, ratio))| {
                let anchors: Vec<_> = mask.iter().map(|&index| model.anchors[index]).collect();
                table.add_row(row![head, ratio, format!("{:?}", anchors)]);
            });
        table.printstd();

        println!("num_classes: {}", model.num_classes);
        println!("num_max_boxes: {}", model.num_max_boxes());
        println!("metric: {}", model.metric);
        println!("train_random_shapes: {:?}", model.train_random_shapes);
    }

    Ok(())
}

fn clear_cache(cache_dir: Option<PathBuf>) -> Result<()> {
    let cache_dir = match cache_dir {
        Some(dir) => dir,
        None => dirs::cache_dir()
            .context("unable to locate the cache directory")?
            .join("det-zoo"),
    };
    let models_dir = cache_dir.join("official_models");

    if models_dir.exists() {
        fs::remove_dir_all(&models_dir)
            .with_context(|| format!("failed to remove '{}'", models_dir.display()))?;
        info!("removed '{}'", models_dir.display());
    } else {
        info!("'{}' does not exist, nothing to clear", models_dir.display());
    }

    println!("Successfully cleared the cache.");
    Ok(())
}
