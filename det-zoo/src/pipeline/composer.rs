//! Merges caller operators with the defaults of a mode.

use super::{batch::BatchPipeline, defaults::default_batch_transforms};
use crate::{
    common::*,
    config::{Metric, Mode, ModelConfig},
    error::PipelineError,
    transform::{BatchTransform, Interp, RandomResize},
};

/// Builds the batch pipeline of `mode`.
///
/// Resize operators in `custom_transforms` are only accepted for training and
/// are moved ahead of the other custom operators, keeping their relative
/// order. Training without a custom resize operator gets a random resize over
/// `train_random_shapes` in front of the defaults. Custom operators always
/// precede the defaults. The input slice is cloned, never modified.
pub fn compose_batch_transforms(
    config: &ModelConfig,
    custom_transforms: &[BatchTransform],
    mode: Mode,
) -> Result<BatchPipeline, PipelineError> {
    config.check_heads()?;

    let mut resize_transforms = vec![];
    let mut other_transforms = vec![];

    for op in custom_transforms {
        if op.is_random_resize() {
            if mode != Mode::Train {
                return Err(PipelineError::Configuration {
                    kind: op.kind(),
                    mode,
                });
            }
            resize_transforms.push(op.clone());
        } else {
            other_transforms.push(op.clone());
        }
    }

    let mut default_transforms = default_batch_transforms(config, mode);
    if mode == Mode::Train && resize_transforms.is_empty() {
        if config.train_random_shapes.is_empty() {
            return Err(PipelineError::InvariantViolation(
                "train_random_shapes must not be empty".into(),
            ));
        }
        default_transforms.insert(
            0,
            RandomResize {
                target_sizes: config.train_random_shapes.clone(),
                interpolation: Interp::Random,
            }
            .into(),
        );
    }

    let collate = !(mode == Mode::Eval && config.metric == Metric::Voc);
    let operators: Vec<_> = chain!(resize_transforms, other_transforms, default_transforms).collect();

    debug!(
        "compose {} batch transforms [{}], collate = {}",
        mode,
        operators.iter().map(|op| op.kind()).join(", "),
        collate
    );

    Ok(BatchPipeline::new(operators, collate))
}
