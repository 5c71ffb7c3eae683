use crate::{
    config::{Mode, ModelConfig},
    transform::{BatchPad, BatchTransform, BoxFormatConvert, GenerateGridTargets, PadBox},
};

/// The baseline operators of a mode.
///
/// Training pads the batch, normalizes and pads the boxes, converts them to
/// center format and encodes grid targets. Evaluation and prediction only pad.
pub fn default_batch_transforms(config: &ModelConfig, mode: Mode) -> Vec<BatchTransform> {
    match mode {
        Mode::Train => vec![
            BatchPad { pad_to_stride: -1 }.into(),
            BatchTransform::NormalizeBox,
            PadBox {
                num_max_boxes: config.num_max_boxes(),
            }
            .into(),
            BoxFormatConvert::default().into(),
            GenerateGridTargets {
                anchor_masks: config.anchor_masks.clone(),
                anchors: config.anchors.clone(),
                downsample_ratios: config.downsample_ratios(),
                num_classes: config.num_classes,
            }
            .into(),
        ],
        Mode::Eval | Mode::Predict => vec![BatchPad { pad_to_stride: -1 }.into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Metric, transform::TransformKind};

    fn config() -> ModelConfig {
        ModelConfig {
            num_classes: 20,
            anchors: vec![(10, 14), (23, 27), (37, 58), (81, 82), (135, 169), (344, 319)],
            anchor_masks: vec![vec![3, 4, 5], vec![0, 1, 2]],
            downsample_ratios: Some(vec![32, 16]),
            num_max_boxes: Some(100),
            metric: Metric::Voc,
            train_random_shapes: vec![320, 352],
        }
    }

    #[test]
    fn train_defaults() {
        let transforms = default_batch_transforms(&config(), Mode::Train);
        let kinds: Vec<_> = transforms.iter().map(BatchTransform::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransformKind::BatchPad,
                TransformKind::NormalizeBox,
                TransformKind::PadBox,
                TransformKind::BoxFormatConvert,
                TransformKind::GenerateGridTargets,
            ]
        );
        assert_eq!(
            transforms[2],
            BatchTransform::PadBox(PadBox { num_max_boxes: 100 })
        );
        assert_eq!(
            transforms[4],
            BatchTransform::GenerateGridTargets(GenerateGridTargets {
                anchor_masks: vec![vec![3, 4, 5], vec![0, 1, 2]],
                anchors: config().anchors,
                downsample_ratios: vec![32, 16],
                num_classes: 20,
            })
        );
    }

    #[test]
    fn eval_and_predict_defaults() {
        [Mode::Eval, Mode::Predict].iter().for_each(|&mode| {
            assert_eq!(
                default_batch_transforms(&config(), mode),
                vec![BatchTransform::BatchPad(BatchPad { pad_to_stride: -1 })]
            );
        });
    }
}
