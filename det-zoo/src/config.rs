//! Static model metadata consumed by the batch pipeline composer.

use crate::{common::*, error::PipelineError};

/// A prior box size in pixels, stored as `(width, height)`.
pub type Anchor = (usize, usize);

/// The number of ground truth boxes kept per image when unset.
pub const DEFAULT_NUM_MAX_BOXES: usize = 50;

/// The conventional strides of three detection heads, coarsest first.
pub fn default_downsample_ratios() -> Vec<usize> {
    vec![32, 16, 8]
}

/// The evaluation metric of a model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Metric {
    Voc,
    Coco,
    Other,
}

impl Default for Metric {
    fn default() -> Self {
        Self::Coco
    }
}

/// The dataset split a pipeline is built for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    Train,
    Eval,
    Predict,
}

/// Per-model metadata. It is fixed when the model is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub num_classes: usize,
    pub anchors: Vec<Anchor>,
    /// Indices into `anchors`, one group per detection head.
    pub anchor_masks: Vec<Vec<usize>>,
    /// Strides per detection head. Falls back to [default_downsample_ratios].
    pub downsample_ratios: Option<Vec<usize>>,
    /// Falls back to [DEFAULT_NUM_MAX_BOXES].
    pub num_max_boxes: Option<usize>,
    pub metric: Metric,
    /// Candidate square input sizes for multi-scale training.
    pub train_random_shapes: Vec<usize>,
}

impl ModelConfig {
    pub fn downsample_ratios(&self) -> Vec<usize> {
        self.downsample_ratios
            .clone()
            .unwrap_or_else(default_downsample_ratios)
    }

    pub fn num_max_boxes(&self) -> usize {
        self.num_max_boxes.unwrap_or(DEFAULT_NUM_MAX_BOXES)
    }

    /// Checks that heads, masks and strides agree with each other.
    pub fn check_heads(&self) -> Result<(), PipelineError> {
        let num_masks = self.anchor_masks.len();
        let downsample_ratios = self.downsample_ratios();

        if num_masks != downsample_ratios.len() {
            return Err(PipelineError::InvariantViolation(format!(
                "the number of anchor masks ({}) does not match the number of downsample ratios ({})",
                num_masks,
                downsample_ratios.len()
            )));
        }

        if let Some(ratio) = downsample_ratios.iter().find(|&&ratio| ratio == 0) {
            return Err(PipelineError::InvariantViolation(format!(
                "downsample ratio must be positive, but get {}",
                ratio
            )));
        }

        let num_anchors = self.anchors.len();
        for (head, mask) in self.anchor_masks.iter().enumerate() {
            if let Some(&index) = mask.iter().find(|&&index| index >= num_anchors) {
                return Err(PipelineError::InvariantViolation(format!(
                    "anchor mask of head {} refers to anchor {}, but there are only {} anchors",
                    head, index, num_anchors
                )));
            }
            if !mask.iter().all_unique() {
                return Err(PipelineError::InvariantViolation(format!(
                    "anchor mask of head {} has duplicated indices {:?}",
                    head, mask
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yolov3_config() -> ModelConfig {
        ModelConfig {
            num_classes: 80,
            anchors: vec![
                (10, 13),
                (16, 30),
                (33, 23),
                (30, 61),
                (62, 45),
                (59, 119),
                (116, 90),
                (156, 198),
                (373, 326),
            ],
            anchor_masks: vec![vec![6, 7, 8], vec![3, 4, 5], vec![0, 1, 2]],
            downsample_ratios: None,
            num_max_boxes: None,
            metric: Metric::Coco,
            train_random_shapes: vec![320, 416, 512],
        }
    }

    #[test]
    fn fallback_values() {
        let config = yolov3_config();
        assert_eq!(config.downsample_ratios(), vec![32, 16, 8]);
        assert_eq!(config.num_max_boxes(), 50);
        assert!(config.check_heads().is_ok());
    }

    #[test]
    fn mismatched_heads() {
        let config = ModelConfig {
            downsample_ratios: Some(vec![32, 16]),
            ..yolov3_config()
        };
        assert!(matches!(
            config.check_heads(),
            Err(PipelineError::InvariantViolation(_))
        ));
    }

    #[test]
    fn out_of_range_mask() {
        let config = ModelConfig {
            anchor_masks: vec![vec![6, 7, 9], vec![3, 4, 5], vec![0, 1, 2]],
            ..yolov3_config()
        };
        assert!(config.check_heads().is_err());
    }

    #[test]
    fn parse_enums() {
        assert_eq!("voc".parse::<Metric>().unwrap(), Metric::Voc);
        assert_eq!(Metric::Coco.to_string(), "COCO");
        assert_eq!("eval".parse::<Mode>().unwrap(), Mode::Eval);
        assert_eq!(Mode::Predict.to_string(), "predict");
    }
}
