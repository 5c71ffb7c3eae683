use super::{
    check_probability, check_train_random_shapes, default_train_random_shapes,
    input_channel_deprecation, report_deprecations, yolov3_anchor_masks, yolov3_anchors,
    ComposeBatchTransforms, Nms,
};
use crate::{
    common::*,
    config::{Anchor, Metric, ModelConfig},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum YoloV3Backbone {
    MobileNetV1,
    #[serde(rename = "MobileNetV1_ssld")]
    #[strum(serialize = "MobileNetV1_ssld")]
    MobileNetV1Ssld,
    MobileNetV3,
    #[serde(rename = "MobileNetV3_ssld")]
    #[strum(serialize = "MobileNetV3_ssld")]
    MobileNetV3Ssld,
    DarkNet53,
    #[serde(rename = "ResNet50_vd_dcn")]
    #[strum(serialize = "ResNet50_vd_dcn")]
    ResNet50VdDcn,
    ResNet34,
}

impl Default for YoloV3Backbone {
    fn default() -> Self {
        Self::MobileNetV1
    }
}

/// YOLOv3 constructor options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoloV3Init {
    pub num_classes: usize,
    pub backbone: YoloV3Backbone,
    pub anchors: Option<Vec<Anchor>>,
    pub anchor_masks: Option<Vec<Vec<usize>>>,
    pub downsample_ratios: Option<Vec<usize>>,
    pub num_max_boxes: Option<usize>,
    pub ignore_threshold: R64,
    pub nms_score_threshold: R64,
    pub nms_topk: usize,
    pub nms_keep_topk: usize,
    pub nms_iou_threshold: R64,
    pub label_smooth: bool,
    pub train_random_shapes: Vec<usize>,
    pub metric: Metric,
    /// Deprecated. The input always has 3 channels.
    pub input_channel: Option<usize>,
}

impl Default for YoloV3Init {
    fn default() -> Self {
        Self {
            num_classes: 80,
            backbone: YoloV3Backbone::default(),
            anchors: None,
            anchor_masks: None,
            downsample_ratios: None,
            num_max_boxes: None,
            ignore_threshold: r64(0.7),
            nms_score_threshold: r64(0.01),
            nms_topk: 1000,
            nms_keep_topk: 100,
            nms_iou_threshold: r64(0.45),
            label_smooth: false,
            train_random_shapes: default_train_random_shapes(),
            metric: Metric::default(),
            input_channel: None,
        }
    }
}

impl YoloV3Init {
    pub fn deprecations(&self) -> Vec<String> {
        input_channel_deprecation(self.input_channel)
            .into_iter()
            .collect()
    }

    pub fn build(self) -> Result<YoloV3> {
        report_deprecations("YOLOv3", &self.deprecations());

        let Self {
            num_classes,
            backbone,
            anchors,
            anchor_masks,
            downsample_ratios,
            num_max_boxes,
            ignore_threshold,
            nms_score_threshold,
            nms_topk,
            nms_keep_topk,
            nms_iou_threshold,
            label_smooth,
            train_random_shapes,
            metric,
            input_channel: _,
        } = self;

        ensure!(num_classes >= 1, "num_classes must be at least 1");
        check_probability("ignore_threshold", ignore_threshold)?;
        check_probability("nms_score_threshold", nms_score_threshold)?;
        check_probability("nms_iou_threshold", nms_iou_threshold)?;
        check_train_random_shapes(&train_random_shapes)?;
        if let Some(num_max_boxes) = num_max_boxes {
            ensure!(num_max_boxes >= 1, "num_max_boxes must be at least 1");
        }

        let model = ModelConfig {
            num_classes,
            anchors: anchors.unwrap_or_else(yolov3_anchors),
            anchor_masks: anchor_masks.unwrap_or_else(yolov3_anchor_masks),
            downsample_ratios,
            num_max_boxes,
            metric,
            train_random_shapes,
        };
        model.check_heads()?;

        Ok(YoloV3 {
            backbone,
            model,
            ignore_threshold,
            nms: Nms {
                score_threshold: nms_score_threshold,
                topk: nms_topk,
                keep_topk: nms_keep_topk,
                iou_threshold: nms_iou_threshold,
            },
            label_smooth,
        })
    }
}

/// The YOLOv3 detector.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloV3 {
    pub backbone: YoloV3Backbone,
    pub model: ModelConfig,
    pub ignore_threshold: R64,
    pub nms: Nms,
    pub label_smooth: bool,
}

impl ComposeBatchTransforms for YoloV3 {
    fn model_config(&self) -> &ModelConfig {
        &self.model
    }
}
