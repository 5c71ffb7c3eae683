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
pub enum PpYoloBackbone {
    /// Accepted for compatibility and replaced by [PpYoloBackbone::ResNet50VdDcn].
    #[serde(rename = "ResNet50_vd_ssld")]
    #[strum(serialize = "ResNet50_vd_ssld")]
    ResNet50VdSsld,
    #[serde(rename = "ResNet50_vd_dcn")]
    #[strum(serialize = "ResNet50_vd_dcn")]
    ResNet50VdDcn,
    #[serde(rename = "ResNet18_vd")]
    #[strum(serialize = "ResNet18_vd")]
    ResNet18Vd,
    #[serde(rename = "MobileNetV3_large")]
    #[strum(serialize = "MobileNetV3_large")]
    MobileNetV3Large,
    #[serde(rename = "MobileNetV3_small")]
    #[strum(serialize = "MobileNetV3_small")]
    MobileNetV3Small,
}

impl Default for PpYoloBackbone {
    fn default() -> Self {
        Self::ResNet50VdSsld
    }
}

/// Anchors, masks and strides of a detection head layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadLayout {
    pub anchors: Vec<Anchor>,
    pub anchor_masks: Vec<Vec<usize>>,
    pub downsample_ratios: Vec<usize>,
}

impl PpYoloBackbone {
    /// The default head layout of the backbone, built fresh on each call.
    pub fn head_layout(self) -> HeadLayout {
        match self {
            Self::ResNet50VdSsld | Self::ResNet50VdDcn => HeadLayout {
                anchors: yolov3_anchors(),
                anchor_masks: yolov3_anchor_masks(),
                downsample_ratios: vec![32, 16, 8],
            },
            Self::ResNet18Vd => HeadLayout {
                anchors: vec![(10, 14), (23, 27), (37, 58), (81, 82), (135, 169), (344, 319)],
                anchor_masks: vec![vec![3, 4, 5], vec![0, 1, 2]],
                downsample_ratios: vec![32, 16],
            },
            Self::MobileNetV3Large | Self::MobileNetV3Small => HeadLayout {
                anchors: vec![(11, 18), (34, 47), (51, 126), (115, 71), (120, 195), (254, 235)],
                anchor_masks: vec![vec![3, 4, 5], vec![0, 1, 2]],
                downsample_ratios: vec![32, 16],
            },
        }
    }
}

/// PPYOLO constructor options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PpYoloInit {
    pub num_classes: usize,
    pub backbone: PpYoloBackbone,
    /// Deprecated. Pick the `ResNet50_vd_dcn` backbone instead.
    pub with_dcn_v2: Option<bool>,
    pub anchors: Option<Vec<Anchor>>,
    pub anchor_masks: Option<Vec<Vec<usize>>>,
    pub downsample_ratios: Option<Vec<usize>>,
    pub num_max_boxes: Option<usize>,
    pub use_coord_conv: bool,
    pub use_iou_aware: bool,
    pub use_spp: bool,
    pub use_drop_block: bool,
    pub scale_x_y: R64,
    pub ignore_threshold: R64,
    pub label_smooth: bool,
    pub use_iou_loss: bool,
    pub use_matrix_nms: bool,
    pub nms_score_threshold: R64,
    pub nms_topk: usize,
    pub nms_keep_topk: usize,
    pub nms_iou_threshold: R64,
    pub train_random_shapes: Vec<usize>,
    pub metric: Metric,
    /// Deprecated. The input always has 3 channels.
    pub input_channel: Option<usize>,
}

impl Default for PpYoloInit {
    fn default() -> Self {
        Self {
            num_classes: 80,
            backbone: PpYoloBackbone::default(),
            with_dcn_v2: None,
            anchors: None,
            anchor_masks: None,
            downsample_ratios: None,
            num_max_boxes: None,
            use_coord_conv: true,
            use_iou_aware: true,
            use_spp: true,
            use_drop_block: true,
            scale_x_y: r64(1.05),
            ignore_threshold: r64(0.7),
            label_smooth: false,
            use_iou_loss: true,
            use_matrix_nms: true,
            nms_score_threshold: r64(0.01),
            nms_topk: 1000,
            nms_keep_topk: 100,
            nms_iou_threshold: r64(0.45),
            train_random_shapes: default_train_random_shapes(),
            metric: Metric::default(),
            input_channel: None,
        }
    }
}

impl PpYoloInit {
    pub fn deprecations(&self) -> Vec<String> {
        let with_dcn_v2 = self.with_dcn_v2.map(|_| {
            "`with_dcn_v2` is deprecated and will not take effect. \
             To use backbone with deformable convolutional networks, please specify it in `backbone`. \
             Currently the only backbone with dcn is 'ResNet50_vd_dcn'."
                .to_string()
        });
        chain!(with_dcn_v2, input_channel_deprecation(self.input_channel)).collect()
    }

    pub fn build(self) -> Result<PpYolo> {
        report_deprecations("PPYOLO", &self.deprecations());

        let Self {
            num_classes,
            backbone,
            with_dcn_v2: _,
            anchors,
            anchor_masks,
            downsample_ratios,
            num_max_boxes,
            use_coord_conv,
            use_iou_aware,
            use_spp,
            use_drop_block,
            scale_x_y,
            ignore_threshold,
            label_smooth,
            use_iou_loss,
            use_matrix_nms,
            nms_score_threshold,
            nms_topk,
            nms_keep_topk,
            nms_iou_threshold,
            train_random_shapes,
            metric,
            input_channel: _,
        } = self;

        let backbone = match backbone {
            PpYoloBackbone::ResNet50VdSsld => {
                debug!(
                    "PPYOLO backbone {} is replaced by {}",
                    PpYoloBackbone::ResNet50VdSsld,
                    PpYoloBackbone::ResNet50VdDcn
                );
                PpYoloBackbone::ResNet50VdDcn
            }
            backbone => backbone,
        };

        ensure!(num_classes >= 1, "num_classes must be at least 1");
        ensure!(scale_x_y.raw() > 0.0, "scale_x_y must be positive");
        check_probability("ignore_threshold", ignore_threshold)?;
        check_probability("nms_score_threshold", nms_score_threshold)?;
        check_probability("nms_iou_threshold", nms_iou_threshold)?;
        check_train_random_shapes(&train_random_shapes)?;
        if let Some(num_max_boxes) = num_max_boxes {
            ensure!(num_max_boxes >= 1, "num_max_boxes must be at least 1");
        }

        let layout = backbone.head_layout();
        let model = ModelConfig {
            num_classes,
            anchors: anchors.unwrap_or(layout.anchors),
            anchor_masks: anchor_masks.unwrap_or(layout.anchor_masks),
            downsample_ratios: Some(downsample_ratios.unwrap_or(layout.downsample_ratios)),
            num_max_boxes,
            metric,
            train_random_shapes,
        };
        model.check_heads()?;

        Ok(PpYolo {
            backbone,
            model,
            head: PpYoloHead {
                use_coord_conv,
                use_iou_aware,
                use_spp,
                use_drop_block,
                scale_x_y,
                ignore_threshold,
                label_smooth,
                use_iou_loss,
                use_matrix_nms,
            },
            nms: Nms {
                score_threshold: nms_score_threshold,
                topk: nms_topk,
                keep_topk: nms_keep_topk,
                iou_threshold: nms_iou_threshold,
            },
        })
    }
}

/// Head and loss switches of PPYOLO.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PpYoloHead {
    pub use_coord_conv: bool,
    pub use_iou_aware: bool,
    pub use_spp: bool,
    pub use_drop_block: bool,
    pub scale_x_y: R64,
    pub ignore_threshold: R64,
    pub label_smooth: bool,
    pub use_iou_loss: bool,
    pub use_matrix_nms: bool,
}

/// The PPYOLO detector.
#[derive(Debug, Clone, PartialEq)]
pub struct PpYolo {
    pub backbone: PpYoloBackbone,
    pub model: ModelConfig,
    pub head: PpYoloHead,
    pub nms: Nms,
}

impl ComposeBatchTransforms for PpYolo {
    fn model_config(&self) -> &ModelConfig {
        &self.model
    }
}
