use super::{input_channel_deprecation, report_deprecations};
use crate::common::*;
use serde_json::Value;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum FasterRcnnBackbone {
    ResNet50,
    #[serde(rename = "ResNet50_vd")]
    #[strum(serialize = "ResNet50_vd")]
    ResNet50Vd,
    #[serde(rename = "ResNet50_vd_ssld")]
    #[strum(serialize = "ResNet50_vd_ssld")]
    ResNet50VdSsld,
    ResNet34,
    #[serde(rename = "ResNet34_vd")]
    #[strum(serialize = "ResNet34_vd")]
    ResNet34Vd,
    ResNet101,
    #[serde(rename = "ResNet101_vd")]
    #[strum(serialize = "ResNet101_vd")]
    ResNet101Vd,
    #[serde(rename = "HRNet_W18")]
    #[strum(serialize = "HRNet_W18")]
    HrNetW18,
}

impl Default for FasterRcnnBackbone {
    fn default() -> Self {
        Self::ResNet50
    }
}

/// Anchor sizes given either one per level or as a list per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorSizes {
    Flat(Vec<usize>),
    Nested(Vec<Vec<usize>>),
}

impl AnchorSizes {
    pub fn into_nested(self) -> Vec<Vec<usize>> {
        match self {
            Self::Flat(sizes) => sizes.into_iter().map(|size| vec![size]).collect(),
            Self::Nested(sizes) => sizes,
        }
    }
}

impl Default for AnchorSizes {
    fn default() -> Self {
        Self::Flat(vec![32, 64, 128, 256, 512])
    }
}

/// Faster R-CNN constructor options.
///
/// The deprecated options accept any value and are only reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FasterRcnnInit {
    /// Number of classes including the background.
    pub num_classes: usize,
    pub backbone: FasterRcnnBackbone,
    pub with_fpn: bool,
    pub aspect_ratios: Vec<R64>,
    pub anchor_sizes: AnchorSizes,
    pub with_dcn: Option<Value>,
    pub rpn_cls_loss: Option<Value>,
    pub rpn_focal_loss_alpha: Option<Value>,
    pub rpn_focal_loss_gamma: Option<Value>,
    pub rcnn_bbox_loss: Option<Value>,
    pub rcnn_nms: Option<Value>,
    pub keep_top_k: usize,
    pub nms_threshold: R64,
    pub score_threshold: R64,
    pub softnms_sigma: Option<Value>,
    pub bbox_assigner: Option<Value>,
    pub fpn_num_channels: usize,
    pub input_channel: Option<usize>,
    pub rpn_batch_size_per_im: usize,
    pub rpn_fg_fraction: R64,
    pub test_pre_nms_top_n: Option<usize>,
    pub test_post_nms_top_n: usize,
}

impl Default for FasterRcnnInit {
    fn default() -> Self {
        Self {
            num_classes: 81,
            backbone: FasterRcnnBackbone::default(),
            with_fpn: true,
            aspect_ratios: vec![r64(0.5), r64(1.0), r64(2.0)],
            anchor_sizes: AnchorSizes::default(),
            with_dcn: None,
            rpn_cls_loss: None,
            rpn_focal_loss_alpha: None,
            rpn_focal_loss_gamma: None,
            rcnn_bbox_loss: None,
            rcnn_nms: None,
            keep_top_k: 100,
            nms_threshold: r64(0.5),
            score_threshold: r64(0.05),
            softnms_sigma: None,
            bbox_assigner: None,
            fpn_num_channels: 256,
            input_channel: None,
            rpn_batch_size_per_im: 256,
            rpn_fg_fraction: r64(0.5),
            test_pre_nms_top_n: None,
            test_post_nms_top_n: 1000,
        }
    }
}

impl FasterRcnnInit {
    pub fn deprecations(&self) -> Vec<String> {
        let mut notes = vec![];

        if self.with_dcn.is_some() {
            notes.push("`with_dcn` is deprecated and won't take effect. Defaults to false.".into());
        }
        if self.rpn_cls_loss.is_some() {
            notes.push(
                "`rpn_cls_loss` is deprecated and won't take effect. \
                 Defaults to 'SigmoidCrossEntropy'."
                    .into(),
            );
        }
        if self.rpn_focal_loss_alpha.is_some() || self.rpn_focal_loss_gamma.is_some() {
            notes.push(
                "Focal loss is deprecated. \
                 `rpn_focal_loss_alpha` and `rpn_focal_loss_gamma` won't take effect."
                    .into(),
            );
        }
        if self.rcnn_bbox_loss.is_some() {
            notes.push(
                "`rcnn_bbox_loss` is deprecated and won't take effect. Defaults to 'SmoothL1Loss'."
                    .into(),
            );
        }
        if self.rcnn_nms.is_some() {
            notes.push(
                "MultiClassSoftNMS is deprecated. `rcnn_nms` and `softnms_sigma` won't take effect. \
                 MultiClassNMS will be used by default."
                    .into(),
            );
        }
        if self.bbox_assigner.is_some() {
            notes.push(
                "`bbox_assigner` is deprecated and won't take effect. Defaults to 'BBoxAssigner'."
                    .into(),
            );
        }
        notes.extend(input_channel_deprecation(self.input_channel));

        notes
    }

    pub fn build(self) -> Result<FasterRcnn> {
        report_deprecations("FasterRCNN", &self.deprecations());

        let Self {
            num_classes,
            backbone,
            with_fpn,
            aspect_ratios,
            anchor_sizes,
            keep_top_k,
            nms_threshold,
            score_threshold,
            fpn_num_channels,
            rpn_batch_size_per_im,
            rpn_fg_fraction,
            test_pre_nms_top_n,
            test_post_nms_top_n,
            ..
        } = self;

        ensure!(
            num_classes >= 2,
            "num_classes must count the background and at least one class, but get {}",
            num_classes
        );
        ensure!(
            !aspect_ratios.is_empty() && aspect_ratios.iter().all(|&ratio| ratio.raw() > 0.0),
            "aspect_ratios must be non-empty and positive"
        );
        let anchor_sizes = anchor_sizes.into_nested();
        ensure!(
            !anchor_sizes.is_empty()
                && anchor_sizes
                    .iter()
                    .all(|level| !level.is_empty() && level.iter().all(|&size| size > 0)),
            "anchor_sizes must be non-empty and positive"
        );
        ensure!(
            (0.0..=1.0).contains(&rpn_fg_fraction.raw()),
            "rpn_fg_fraction must be within [0, 1]"
        );

        Ok(FasterRcnn {
            backbone,
            num_classes: num_classes - 1,
            with_fpn,
            aspect_ratios,
            anchor_sizes,
            keep_top_k,
            nms_threshold,
            score_threshold,
            fpn_num_channels,
            rpn_batch_size_per_im,
            rpn_fg_fraction,
            test_pre_nms_top_n,
            test_post_nms_top_n,
        })
    }
}

/// The Faster R-CNN detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FasterRcnn {
    pub backbone: FasterRcnnBackbone,
    /// Number of foreground classes.
    pub num_classes: usize,
    pub with_fpn: bool,
    pub aspect_ratios: Vec<R64>,
    pub anchor_sizes: Vec<Vec<usize>>,
    pub keep_top_k: usize,
    pub nms_threshold: R64,
    pub score_threshold: R64,
    pub fpn_num_channels: usize,
    pub rpn_batch_size_per_im: usize,
    pub rpn_fg_fraction: R64,
    pub test_pre_nms_top_n: Option<usize>,
    pub test_post_nms_top_n: usize,
}
