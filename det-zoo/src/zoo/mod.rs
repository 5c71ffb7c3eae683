//! Detector constructors with deprecation-aware options.

mod faster_rcnn;
mod ppyolo;
mod yolov3;

pub use faster_rcnn::*;
pub use ppyolo::*;
pub use yolov3::*;

use crate::{
    common::*,
    config::{Anchor, Mode, ModelConfig},
    error::PipelineError,
    pipeline::BatchPipeline,
    transform::BatchTransform,
};

/// Models whose batch pipelines are assembled by the YOLO batch composer.
pub trait ComposeBatchTransforms {
    fn model_config(&self) -> &ModelConfig;

    fn compose_batch_transforms(
        &self,
        custom_transforms: &[BatchTransform],
        mode: Mode,
    ) -> Result<BatchPipeline, PipelineError> {
        crate::pipeline::compose_batch_transforms(self.model_config(), custom_transforms, mode)
    }
}

/// The detector description stored in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DetectorConfig {
    YoloV3(YoloV3Init),
    PpYolo(PpYoloInit),
    FasterRcnn(FasterRcnnInit),
}

impl DetectorConfig {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }

    /// Notes about options that are set but no longer take effect.
    pub fn deprecations(&self) -> Vec<String> {
        match self {
            Self::YoloV3(init) => init.deprecations(),
            Self::PpYolo(init) => init.deprecations(),
            Self::FasterRcnn(init) => init.deprecations(),
        }
    }

    pub fn build(self) -> Result<Detector> {
        let detector = match self {
            Self::YoloV3(init) => Detector::YoloV3(init.build()?),
            Self::PpYolo(init) => Detector::PpYolo(init.build()?),
            Self::FasterRcnn(init) => Detector::FasterRcnn(init.build()?),
        };
        Ok(detector)
    }
}

/// A constructed detector.
#[derive(Debug, Clone, PartialEq)]
pub enum Detector {
    YoloV3(YoloV3),
    PpYolo(PpYolo),
    FasterRcnn(FasterRcnn),
}

impl Detector {
    pub fn name(&self) -> &'static str {
        match self {
            Self::YoloV3(_) => "YOLOv3",
            Self::PpYolo(_) => "PPYOLO",
            Self::FasterRcnn(_) => "FasterRCNN",
        }
    }

    pub fn backbone(&self) -> &str {
        match self {
            Self::YoloV3(model) => model.backbone.as_ref(),
            Self::PpYolo(model) => model.backbone.as_ref(),
            Self::FasterRcnn(model) => model.backbone.as_ref(),
        }
    }

    /// The YOLO head metadata, if the detector has one.
    pub fn model_config(&self) -> Option<&ModelConfig> {
        match self {
            Self::YoloV3(model) => Some(model.model_config()),
            Self::PpYolo(model) => Some(model.model_config()),
            Self::FasterRcnn(_) => None,
        }
    }

    pub fn compose_batch_transforms(
        &self,
        custom_transforms: &[BatchTransform],
        mode: Mode,
    ) -> Result<BatchPipeline> {
        let pipeline = match self {
            Self::YoloV3(model) => model.compose_batch_transforms(custom_transforms, mode)?,
            Self::PpYolo(model) => model.compose_batch_transforms(custom_transforms, mode)?,
            Self::FasterRcnn(_) => bail!(
                "{} does not use the YOLO batch composer",
                self.name()
            ),
        };
        Ok(pipeline)
    }
}

/// Non-maximum suppression options of YOLO heads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nms {
    pub score_threshold: R64,
    pub topk: usize,
    pub keep_topk: usize,
    pub iou_threshold: R64,
}

/// The nine anchors of the three-head YOLOv3 layout.
pub fn yolov3_anchors() -> Vec<Anchor> {
    vec![
        (10, 13),
        (16, 30),
        (33, 23),
        (30, 61),
        (62, 45),
        (59, 119),
        (116, 90),
        (156, 198),
        (373, 326),
    ]
}

pub fn yolov3_anchor_masks() -> Vec<Vec<usize>> {
    vec![vec![6, 7, 8], vec![3, 4, 5], vec![0, 1, 2]]
}

/// Square input sizes from 320 to 608 in steps of 32.
pub fn default_train_random_shapes() -> Vec<usize> {
    (320..=608).step_by(32).collect()
}

fn input_channel_deprecation(input_channel: Option<usize>) -> Option<String> {
    input_channel.map(|_| {
        "`input_channel` is deprecated and won't take effect. Defaults to 3.".to_string()
    })
}

fn report_deprecations(model: &str, deprecations: &[String]) {
    deprecations
        .iter()
        .for_each(|note| warn!("{}: {}", model, note));
}

fn check_probability(name: &str, value: R64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value.raw()),
        "{} must be within [0, 1], but get {}",
        name,
        value
    );
    Ok(())
}

fn check_train_random_shapes(shapes: &[usize]) -> Result<()> {
    ensure!(!shapes.is_empty(), "train_random_shapes must not be empty");
    ensure!(
        shapes.iter().all(|&size| size > 0),
        "train_random_shapes must be positive, but get {:?}",
        shapes
    );
    Ok(())
}
