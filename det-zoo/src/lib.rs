//! Detector zoo with the batch preprocessing pipelines of the YOLO family.

mod common;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sample;
pub mod transform;
pub mod zoo;

pub use config::{Anchor, Metric, Mode, ModelConfig};
pub use error::PipelineError;
pub use pipeline::{compose_batch_transforms, Batch, BatchPipeline, CollatedBatch};
pub use sample::{BoxFormat, Sample};
pub use transform::{BatchTransform, Interp, TransformKind};
pub use zoo::{ComposeBatchTransforms, Detector, DetectorConfig};
