//! Batch-level preprocessing operators.

mod batch_pad;
mod box_format;
mod grid_target;
mod normalize_box;
mod pad_box;
mod random_resize;
mod resample;

pub use batch_pad::*;
pub use box_format::*;
pub use grid_target::*;
pub use normalize_box::*;
pub use pad_box::*;
pub use random_resize::*;
pub use resample::*;

use crate::{common::*, sample::Sample};

/// A batch operator. The set of kinds is closed.
///
/// In configuration files the operator is tagged by `kind`, e.g.
/// `{ kind: "RandomResize", target_sizes: [320, 416], interpolation: "RANDOM" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "kind")]
#[strum_discriminants(name(TransformKind), derive(Hash, Display, EnumString, EnumIter))]
pub enum BatchTransform {
    RandomResize(RandomResize),
    RandomResizeByShort(RandomResizeByShort),
    BatchPad(BatchPad),
    NormalizeBox,
    PadBox(PadBox),
    BoxFormatConvert(BoxFormatConvert),
    GenerateGridTargets(GenerateGridTargets),
}

impl BatchTransform {
    pub fn kind(&self) -> TransformKind {
        self.into()
    }

    /// Returns true for operators that pick a new input size per batch.
    pub fn is_random_resize(&self) -> bool {
        match self.kind() {
            TransformKind::RandomResize | TransformKind::RandomResizeByShort => true,
            TransformKind::BatchPad
            | TransformKind::NormalizeBox
            | TransformKind::PadBox
            | TransformKind::BoxFormatConvert
            | TransformKind::GenerateGridTargets => false,
        }
    }

    /// Runs the operator on a batch in place.
    pub fn forward<R>(&self, samples: &mut [Sample], rng: &mut R) -> Result<()>
    where
        R: Rng,
    {
        let result = match self {
            Self::RandomResize(op) => op.forward(samples, rng),
            Self::RandomResizeByShort(op) => op.forward(samples, rng),
            Self::BatchPad(op) => op.forward(samples),
            Self::NormalizeBox => NormalizeBox.forward(samples),
            Self::PadBox(op) => op.forward(samples),
            Self::BoxFormatConvert(op) => op.forward(samples),
            Self::GenerateGridTargets(op) => op.forward(samples),
        };
        result.with_context(|| format!("{} failed", self.kind()))
    }
}

impl From<RandomResize> for BatchTransform {
    fn from(op: RandomResize) -> Self {
        Self::RandomResize(op)
    }
}

impl From<RandomResizeByShort> for BatchTransform {
    fn from(op: RandomResizeByShort) -> Self {
        Self::RandomResizeByShort(op)
    }
}

impl From<BatchPad> for BatchTransform {
    fn from(op: BatchPad) -> Self {
        Self::BatchPad(op)
    }
}

impl From<NormalizeBox> for BatchTransform {
    fn from(_: NormalizeBox) -> Self {
        Self::NormalizeBox
    }
}

impl From<PadBox> for BatchTransform {
    fn from(op: PadBox) -> Self {
        Self::PadBox(op)
    }
}

impl From<BoxFormatConvert> for BatchTransform {
    fn from(op: BoxFormatConvert) -> Self {
        Self::BoxFormatConvert(op)
    }
}

impl From<GenerateGridTargets> for BatchTransform {
    fn from(op: GenerateGridTargets) -> Self {
        Self::GenerateGridTargets(op)
    }
}

/// Reads a JSON5 list of operators.
pub fn load_transforms<P>(path: P) -> Result<Vec<BatchTransform>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let transforms = json5::from_str(&text)
        .with_context(|| format!("failed to parse transforms in '{}'", path.display()))?;
    Ok(transforms)
}
