use crate::{common::*, sample::Sample};

/// Maps box coordinates into `[0, 1]` relative to the image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NormalizeBox;

impl NormalizeBox {
    pub fn forward(&self, samples: &mut [Sample]) -> Result<()> {
        samples.iter_mut().try_for_each(|sample| {
            let scale = Scale::try_normalizer([sample.height() as f32, sample.width() as f32])?;
            sample.scale_boxes(&scale);
            Ok(())
        })
    }
}
