use crate::{common::*, sample::Sample};

/// Pads the images of a batch to a common size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchPad {
    /// Rounds the padded size up to a multiple of this stride.
    /// Non-positive values pad to the largest image of the batch.
    pub pad_to_stride: i64,
}

impl BatchPad {
    pub fn forward(&self, samples: &mut [Sample]) -> Result<()> {
        let channels = match samples.first() {
            Some(sample) => sample.channels(),
            None => return Ok(()),
        };
        ensure!(
            samples.iter().all(|sample| sample.channels() == channels),
            "all images in a batch must have the same number of channels"
        );

        let max_h = samples.iter().map(Sample::height).max().unwrap_or(0);
        let max_w = samples.iter().map(Sample::width).max().unwrap_or(0);
        let (pad_h, pad_w) = if self.pad_to_stride > 0 {
            let stride = self.pad_to_stride as usize;
            let round_up = |len: usize| (len + stride - 1) / stride * stride;
            (round_up(max_h), round_up(max_w))
        } else {
            (max_h, max_w)
        };

        samples
            .iter_mut()
            .filter(|sample| (sample.height(), sample.width()) != (pad_h, pad_w))
            .for_each(|sample| {
                let (h, w, _) = sample.image.dim();
                let mut padded = Array3::zeros((pad_h, pad_w, channels));
                padded.slice_mut(s![..h, ..w, ..]).assign(&sample.image);
                sample.image = padded;
            });

        Ok(())
    }
}
