//! Multi-scale resizing with one size drawn per batch.

use super::resample::{resize_image, Interp};
use crate::{common::*, sample::Sample};

/// Resizes every image of a batch to a square size drawn from `target_sizes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomResize {
    pub target_sizes: Vec<usize>,
    #[serde(default)]
    pub interpolation: Interp,
}

impl RandomResize {
    pub fn forward<R>(&self, samples: &mut [Sample], rng: &mut R) -> Result<()>
    where
        R: Rng,
    {
        ensure!(
            !self.target_sizes.is_empty(),
            "target_sizes must not be empty"
        );
        ensure!(
            self.target_sizes.iter().all(|&size| size > 0),
            "target_sizes must be positive, but get {:?}",
            self.target_sizes
        );

        let size = self.target_sizes[rng.gen_range(0..self.target_sizes.len())];
        let interp = self.interpolation.sample(rng);

        samples
            .iter_mut()
            .try_for_each(|sample| resize_sample(sample, [size, size], interp))
    }
}

/// Resizes every image of a batch so that its short side matches a size
/// drawn from `target_short_sizes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomResizeByShort {
    pub target_short_sizes: Vec<usize>,
    /// The upper bound of the long side. Non-positive values disable it.
    #[serde(default = "default_max_size")]
    pub max_size: i64,
    #[serde(default)]
    pub interpolation: Interp,
}

impl RandomResizeByShort {
    pub fn forward<R>(&self, samples: &mut [Sample], rng: &mut R) -> Result<()>
    where
        R: Rng,
    {
        ensure!(
            !self.target_short_sizes.is_empty(),
            "target_short_sizes must not be empty"
        );
        ensure!(
            self.target_short_sizes.iter().all(|&size| size > 0),
            "target_short_sizes must be positive, but get {:?}",
            self.target_short_sizes
        );

        let short_size = self.target_short_sizes[rng.gen_range(0..self.target_short_sizes.len())];
        let interp = self.interpolation.sample(rng);

        samples.iter_mut().try_for_each(|sample| {
            let size = self.target_size(short_size, [sample.height(), sample.width()])?;
            resize_sample(sample, size, interp)
        })
    }

    fn target_size(&self, short_size: usize, hw: [usize; 2]) -> Result<[usize; 2]> {
        let [h, w] = hw;
        let im_short = h.min(w);
        let im_long = h.max(w);
        ensure!(im_short > 0, "cannot resize an empty image of size {}x{}", h, w);

        let mut scale = short_size as f64 / im_short as f64;
        if self.max_size > 0 && (scale * im_long as f64).round() > self.max_size as f64 {
            scale = self.max_size as f64 / im_long as f64;
        }

        let target_h = ((scale * h as f64).round() as usize).max(1);
        let target_w = ((scale * w as f64).round() as usize).max(1);
        Ok([target_h, target_w])
    }
}

fn default_max_size() -> i64 {
    -1
}

fn resize_sample(sample: &mut Sample, target_hw: [usize; 2], interp: Interp) -> Result<()> {
    let [target_h, target_w] = target_hw;
    let src_hw = [sample.height() as f32, sample.width() as f32];
    let scale = Scale::try_from_sizes(src_hw, [target_h as f32, target_w as f32])?;

    sample.image = resize_image(&sample.image, target_h, target_w, interp)?;
    sample.scale_boxes(&scale);
    let [sy, sx] = sample.scale_factor;
    sample.scale_factor = [sy * scale.sy, sx * scale.sx];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn sample(h: usize, w: usize) -> Sample {
        Sample::new(
            Array3::zeros((h, w, 3)),
            array![[10.0, 20.0, 30.0, 40.0]],
            array![1],
        )
        .unwrap()
    }

    #[test]
    fn one_size_per_batch() {
        let op = RandomResize {
            target_sizes: vec![32, 48, 64],
            interpolation: Interp::Random,
        };
        let mut rng = StdRng::seed_from_u64(1);

        (0..16).for_each(|_| {
            let mut samples = vec![sample(50, 100), sample(80, 60)];
            op.forward(&mut samples, &mut rng).unwrap();
            let size = samples[0].height();
            assert!(op.target_sizes.contains(&size));
            samples.iter().for_each(|sample| {
                assert_eq!((sample.height(), sample.width()), (size, size));
            });
        });
    }

    #[test]
    fn boxes_follow_the_image() {
        let op = RandomResize {
            target_sizes: vec![50],
            interpolation: Interp::Linear,
        };
        let mut samples = vec![sample(100, 200)];
        op.forward(&mut samples, &mut StdRng::seed_from_u64(0)).unwrap();

        let expect = [2.5, 10.0, 7.5, 20.0];
        samples[0]
            .gt_bbox
            .iter()
            .zip(expect)
            .for_each(|(&lhs, rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-5));
        assert_abs_diff_eq!(samples[0].scale_factor[0], 0.5);
        assert_abs_diff_eq!(samples[0].scale_factor[1], 0.25);
    }

    #[test]
    fn empty_sizes_are_rejected() {
        let op = RandomResize {
            target_sizes: vec![],
            interpolation: Interp::Nearest,
        };
        let mut samples = vec![sample(8, 8)];
        assert!(op.forward(&mut samples, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn resize_by_short_side() {
        let op = RandomResizeByShort {
            target_short_sizes: vec![50],
            max_size: -1,
            interpolation: Interp::Nearest,
        };
        assert_eq!(op.target_size(50, [100, 300]).unwrap(), [50, 150]);

        let op = RandomResizeByShort {
            max_size: 120,
            ..op
        };
        assert_eq!(op.target_size(50, [100, 300]).unwrap(), [40, 120]);

        let mut samples = vec![sample(100, 300), sample(200, 100)];
        op.forward(&mut samples, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!((samples[0].height(), samples[0].width()), (40, 120));
        assert_eq!((samples[1].height(), samples[1].width()), (100, 50));
    }
}
