//! Image resampling on HWC float arrays.

use crate::common::*;
use fast_image_resize::{
    images::{TypedImage, TypedImageRef},
    pixels::F32,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};

/// Interpolation method used when resizing images.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Interp {
    Nearest,
    Linear,
    Cubic,
    Area,
    Lanczos4,
    /// Draw one of the other methods for each batch.
    Random,
}

impl Default for Interp {
    fn default() -> Self {
        Self::Nearest
    }
}

impl Interp {
    pub const FIXED: [Interp; 5] = [
        Interp::Nearest,
        Interp::Linear,
        Interp::Cubic,
        Interp::Area,
        Interp::Lanczos4,
    ];

    /// Resolves `Random` to a concrete method. Other methods are returned as is.
    pub fn sample<R>(self, rng: &mut R) -> Self
    where
        R: Rng,
    {
        match self {
            Self::Random => Self::FIXED[rng.gen_range(0..Self::FIXED.len())],
            interp => interp,
        }
    }

    fn resize_alg(self) -> Result<ResizeAlg> {
        let alg = match self {
            Self::Nearest => ResizeAlg::Nearest,
            Self::Linear => ResizeAlg::Convolution(FilterType::Bilinear),
            Self::Cubic => ResizeAlg::Convolution(FilterType::CatmullRom),
            Self::Area => ResizeAlg::Convolution(FilterType::Box),
            Self::Lanczos4 => ResizeAlg::Convolution(FilterType::Lanczos3),
            Self::Random => bail!("interpolation must be resolved before resizing"),
        };
        Ok(alg)
    }
}

/// Resizes an HWC image to `[height, width]`.
///
/// Each channel is resized as a separate `F32` plane, so any channel count
/// is accepted and values are not clamped.
pub fn resize_image(
    image: &Array3<f32>,
    height: usize,
    width: usize,
    interp: Interp,
) -> Result<Array3<f32>> {
    let (in_h, in_w, channels) = image.dim();
    ensure!(
        in_h > 0 && in_w > 0,
        "cannot resize an empty image of size {}x{}",
        in_h,
        in_w
    );
    ensure!(
        height > 0 && width > 0,
        "target size must be positive, but get {}x{}",
        height,
        width
    );
    let options = ResizeOptions::new().resize_alg(interp.resize_alg()?);

    if (in_h, in_w) == (height, width) {
        return Ok(image.clone());
    }

    let (src_w, src_h) = (u32::try_from(in_w)?, u32::try_from(in_h)?);
    let (dst_w, dst_h) = (u32::try_from(width)?, u32::try_from(height)?);
    let mut resizer = Resizer::new();
    let mut output = Array3::zeros((height, width, channels));

    for (channel, mut out_plane) in output.axis_iter_mut(Axis(2)).enumerate() {
        let pixels: Vec<F32> = image
            .index_axis(Axis(2), channel)
            .iter()
            .map(|&value| F32::new(value))
            .collect();
        let src = TypedImageRef::new(src_w, src_h, &pixels)?;
        let mut dst = TypedImage::<F32>::new(dst_w, dst_h);
        resizer
            .resize_typed(&src, &mut dst, &options)
            .with_context(|| format!("failed to resize channel {}", channel))?;

        let plane = Array2::from_shape_vec(
            (height, width),
            dst.pixels().iter().map(|pixel| pixel.0).collect(),
        )?;
        out_plane.assign(&plane);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn nearest_upsample() {
        let image = array![[[1.0f32], [2.0]], [[3.0], [4.0]]];
        let resized = resize_image(&image, 4, 4, Interp::Nearest).unwrap();
        assert_eq!(resized.dim(), (4, 4, 1));
        assert_eq!(resized[[0, 0, 0]], 1.0);
        assert_eq!(resized[[1, 3, 0]], 2.0);
        assert_eq!(resized[[3, 0, 0]], 3.0);
        assert_eq!(resized[[3, 3, 0]], 4.0);
    }

    #[test]
    fn constant_image_is_preserved() {
        let image = Array3::from_elem((7, 5, 3), -1.5f32);
        Interp::FIXED.iter().for_each(|&interp| {
            let resized = resize_image(&image, 3, 11, interp).unwrap();
            assert_eq!(resized.dim(), (3, 11, 3));
            resized
                .iter()
                .for_each(|&value| assert_abs_diff_eq!(value, -1.5, epsilon = 1e-4));
        });
    }

    #[test]
    fn values_are_not_clamped() {
        let image = Array3::from_shape_vec(
            (4, 4, 1),
            vec![
                -1.5, 3.0, -1.5, 3.0, 7.0, -2.0, 7.0, -2.0, 0.25, 9.0, 0.25, 9.0, 1.0, 1.0, 1.0, 1.0,
            ],
        )
        .unwrap();
        let resized = resize_image(&image, 2, 2, Interp::Lanczos4).unwrap();
        assert_eq!(resized.dim(), (2, 2, 1));
        assert!(resized.iter().any(|&value| value > 1.0));
    }

    #[test]
    fn channels_are_resized_independently() {
        let mut image = Array3::zeros((6, 4, 5));
        (0..5).for_each(|channel| {
            image
                .index_axis_mut(Axis(2), channel)
                .fill(channel as f32 * 10.0 - 20.0);
        });
        let resized = resize_image(&image, 3, 8, Interp::Linear).unwrap();
        assert_eq!(resized.dim(), (3, 8, 5));
        (0..5).for_each(|channel| {
            resized
                .index_axis(Axis(2), channel)
                .iter()
                .for_each(|&value| {
                    assert_abs_diff_eq!(value, channel as f32 * 10.0 - 20.0, epsilon = 1e-3)
                });
        });
    }

    #[test]
    fn random_is_resolved() {
        let mut rng = StdRng::seed_from_u64(7);
        (0..32).for_each(|_| {
            let interp = Interp::Random.sample(&mut rng);
            assert!(Interp::FIXED.contains(&interp));
        });
        assert_eq!(Interp::Cubic.sample(&mut rng), Interp::Cubic);
        assert!(resize_image(&Array3::zeros((2, 2, 3)), 4, 4, Interp::Random).is_err());
    }
}
