use crate::{common::*, XYWH, XYXY};

/// Axis-aligned scaling that maps one image size onto another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scale<T> {
    pub sx: T,
    pub sy: T,
}

impl<T> Scale<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Builds the scaling from `[h, w]` of the source to `[h, w]` of the target.
    pub fn try_from_sizes(src_hw: [T; 2], tgt_hw: [T; 2]) -> Result<Self> {
        let zero = T::zero();
        let [src_h, src_w] = src_hw;
        let [tgt_h, tgt_w] = tgt_hw;
        ensure!(
            src_h > zero && src_w > zero,
            "source height and width must be positive"
        );
        Ok(Self {
            sx: tgt_w / src_w,
            sy: tgt_h / src_h,
        })
    }

    /// Maps pixel coordinates of an image of `[h, w]` into the unit square.
    pub fn try_normalizer(hw: [T; 2]) -> Result<Self> {
        Self::try_from_sizes(hw, [T::one(), T::one()])
    }
}

impl<T> Mul<&XYXY<T>> for &Scale<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = XYXY<T>;

    fn mul(self, rhs: &XYXY<T>) -> Self::Output {
        rhs.scale(self)
    }
}

impl<T> Mul<&XYWH<T>> for &Scale<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = XYWH<T>;

    fn mul(self, rhs: &XYWH<T>) -> Self::Output {
        rhs.scale(self)
    }
}
