use super::Rect;
use crate::{common::*, Scale};

/// Bounding box in corner format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XYXY<T> {
    pub(crate) x1: T,
    pub(crate) y1: T,
    pub(crate) x2: T,
    pub(crate) y2: T,
}

impl<T> XYXY<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn from_xyxy(xyxy: [T; 4]) -> Self {
        let [x1, y1, x2, y2] = xyxy;
        Self { x1, y1, x2, y2 }
    }

    pub fn scale(&self, scale: &Scale<T>) -> Self {
        Self {
            x1: self.x1 * scale.sx,
            y1: self.y1 * scale.sy,
            x2: self.x2 * scale.sx,
            y2: self.y2 * scale.sy,
        }
    }
}

impl<T> Rect for XYXY<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn x_min(&self) -> T {
        self.x1
    }

    fn y_min(&self) -> T {
        self.y1
    }

    fn x_max(&self) -> T {
        self.x2
    }

    fn y_max(&self) -> T {
        self.y2
    }

    fn cx(&self) -> T {
        let two = T::one() + T::one();
        self.x1 + self.w() / two
    }

    fn cy(&self) -> T {
        let two = T::one() + T::one();
        self.y1 + self.h() / two
    }

    fn w(&self) -> T {
        self.x2 - self.x1
    }

    fn h(&self) -> T {
        self.y2 - self.y1
    }

    fn try_from_xyxy(xyxy: [T; 4]) -> Result<Self> {
        let [x1, y1, x2, y2] = xyxy;
        ensure!(x2 >= x1 && y2 >= y1, "x2 >= x1 and y2 >= y1 must hold");
        Ok(Self { x1, y1, x2, y2 })
    }

    fn try_from_xywh(xywh: [T; 4]) -> Result<Self> {
        let [cx, cy, w, h] = xywh;
        let zero = T::zero();
        ensure!(w >= zero && h >= zero, "w and h must be non-negative");

        let two = T::one() + T::one();
        Ok(Self {
            x1: cx - w / two,
            y1: cy - h / two,
            x2: cx + w / two,
            y2: cy + h / two,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RectNum, XYWH};

    #[test]
    fn xyxy_rejects_inverted_corners() {
        assert!(XYXY::try_from_xyxy([2.0, 0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn xyxy_from_xywh() {
        let rect = XYWH::from_xywh([4.0, 5.0, 2.0, 4.0]).to_xyxy();
        assert_eq!(rect.xyxy(), [3.0, 3.0, 5.0, 7.0]);
    }
}
