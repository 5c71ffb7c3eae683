use super::{Rect, RectNum, XYXY};
use crate::{common::*, Scale};

/// Bounding box in center format. `cx` and `cy` locate the box center.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XYWH<T> {
    pub(crate) cx: T,
    pub(crate) cy: T,
    pub(crate) w: T,
    pub(crate) h: T,
}

impl<T> XYWH<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn from_xywh(xywh: [T; 4]) -> Self {
        let [cx, cy, w, h] = xywh;
        Self { cx, cy, w, h }
    }

    pub fn scale(&self, scale: &Scale<T>) -> Self {
        Self {
            cx: self.cx * scale.sx,
            cy: self.cy * scale.sy,
            w: self.w * scale.sx,
            h: self.h * scale.sy,
        }
    }
}

impl<T> Rect for XYWH<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn x_min(&self) -> T {
        let two = T::one() + T::one();
        self.cx - self.w / two
    }

    fn y_min(&self) -> T {
        let two = T::one() + T::one();
        self.cy - self.h / two
    }

    fn x_max(&self) -> T {
        let two = T::one() + T::one();
        self.cx + self.w / two
    }

    fn y_max(&self) -> T {
        let two = T::one() + T::one();
        self.cy + self.h / two
    }

    fn cx(&self) -> T {
        self.cx
    }

    fn cy(&self) -> T {
        self.cy
    }

    fn w(&self) -> T {
        self.w
    }

    fn h(&self) -> T {
        self.h
    }

    fn try_from_xyxy(xyxy: [T; 4]) -> Result<Self> {
        let [x1, y1, x2, y2] = xyxy;
        ensure!(x2 >= x1 && y2 >= y1, "x2 >= x1 and y2 >= y1 must hold");
        Ok(XYXY { x1, y1, x2, y2 }.to_xywh())
    }

    fn try_from_xywh(xywh: [T; 4]) -> Result<Self> {
        let [cx, cy, w, h] = xywh;
        let zero = T::zero();
        ensure!(w >= zero && h >= zero, "w and h must be non-negative");
        Ok(Self { cx, cy, w, h })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn xywh_from_xyxy() {
        let rect = XYXY::from_xyxy([10.0, 20.0, 30.0, 60.0]).to_xywh();
        assert_eq!(rect.xywh(), [20.0, 40.0, 20.0, 40.0]);
    }

    #[test]
    fn xywh_rejects_negative_size() {
        assert!(XYWH::try_from_xywh([0.0, 0.0, -1.0, 1.0]).is_err());
    }
}
