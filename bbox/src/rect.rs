use super::{XYWH, XYXY};
use crate::common::*;

/// The generic axis-aligned rectangle.
///
/// The x axis points right and the y axis points down.
pub trait Rect {
    type Type;

    fn x_min(&self) -> Self::Type;
    fn y_min(&self) -> Self::Type;
    fn x_max(&self) -> Self::Type;
    fn y_max(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_xywh(xywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.x_min(), self.y_min(), self.x_max(), self.y_max()]
    }

    fn xywh(&self) -> [Self::Type; 4] {
        [self.cx(), self.cy(), self.w(), self.h()]
    }

    fn to_xyxy(&self) -> XYXY<Self::Type> {
        XYXY {
            x1: self.x_min(),
            y1: self.y_min(),
            x2: self.x_max(),
            y2: self.y_max(),
        }
    }

    fn to_xywh(&self) -> XYWH<Self::Type> {
        XYWH {
            cx: self.cx(),
            cy: self.cy(),
            w: self.w(),
            h: self.h(),
        }
    }

    fn area(&self) -> Self::Type {
        self.w() * self.h()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    fn intersect_with<R>(&self, other: &R) -> Option<XYXY<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let x1 = self.x_min().max(other.x_min());
        let y1 = self.y_min().max(other.y_min());
        let x2 = self.x_max().min(other.x_max());
        let y2 = self.y_max().min(other.y_max());
        (x2 > x1 && y2 > y1).then(|| XYXY { x1, y1, x2, y2 })
    }

    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        self.intersect_with(other)
            .map(|rect| rect.area())
            .unwrap_or_else(Self::Type::zero)
    }

    fn iou_with<R>(&self, other: &R, epsilon: Self::Type) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let inter_area = self.intersection_area_with(other);
        let union_area = self.area() + other.w() * other.h() - inter_area + epsilon;
        if union_area <= Self::Type::zero() {
            return Self::Type::zero();
        }
        inter_area / union_area
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}
