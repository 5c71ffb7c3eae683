//! Safe bounding box types and functions.

mod common;

pub use rect::*;
pub mod rect;

pub use xyxy::*;
pub mod xyxy;

pub use xywh::*;
pub mod xywh;

pub use scale::*;
mod scale;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}
