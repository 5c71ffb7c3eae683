//! Per-image records flowing through batch operators.

use crate::common::*;

/// The coordinate convention of ground truth boxes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum BoxFormat {
    /// Corners `[x1, y1, x2, y2]`.
    Xyxy,
    /// Center and size `[cx, cy, w, h]`.
    Xywh,
}

/// An image with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Image in HWC layout.
    pub image: Array3<f32>,
    /// Accumulated resize factors `[sy, sx]` relative to the source image.
    pub scale_factor: [f32; 2],
    /// Ground truth boxes, one row per box.
    pub gt_bbox: Array2<f32>,
    pub gt_class: Array1<i32>,
    pub gt_score: Option<Array1<f32>>,
    pub box_format: BoxFormat,
    /// Dense training targets, one per detection head.
    pub targets: Vec<Array4<f32>>,
}

impl Sample {
    pub fn new(image: Array3<f32>, gt_bbox: Array2<f32>, gt_class: Array1<i32>) -> Result<Self> {
        ensure!(
            gt_bbox.ncols() == 4,
            "gt_bbox must have 4 columns, but get {}",
            gt_bbox.ncols()
        );
        ensure!(
            gt_bbox.nrows() == gt_class.len(),
            "gt_bbox has {} rows but gt_class has {} entries",
            gt_bbox.nrows(),
            gt_class.len()
        );

        Ok(Self {
            image,
            scale_factor: [1.0, 1.0],
            gt_bbox,
            gt_class,
            gt_score: None,
            box_format: BoxFormat::Xyxy,
            targets: vec![],
        })
    }

    /// Creates a sample without annotations, as used for prediction.
    pub fn unlabeled(image: Array3<f32>) -> Self {
        Self {
            image,
            scale_factor: [1.0, 1.0],
            gt_bbox: Array2::zeros((0, 4)),
            gt_class: Array1::zeros(0),
            gt_score: None,
            box_format: BoxFormat::Xyxy,
            targets: vec![],
        }
    }

    pub fn with_scores(mut self, gt_score: Array1<f32>) -> Result<Self> {
        ensure!(
            gt_score.len() == self.gt_bbox.nrows(),
            "gt_score has {} entries but there are {} boxes",
            gt_score.len(),
            self.gt_bbox.nrows()
        );
        self.gt_score = Some(gt_score);
        Ok(self)
    }

    pub fn height(&self) -> usize {
        self.image.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.image.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.image.shape()[2]
    }

    pub fn num_boxes(&self) -> usize {
        self.gt_bbox.nrows()
    }

    /// Scales box coordinates in place, respecting the current box format.
    pub fn scale_boxes(&mut self, scale: &Scale<f32>) {
        let box_format = self.box_format;
        self.gt_bbox.rows_mut().into_iter().for_each(|mut row| {
            let coords = [row[0], row[1], row[2], row[3]];
            let scaled = match box_format {
                BoxFormat::Xyxy => (scale * &XYXY::from_xyxy(coords)).xyxy(),
                BoxFormat::Xywh => (scale * &XYWH::from_xywh(coords)).xywh(),
            };
            row.iter_mut().zip(scaled).for_each(|(dst, src)| *dst = src);
        });
    }

    /// The score of box `index`. Unscored boxes count as fully confident.
    pub fn score(&self, index: usize) -> f32 {
        self.gt_score
            .as_ref()
            .map(|scores| scores[index])
            .unwrap_or(1.0)
    }
}
