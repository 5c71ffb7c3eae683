//! YOLO target encoding.
//!
//! Each ground truth box is assigned to the anchor whose shape overlaps it
//! best and then to the grid cell containing its center on the head that
//! owns that anchor. The encoded channels of a cell are
//! `[tx, ty, tw, th, scale, score, class one-hot...]`.

use crate::{
    common::*,
    config::Anchor,
    sample::{BoxFormat, Sample},
};

/// Produces per-head dense training targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerateGridTargets {
    pub anchor_masks: Vec<Vec<usize>>,
    pub anchors: Vec<Anchor>,
    pub downsample_ratios: Vec<usize>,
    pub num_classes: usize,
}

impl GenerateGridTargets {
    pub fn forward(&self, samples: &mut [Sample]) -> Result<()> {
        let Self {
            ref anchor_masks,
            ref anchors,
            ref downsample_ratios,
            num_classes,
        } = *self;

        ensure!(
            anchor_masks.len() == downsample_ratios.len(),
            "anchor_masks and downsample_ratios must have the same length"
        );
        ensure!(
            anchor_masks
                .iter()
                .flatten()
                .all(|&index| index < anchors.len()),
            "anchor mask index exceeds total number of anchors"
        );
        ensure!(
            anchors.iter().all(|&(w, h)| w > 0 && h > 0),
            "anchor sizes must be positive"
        );

        let (height, width) = match samples.first() {
            Some(sample) => (sample.height(), sample.width()),
            None => return Ok(()),
        };
        ensure!(
            samples
                .iter()
                .all(|sample| (sample.height(), sample.width()) == (height, width)),
            "all images must be padded to the same size before target generation"
        );

        let grid_sizes: Vec<(usize, usize)> = downsample_ratios
            .iter()
            .map(|&ratio| {
                ensure!(ratio > 0, "downsample ratio must be positive");
                let grid_h = height / ratio;
                let grid_w = width / ratio;
                ensure!(
                    grid_h > 0 && grid_w > 0,
                    "image size {}x{} is smaller than downsample ratio {}",
                    height,
                    width,
                    ratio
                );
                Ok((grid_h, grid_w))
            })
            .collect::<Result<_>>()?;

        // anchor shapes in the unit of image size
        let anchor_rects: Vec<XYXY<f32>> = anchors
            .iter()
            .map(|&(anchor_w, anchor_h)| {
                XYXY::from_xyxy([
                    0.0,
                    0.0,
                    anchor_w as f32 / width as f32,
                    anchor_h as f32 / height as f32,
                ])
            })
            .collect();

        samples.iter_mut().try_for_each(|sample| -> Result<_> {
            ensure!(
                sample.box_format == BoxFormat::Xywh,
                "boxes must be in {} format, but they are in {} format",
                BoxFormat::Xywh,
                sample.box_format
            );

            let targets: Vec<_> = izip!(anchor_masks, &grid_sizes)
                .map(|(mask, &(grid_h, grid_w))| -> Result<_> {
                    let mut target =
                        Array4::<f32>::zeros((mask.len(), 6 + num_classes, grid_h, grid_w));

                    for (index, row) in sample.gt_bbox.rows().into_iter().enumerate() {
                        let [gx, gy, gw, gh] = [row[0], row[1], row[2], row[3]];
                        let score = sample.score(index);
                        if gw <= 0.0 || gh <= 0.0 || score <= 0.0 {
                            continue;
                        }

                        // find the best matching anchor
                        let gt_rect = XYXY::from_xyxy([0.0, 0.0, gw, gh]);
                        let best_anchor = anchor_rects
                            .iter()
                            .map(|anchor| gt_rect.iou_with(anchor, 0.0))
                            .enumerate()
                            .fold(None, |best: Option<(usize, f32)>, (anchor_index, iou)| {
                                match best {
                                    Some((_, best_iou)) if best_iou >= iou => best,
                                    _ if iou > 0.0 => Some((anchor_index, iou)),
                                    _ => best,
                                }
                            });
                        let (best_index, _) = match best_anchor {
                            Some(best) => best,
                            None => continue,
                        };

                        // skip if the anchor belongs to another head
                        let slot = match mask.iter().position(|&index| index == best_index) {
                            Some(slot) => slot,
                            None => continue,
                        };

                        let class = sample.gt_class[index];
                        ensure!(
                            class >= 0 && (class as usize) < num_classes,
                            "class id {} is out of range 0..{}",
                            class,
                            num_classes
                        );

                        let gi = ((gx * grid_w as f32) as usize).min(grid_w - 1);
                        let gj = ((gy * grid_h as f32) as usize).min(grid_h - 1);
                        let (anchor_w, anchor_h) = anchors[best_index];

                        let mut cell = target.slice_mut(s![slot, .., gj, gi]);
                        cell[0] = gx * grid_w as f32 - gi as f32;
                        cell[1] = gy * grid_h as f32 - gj as f32;
                        cell[2] = (gw * width as f32 / anchor_w as f32).ln();
                        cell[3] = (gh * height as f32 / anchor_h as f32).ln();
                        cell[4] = 2.0 - gw * gh;
                        cell[5] = score;
                        cell[6 + class as usize] = 1.0;
                    }

                    Ok(target)
                })
                .collect::<Result<_>>()?;

            sample.targets = targets;
            Ok(())
        })
    }
}
