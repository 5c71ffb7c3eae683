use crate::{common::*, sample::Sample};

/// Pads or truncates the ground truth of every image to a fixed number of boxes.
///
/// Scores are always materialized so that padding rows carry a zero score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PadBox {
    pub num_max_boxes: usize,
}

impl PadBox {
    pub fn forward(&self, samples: &mut [Sample]) -> Result<()> {
        let num_max = self.num_max_boxes;
        ensure!(num_max > 0, "num_max_boxes must be positive");

        samples.iter_mut().for_each(|sample| {
            let num_kept = sample.num_boxes().min(num_max);
            if sample.num_boxes() > num_max {
                debug!(
                    "truncate {} ground truth boxes to {}",
                    sample.num_boxes(),
                    num_max
                );
            }

            let mut gt_bbox = Array2::zeros((num_max, 4));
            gt_bbox
                .slice_mut(s![..num_kept, ..])
                .assign(&sample.gt_bbox.slice(s![..num_kept, ..]));

            let mut gt_class = Array1::zeros(num_max);
            gt_class
                .slice_mut(s![..num_kept])
                .assign(&sample.gt_class.slice(s![..num_kept]));

            let mut gt_score = Array1::zeros(num_max);
            (0..num_kept).for_each(|index| gt_score[index] = sample.score(index));

            sample.gt_bbox = gt_bbox;
            sample.gt_class = gt_class;
            sample.gt_score = Some(gt_score);
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Sample {
        Sample::new(
            Array3::zeros((4, 4, 3)),
            array![[0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 2.0, 2.0], [2.0, 2.0, 3.0, 3.0]],
            array![4, 5, 6],
        )
        .unwrap()
        .with_scores(array![0.9, 0.8, 0.7])
        .unwrap()
    }

    #[test]
    fn pad_with_zeros() {
        let mut samples = vec![sample()];
        PadBox { num_max_boxes: 5 }.forward(&mut samples).unwrap();

        let sample = &samples[0];
        assert_eq!(sample.gt_bbox.dim(), (5, 4));
        assert_eq!(sample.gt_bbox.row(2).to_vec(), vec![2.0, 2.0, 3.0, 3.0]);
        assert_eq!(sample.gt_bbox.row(4).to_vec(), vec![0.0; 4]);
        assert_eq!(sample.gt_class, array![4, 5, 6, 0, 0]);
        assert_eq!(sample.gt_score, Some(array![0.9, 0.8, 0.7, 0.0, 0.0]));
    }

    #[test]
    fn truncate_extra_boxes() {
        let mut samples = vec![sample()];
        PadBox { num_max_boxes: 2 }.forward(&mut samples).unwrap();

        let sample = &samples[0];
        assert_eq!(sample.gt_bbox, array![[0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 2.0, 2.0]]);
        assert_eq!(sample.gt_class, array![4, 5]);
        assert_eq!(sample.gt_score, Some(array![0.9, 0.8]));
    }

    #[test]
    fn unscored_boxes_get_full_score() {
        let mut samples = vec![Sample::new(
            Array3::zeros((4, 4, 3)),
            array![[0.0, 0.0, 1.0, 1.0]],
            array![1],
        )
        .unwrap()];
        PadBox { num_max_boxes: 3 }.forward(&mut samples).unwrap();
        assert_eq!(samples[0].gt_score, Some(array![1.0, 0.0, 0.0]));
    }
}
