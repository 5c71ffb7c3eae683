use crate::{common::*, sample::Sample, transform::BatchTransform};

/// An ordered operator sequence and the collation policy of a dataset split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPipeline {
    operators: Vec<BatchTransform>,
    collate: bool,
}

impl BatchPipeline {
    pub fn new(operators: Vec<BatchTransform>, collate: bool) -> Self {
        Self { operators, collate }
    }

    pub fn operators(&self) -> &[BatchTransform] {
        &self.operators
    }

    /// Whether samples are stacked into uniform arrays after the operators run.
    pub fn collate(&self) -> bool {
        self.collate
    }

    /// Processes one batch with a freshly seeded random generator.
    ///
    /// Data loading workers can call it concurrently since no random state is
    /// shared between calls.
    pub fn apply(&self, samples: Vec<Sample>) -> Result<Batch> {
        let mut rng = StdRng::from_entropy();
        self.apply_with_rng(samples, &mut rng)
    }

    pub fn apply_with_rng<R>(&self, mut samples: Vec<Sample>, rng: &mut R) -> Result<Batch>
    where
        R: Rng,
    {
        self.operators
            .iter()
            .try_for_each(|op| op.forward(&mut samples, rng))?;

        let batch = if self.collate {
            Batch::Collated(CollatedBatch::from_samples(&samples)?)
        } else {
            Batch::Samples(samples)
        };
        Ok(batch)
    }
}

/// The output of a batch pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Collated(CollatedBatch),
    Samples(Vec<Sample>),
}

impl Batch {
    pub fn len(&self) -> usize {
        match self {
            Self::Collated(batch) => batch.image.len_of(Axis(0)),
            Self::Samples(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Samples stacked along a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CollatedBatch {
    /// Images in NHWC layout.
    pub image: Array4<f32>,
    /// Resize factors `[sy, sx]` per sample.
    pub scale_factor: Array2<f32>,
    /// Present when every sample has the same number of boxes.
    pub gt_bbox: Option<Array3<f32>>,
    pub gt_class: Option<Array2<i32>>,
    pub gt_score: Option<Array2<f32>>,
    /// Training targets per head, stacked over samples.
    pub targets: Vec<Array5<f32>>,
}

impl CollatedBatch {
    pub fn from_samples(samples: &[Sample]) -> Result<Self> {
        let first = samples
            .first()
            .ok_or_else(|| format_err!("cannot collate an empty batch"))?;
        let image_dim = first.image.dim();
        ensure!(
            samples.iter().all(|sample| sample.image.dim() == image_dim),
            "images must share one shape to be collated, add a padding operator first"
        );

        let image = stack(samples.iter().map(|sample| sample.image.view()))?;
        let scale_factor = Array2::from_shape_vec(
            (samples.len(), 2),
            samples
                .iter()
                .flat_map(|sample| sample.scale_factor)
                .collect(),
        )?;

        let num_boxes = first.num_boxes();
        let uniform_boxes = samples.iter().all(|sample| sample.num_boxes() == num_boxes);
        let (gt_bbox, gt_class, gt_score) = if uniform_boxes {
            let gt_bbox = stack(samples.iter().map(|sample| sample.gt_bbox.view()))?;
            let gt_class = stack(samples.iter().map(|sample| sample.gt_class.view()))?;
            let gt_score = samples
                .iter()
                .map(|sample| {
                    sample
                        .gt_score
                        .clone()
                        .unwrap_or_else(|| Array1::ones(sample.num_boxes()))
                })
                .collect_vec();
            let gt_score = stack(gt_score.iter().map(|scores| scores.view()))?;
            (Some(gt_bbox), Some(gt_class), Some(gt_score))
        } else {
            debug!("boxes counts differ across samples, ground truth is not collated");
            (None, None, None)
        };

        let num_heads = first.targets.len();
        ensure!(
            samples.iter().all(|sample| sample.targets.len() == num_heads),
            "samples have different numbers of targets"
        );
        let targets: Vec<_> = (0..num_heads)
            .map(|head| stack(samples.iter().map(|sample| sample.targets[head].view())))
            .collect::<Result<_>>()?;

        Ok(Self {
            image,
            scale_factor,
            gt_bbox,
            gt_class,
            gt_score,
            targets,
        })
    }
}

fn stack<'a, A, D, I>(views: I) -> Result<ndarray::Array<A, D::Larger>>
where
    A: Clone + 'a,
    D: ndarray::Dimension + 'a,
    D::Larger: ndarray::RemoveAxis,
    I: IntoIterator<Item = ndarray::ArrayView<'a, A, D>>,
{
    let views = views.into_iter().collect_vec();
    let stacked = ndarray::stack(Axis(0), &views)?;
    Ok(stacked)
}
