use anyhow::Result;
use det_zoo::{
    transform::load_transforms, Batch, BatchTransform, DetectorConfig, Interp, Metric, Mode,
    PipelineError, Sample, TransformKind,
};
use ndarray::{array, Array3};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

lazy_static::lazy_static! {
    static ref CONFIG_DIR: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cfg");
    static ref YOLOV3_FILE: PathBuf = CONFIG_DIR.join("yolov3-darknet53-voc.json5");
    static ref PPYOLO_FILE: PathBuf = CONFIG_DIR.join("ppyolo-mobilenetv3-coco.json5");
    static ref FASTER_RCNN_FILE: PathBuf = CONFIG_DIR.join("faster-rcnn-r50.json5");
    static ref TRANSFORMS_FILE: PathBuf = CONFIG_DIR.join("multi-scale-transforms.json5");
}

fn voc_samples() -> Result<Vec<Sample>> {
    let first = Sample::new(
        Array3::from_elem((100, 80, 3), 0.5),
        array![[10.0, 20.0, 50.0, 90.0], [0.0, 0.0, 80.0, 100.0]],
        array![3, 14],
    )?;
    let second = Sample::new(
        Array3::from_elem((60, 90, 3), 0.25),
        array![[30.0, 10.0, 60.0, 40.0]],
        array![7],
    )?;
    Ok(vec![first, second])
}

#[test]
fn default_train_pipeline() -> Result<()> {
    let detector = DetectorConfig::open(&*YOLOV3_FILE)?.build()?;
    let pipeline = detector.compose_batch_transforms(&[], Mode::Train)?;

    let kinds: Vec<_> = pipeline.operators().iter().map(|op| op.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TransformKind::RandomResize,
            TransformKind::BatchPad,
            TransformKind::NormalizeBox,
            TransformKind::PadBox,
            TransformKind::BoxFormatConvert,
            TransformKind::GenerateGridTargets,
        ]
    );
    match &pipeline.operators()[0] {
        BatchTransform::RandomResize(op) => {
            assert_eq!(op.target_sizes, vec![320, 416, 512]);
            assert_eq!(op.interpolation, Interp::Random);
        }
        op => panic!("unexpected first operator {}", op.kind()),
    }
    assert!(pipeline.collate());
    Ok(())
}

#[test]
fn custom_transforms_from_file() -> Result<()> {
    let detector = DetectorConfig::open(&*PPYOLO_FILE)?.build()?;
    let transforms = load_transforms(&*TRANSFORMS_FILE)?;

    let pipeline = detector.compose_batch_transforms(&transforms, Mode::Train)?;
    let kinds: Vec<_> = pipeline.operators().iter().map(|op| op.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TransformKind::RandomResizeByShort,
            TransformKind::BatchPad,
            TransformKind::BatchPad,
            TransformKind::NormalizeBox,
            TransformKind::PadBox,
            TransformKind::BoxFormatConvert,
            TransformKind::GenerateGridTargets,
        ]
    );

    let error = detector
        .compose_batch_transforms(&transforms, Mode::Eval)
        .unwrap_err();
    assert_eq!(
        error.downcast_ref::<PipelineError>(),
        Some(&PipelineError::Configuration {
            kind: TransformKind::RandomResizeByShort,
            mode: Mode::Eval,
        })
    );
    assert_eq!(
        error.to_string(),
        "RandomResizeByShort cannot be present in the eval transforms. \
         Please check the eval transforms."
    );
    Ok(())
}

#[test]
fn train_batch_end_to_end() -> Result<()> {
    let detector = DetectorConfig::open(&*YOLOV3_FILE)?.build()?;
    let pipeline = detector.compose_batch_transforms(&[], Mode::Train)?;
    let mut rng = StdRng::seed_from_u64(7);

    let batch = match pipeline.apply_with_rng(voc_samples()?, &mut rng)? {
        Batch::Collated(batch) => batch,
        Batch::Samples(_) => panic!("training batches must be collated"),
    };

    let (batch_size, height, width, channels) = batch.image.dim();
    assert_eq!((batch_size, channels), (2, 3));
    assert_eq!(height, width);
    assert!([320, 416, 512].contains(&height));

    let gt_bbox = batch.gt_bbox.as_ref().unwrap();
    assert_eq!(gt_bbox.dim(), (2, 50, 4));
    assert!(gt_bbox.iter().all(|&value| (0.0..=1.0).contains(&value)));
    let gt_score = batch.gt_score.as_ref().unwrap();
    assert_eq!(gt_score.row(0).sum(), 2.0);
    assert_eq!(gt_score.row(1).sum(), 1.0);

    assert_eq!(batch.targets.len(), 3);
    batch
        .targets
        .iter()
        .zip([32, 16, 8])
        .for_each(|(target, ratio)| {
            assert_eq!(
                target.dim(),
                (2, 3, 6 + 20, height / ratio, width / ratio)
            );
        });

    // every box lands in exactly one head cell
    let assigned: usize = batch
        .targets
        .iter()
        .map(|target| {
            target
                .index_axis(ndarray::Axis(2), 5)
                .iter()
                .filter(|&&score| score > 0.0)
                .count()
        })
        .sum();
    assert_eq!(assigned, 3);
    Ok(())
}

#[test]
fn voc_evaluation_keeps_samples() -> Result<()> {
    let detector = DetectorConfig::open(&*YOLOV3_FILE)?.build()?;
    assert_eq!(detector.model_config().unwrap().metric, Metric::Voc);

    let pipeline = detector.compose_batch_transforms(&[], Mode::Eval)?;
    assert!(!pipeline.collate());
    match pipeline.apply(voc_samples()?)? {
        Batch::Samples(samples) => {
            assert_eq!(samples.len(), 2);
            samples
                .iter()
                .for_each(|sample| assert_eq!(sample.image.dim(), (100, 90, 3)));
            assert_eq!(samples[1].gt_bbox, array![[30.0, 10.0, 60.0, 40.0]]);
        }
        Batch::Collated(_) => panic!("VOC evaluation must not collate"),
    }

    let pipeline = detector.compose_batch_transforms(&[], Mode::Predict)?;
    assert!(pipeline.collate());
    Ok(())
}

#[test]
fn faster_rcnn_config() -> Result<()> {
    let config = DetectorConfig::open(&*FASTER_RCNN_FILE)?;
    assert_eq!(config.deprecations().len(), 1);

    let detector = config.build()?;
    assert_eq!(detector.name(), "FasterRCNN");
    assert_eq!(detector.backbone(), "ResNet50_vd_ssld");
    assert!(detector.model_config().is_none());
    assert!(detector.compose_batch_transforms(&[], Mode::Train).is_err());
    Ok(())
}

#[test]
fn concurrent_composition() -> Result<()> {
    let detector = Arc::new(DetectorConfig::open(&*YOLOV3_FILE)?.build()?);
    let expected = detector.compose_batch_transforms(&[], Mode::Train)?;

    let handles: Vec<_> = [Mode::Train, Mode::Eval, Mode::Train, Mode::Predict]
        .into_iter()
        .map(|mode| {
            let detector = detector.clone();
            thread::spawn(move || detector.compose_batch_transforms(&[], mode))
        })
        .collect();

    let pipelines = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(pipelines[0], expected);
    assert_eq!(pipelines[2], expected);
    assert!(!pipelines[1].collate());
    assert_eq!(pipelines[3].operators().len(), 1);

    // composition leaves the model metadata untouched
    let again = DetectorConfig::open(&*YOLOV3_FILE)?.build()?;
    assert_eq!(*detector, again);
    Ok(())
}
