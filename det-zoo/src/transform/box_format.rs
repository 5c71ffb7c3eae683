use crate::{
    common::*,
    sample::{BoxFormat, Sample},
};

/// Converts ground truth boxes between corner and center conventions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxFormatConvert {
    #[serde(default = "default_from")]
    pub from: BoxFormat,
    #[serde(default = "default_to")]
    pub to: BoxFormat,
}

impl Default for BoxFormatConvert {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
        }
    }
}

impl BoxFormatConvert {
    pub fn forward(&self, samples: &mut [Sample]) -> Result<()> {
        let Self { from, to } = *self;

        samples.iter_mut().try_for_each(|sample| {
            ensure!(
                sample.box_format == from,
                "expect boxes in {} format, but they are in {} format",
                from,
                sample.box_format
            );

            if from != to {
                sample.gt_bbox.rows_mut().into_iter().for_each(|mut row| {
                    let coords = [row[0], row[1], row[2], row[3]];
                    let converted = match from {
                        BoxFormat::Xyxy => XYXY::from_xyxy(coords).to_xywh().xywh(),
                        BoxFormat::Xywh => XYWH::from_xywh(coords).to_xyxy().xyxy(),
                    };
                    row.iter_mut()
                        .zip(converted)
                        .for_each(|(dst, src)| *dst = src);
                });
                sample.box_format = to;
            }

            Ok(())
        })
    }
}

fn default_from() -> BoxFormat {
    BoxFormat::Xyxy
}

fn default_to() -> BoxFormat {
    BoxFormat::Xywh
}
