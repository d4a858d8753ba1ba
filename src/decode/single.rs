use crate::{
    decode::{
        argmax::global_argmax_per_channel, check_heatmap, check_shape, ModelOutputs,
        OutputStride, Point,
    },
    error::Error,
    pose::{Keypoint, KeypointKind, Keypoints, Pose, NUM_KEYPOINTS},
    tensor::Tensor3,
};
use std::convert::TryFrom;
use tracing::debug;

const DEFAULT_OUTPUT_STRIDE: &str = "16";

#[derive(Debug, Clone, Copy, structopt::StructOpt)]
pub struct Decoder {
    #[structopt(short, long, default_value = DEFAULT_OUTPUT_STRIDE)]
    pub output_stride: u32,
}

impl Default for Decoder {
    fn default() -> Self {
        Self { output_stride: 16 }
    }
}

/// Take the strongest cell of every heatmap channel as that part's location.
///
/// Always yields one pose with every part filled.
pub fn decode_single_pose(
    heatmap: Tensor3<'_>,
    offsets: Tensor3<'_>,
    output_stride: OutputStride,
) -> Result<Pose, Error> {
    check_heatmap(heatmap, NUM_KEYPOINTS)?;
    let (height, width, num_parts) = heatmap.dim();
    check_shape("offsets", offsets, (height, width), 2 * num_parts)?;

    let stride = output_stride.as_f32();
    let mut keypoints: Keypoints = [None; NUM_KEYPOINTS];

    for (part, (y, x)) in global_argmax_per_channel(heatmap).into_iter().enumerate() {
        let dy = offsets.get(y, x, part);
        let dx = offsets.get(y, x, part + num_parts);
        keypoints[part] = Some(Keypoint {
            kind: KeypointKind::from_idx(part)?,
            point: Point::from_cell(y, x, stride, dy, dx)?,
            score: heatmap.get(y, x, part),
        });
    }

    let pose = Pose::from_keypoints(keypoints)?;
    debug!(score = pose.score, "decoded single pose");
    Ok(pose)
}

impl crate::decode::Decoder for Decoder {
    fn expected_output_tensors(&self) -> usize {
        2
    }

    fn decode(&self, outputs: &ModelOutputs<'_>) -> Result<Vec<Pose>, Error> {
        let output_stride = OutputStride::try_from(self.output_stride)?;
        Ok(vec![decode_single_pose(
            outputs.heatmaps,
            outputs.offsets,
            output_stride,
        )?])
    }
}
