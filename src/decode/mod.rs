use crate::{error::Error, pose::Pose, tensor::Tensor3};
use std::convert::TryFrom;

pub mod argmax;
pub mod candidate;
pub mod multi;
mod point;
pub mod priority_queue;
pub mod single;
pub mod skeleton;

pub use point::Point;

pub trait Decoder {
    /// Return the number of output tensors the decoder expects to operate on.
    fn expected_output_tensors(&self) -> usize;

    /// Decode poses into a Vec of Pose.
    fn decode(&self, outputs: &ModelOutputs<'_>) -> Result<Vec<Pose>, Error>;

    /// Validate that the model produced the expected number of output tensors.
    fn validate_output_tensor_count(&self, output_tensor_count: usize) -> Result<(), Error> {
        let expected_output_tensors = self.expected_output_tensors();
        if output_tensor_count != expected_output_tensors {
            Err(Error::GetExpectedNumOutputs(
                expected_output_tensors,
                output_tensor_count,
            ))
        } else {
            Ok(())
        }
    }
}

/// Forward (parent to child) and backward (child to parent) displacement
/// fields, each `[height, width, 2 * num_edges]` with y components in the first
/// half of the channels.
#[derive(Debug, Clone, Copy)]
pub struct Displacements<'a> {
    pub forward: Tensor3<'a>,
    pub backward: Tensor3<'a>,
}

/// The tensors one inference call hands to a decoder.
#[derive(Debug, Clone, Copy)]
pub struct ModelOutputs<'a> {
    /// `[height, width, num_parts]` part confidences.
    pub heatmaps: Tensor3<'a>,
    /// `[height, width, 2 * num_parts]`, y offsets then x offsets, in pixels.
    pub offsets: Tensor3<'a>,
    pub displacements: Option<Displacements<'a>>,
}

impl<'a> ModelOutputs<'a> {
    pub fn tensor_count(&self) -> usize {
        if self.displacements.is_some() {
            4
        } else {
            2
        }
    }
}

/// Downsampling factor between the network input and its output grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStride {
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl OutputStride {
    #[inline]
    pub fn get(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }

    #[inline]
    pub(crate) fn as_f32(self) -> f32 {
        match self {
            Self::Eight => 8.0,
            Self::Sixteen => 16.0,
            Self::ThirtyTwo => 32.0,
        }
    }

    /// Number of heatmap cells the network produces along an input dimension
    /// of `input_size` pixels.
    pub fn heatmap_size(self, input_size: usize) -> usize {
        1 + input_size.saturating_sub(1) / self.get() as usize
    }
}

impl TryFrom<u32> for OutputStride {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            32 => Ok(Self::ThirtyTwo),
            other => Err(Error::InvalidOutputStride(other)),
        }
    }
}

/// Check a tensor against the heatmap grid and the channel count a decoder
/// needs.
pub(crate) fn check_shape(
    name: &'static str,
    tensor: Tensor3<'_>,
    (height, width): (usize, usize),
    channels: usize,
) -> Result<(), Error> {
    let dim = tensor.dim();
    if (dim.0, dim.1) != (height, width) {
        return Err(Error::SpatialMismatch {
            name,
            expected: (height, width),
            actual: dim,
        });
    }
    if dim.2 != channels {
        return Err(Error::ShapeMismatch {
            name,
            expected: channels,
            actual: dim.2,
        });
    }
    Ok(())
}

/// Check that the heatmap grid is non-empty and has one channel per part.
pub(crate) fn check_heatmap(heatmap: Tensor3<'_>, num_parts: usize) -> Result<(), Error> {
    let (height, width, channels) = heatmap.dim();
    if height == 0 || width == 0 {
        return Err(Error::EmptyTensor("heatmap"));
    }
    if channels != num_parts {
        return Err(Error::ShapeMismatch {
            name: "heatmap",
            expected: num_parts,
            actual: channels,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, structopt::StructOpt)]
pub enum Decode {
    /// Decode the single most likely person
    Single(single::Decoder),
    /// Decode every person the heatmaps support
    Multi(multi::Decoder),
}

impl Default for Decode {
    fn default() -> Self {
        Self::Multi(multi::Decoder::default())
    }
}

impl Decode {
    pub fn output_stride(&self) -> Result<OutputStride, Error> {
        OutputStride::try_from(match self {
            Self::Single(d) => d.output_stride,
            Self::Multi(d) => d.output_stride,
        })
    }
}

impl Decoder for Decode {
    fn expected_output_tensors(&self) -> usize {
        match self {
            Self::Single(d) => d.expected_output_tensors(),
            Self::Multi(d) => d.expected_output_tensors(),
        }
    }

    fn decode(&self, outputs: &ModelOutputs<'_>) -> Result<Vec<Pose>, Error> {
        match self {
            Self::Single(d) => d.decode(outputs),
            Self::Multi(d) => d.decode(outputs),
        }
    }
}
