//! Decode PoseNet heatmap, offset and displacement tensors into poses.

pub mod decode;
pub mod engine;
pub mod error;
pub mod pose;
pub mod tensor;
pub mod transform;

pub use decode::{Decode, Decoder, Displacements, ModelOutputs, OutputStride, Point};
pub use engine::{Engine, Timing};
pub use error::Error;
pub use pose::{Keypoint, KeypointKind, Pose};
pub use tensor::{Tensor3, TensorBuf};
pub use transform::CoordinateTransform;
