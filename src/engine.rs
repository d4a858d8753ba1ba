use crate::{
    decode::{Decoder, ModelOutputs},
    error::Error,
    pose::Pose,
    transform::CoordinateTransform,
};
use num_traits::cast::ToPrimitive;
use std::{
    ops::AddAssign,
    time::{Duration, Instant},
};
use tracing::debug;

/// Decodes one frame's model outputs at a time and maps the result back to
/// image space.
pub struct Engine<D> {
    decoder: D,
    transform: CoordinateTransform,
    pub timing: Timing,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Timing {
    pub decode: Duration,
    pub frames: usize,
}

impl Timing {
    pub fn frames_per_second(&self) -> Option<f64> {
        let seconds = self.decode.as_secs_f64();
        if seconds > 0.0 {
            Some(self.frames.to_f64()? / seconds)
        } else {
            None
        }
    }
}

impl AddAssign for Timing {
    fn add_assign(&mut self, other: Self) {
        self.decode += other.decode;
        self.frames += other.frames;
    }
}

impl<D> Engine<D>
where
    D: Decoder,
{
    pub fn new(decoder: D, transform: CoordinateTransform) -> Self {
        Self {
            decoder,
            transform,
            timing: Default::default(),
        }
    }

    pub fn detect_poses(&mut self, outputs: &ModelOutputs<'_>) -> Result<Vec<Pose>, Error> {
        self.decoder
            .validate_output_tensor_count(outputs.tensor_count())?;

        let start_decode = Instant::now();
        let mut poses = self.decoder.decode(outputs)?;
        self.transform.map_poses(&mut poses)?;
        self.timing.decode += start_decode.elapsed();
        self.timing.frames += 1;

        debug!(
            poses = poses.len(),
            frame = self.timing.frames,
            "detected poses"
        );
        Ok(poses)
    }
}
