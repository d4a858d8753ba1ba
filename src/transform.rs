use crate::{decode::Point, error::Error, pose::Pose};

/// Maps keypoints from network-input space back to the original image.
///
/// The padding and scale come from whatever resized the frame before
/// inference. Inconsistent values are not detected and simply produce
/// out-of-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, structopt::StructOpt)]
pub struct CoordinateTransform {
    /// Rows of padding added above the image.
    #[structopt(long, default_value = "0")]
    pub pad_top: f32,

    #[structopt(long, default_value = "0")]
    pub pad_bottom: f32,

    /// Columns of padding added left of the image.
    #[structopt(long, default_value = "0")]
    pub pad_left: f32,

    #[structopt(long, default_value = "0")]
    pub pad_right: f32,

    /// Original width divided by the unpadded network input width.
    #[structopt(long, default_value = "1")]
    pub scale_x: f32,

    /// Original height divided by the unpadded network input height.
    #[structopt(long, default_value = "1")]
    pub scale_y: f32,

    /// Mirror x coordinates, for frames that were flipped before inference.
    #[structopt(long, requires = "image-width")]
    pub flip_horizontal: bool,

    /// Width of the original image, used when flipping.
    #[structopt(long)]
    pub image_width: Option<f32>,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self {
            pad_top: 0.0,
            pad_bottom: 0.0,
            pad_left: 0.0,
            pad_right: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flip_horizontal: false,
            image_width: None,
        }
    }
}

impl CoordinateTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    fn flip_width(&self) -> Option<f32> {
        if self.flip_horizontal {
            self.image_width
        } else {
            None
        }
    }

    pub fn apply(&self, point: Point) -> Result<Point, Error> {
        let x = (point.x() - self.pad_left) * self.scale_x;
        let y = (point.y() - self.pad_top) * self.scale_y;
        match self.flip_width() {
            Some(width) => Point::new(width - 1.0 - x, y),
            None => Point::new(x, y),
        }
    }

    /// Rewrite every filled keypoint in place. Scores are untouched.
    pub fn map_poses(&self, poses: &mut [Pose]) -> Result<(), Error> {
        if self.is_identity() {
            return Ok(());
        }
        poses
            .iter_mut()
            .flat_map(|pose| pose.keypoints.iter_mut().flatten())
            .try_for_each(|keypoint| {
                keypoint.point = self.apply(keypoint.point)?;
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinateTransform;
    use crate::{
        decode::Point,
        error::Error,
        pose::{Keypoint, KeypointKind, Pose, NUM_KEYPOINTS},
    };
    use assert_approx_eq::assert_approx_eq;

    fn point(x: f32, y: f32) -> Point {
        Point::new(x, y).unwrap()
    }

    #[test]
    fn default_is_identity() {
        let transform = CoordinateTransform::default();
        assert!(transform.is_identity());
        assert_eq!(transform.apply(point(12.5, 40.0)).unwrap(), point(12.5, 40.0));
    }

    #[test]
    fn padding_then_scale() {
        let transform = CoordinateTransform {
            pad_top: 10.0,
            pad_left: 20.0,
            scale_x: 2.0,
            scale_y: 0.5,
            ..Default::default()
        };
        let mapped = transform.apply(point(100.0, 50.0)).unwrap();
        assert_approx_eq!(mapped.x(), 160.0);
        assert_approx_eq!(mapped.y(), 20.0);

        // bottom and right padding do not move points
        let with_far_padding = CoordinateTransform {
            pad_bottom: 30.0,
            pad_right: 40.0,
            ..transform
        };
        assert_eq!(with_far_padding.apply(point(100.0, 50.0)).unwrap(), mapped);
    }

    #[test]
    fn inconsistent_padding_leaves_the_frame() {
        let transform = CoordinateTransform {
            pad_left: 50.0,
            ..Default::default()
        };
        assert_approx_eq!(transform.apply(point(10.0, 0.0)).unwrap().x(), -40.0);
    }

    #[test]
    fn horizontal_flip() {
        let transform = CoordinateTransform {
            scale_x: 2.0,
            flip_horizontal: true,
            image_width: Some(640.0),
            ..Default::default()
        };
        let mapped = transform.apply(point(100.0, 30.0)).unwrap();
        assert_approx_eq!(mapped.x(), 439.0);
        assert_approx_eq!(mapped.y(), 30.0);

        // no width, no flip
        let unflipped = CoordinateTransform {
            image_width: None,
            ..transform
        };
        assert_approx_eq!(unflipped.apply(point(100.0, 30.0)).unwrap().x(), 200.0);
    }

    #[test]
    fn nan_scale_is_rejected() {
        let transform = CoordinateTransform {
            scale_y: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            transform.apply(point(1.0, 1.0)),
            Err(Error::ConstructNotNan(..))
        ));
    }

    #[test]
    fn map_poses_rewrites_filled_keypoints() {
        let mut keypoints = [None; NUM_KEYPOINTS];
        keypoints[KeypointKind::Nose.idx()] = Some(Keypoint {
            kind: KeypointKind::Nose,
            point: point(160.0, 160.0),
            score: 0.9,
        });
        let mut poses = vec![Pose::from_keypoints(keypoints).unwrap()];
        let transform = CoordinateTransform {
            pad_top: 16.0,
            scale_x: 0.5,
            scale_y: 0.5,
            ..Default::default()
        };
        transform.map_poses(&mut poses).unwrap();

        let nose = poses[0].keypoint(KeypointKind::Nose).unwrap();
        assert_approx_eq!(nose.point.x(), 80.0);
        assert_approx_eq!(nose.point.y(), 72.0);
        assert_approx_eq!(nose.score, 0.9);
        assert_eq!(poses[0].filled().count(), 1);
    }
}
