use crate::{decode::Point, error::Error};
use num_traits::{FromPrimitive, ToPrimitive};
use ordered_float::NotNan;

/// Body parts in the order the network emits their heatmap channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, num_derive::FromPrimitive)]
pub enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

pub const NUM_KEYPOINTS: usize = 17;

impl KeypointKind {
    pub const ALL: [KeypointKind; NUM_KEYPOINTS] = {
        use KeypointKind::*;
        [
            Nose,
            LeftEye,
            RightEye,
            LeftEar,
            RightEar,
            LeftShoulder,
            RightShoulder,
            LeftElbow,
            RightElbow,
            LeftWrist,
            RightWrist,
            LeftHip,
            RightHip,
            LeftKnee,
            RightKnee,
            LeftAnkle,
            RightAnkle,
        ]
    };

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_idx(index: usize) -> Result<Self, Error> {
        Self::from_usize(index).ok_or(Error::ConvertUSizeToKeypointKind(index))
    }

    pub fn name(self) -> &'static str {
        use KeypointKind::*;
        match self {
            Nose => "nose",
            LeftEye => "left_eye",
            RightEye => "right_eye",
            LeftEar => "left_ear",
            RightEar => "right_ear",
            LeftShoulder => "left_shoulder",
            RightShoulder => "right_shoulder",
            LeftElbow => "left_elbow",
            RightElbow => "right_elbow",
            LeftWrist => "left_wrist",
            RightWrist => "right_wrist",
            LeftHip => "left_hip",
            RightHip => "right_hip",
            LeftKnee => "left_knee",
            RightKnee => "right_knee",
            LeftAnkle => "left_ankle",
            RightAnkle => "right_ankle",
        }
    }
}

impl std::fmt::Display for KeypointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Keypoint {
    pub kind: KeypointKind,
    pub point: Point,
    pub score: f32,
}

impl Keypoint {
    #[inline]
    pub fn part_name(&self) -> &'static str {
        self.kind.name()
    }
}

pub type Keypoints = [Option<Keypoint>; NUM_KEYPOINTS];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// A single person: one optional keypoint per part, indexed by `KeypointKind::idx`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pose {
    pub keypoints: Keypoints,
    pub score: f32,
}

impl Pose {
    /// Score the keypoints as the mean over all parts, unfilled parts counting as zero.
    pub fn from_keypoints(keypoints: Keypoints) -> Result<Self, Error> {
        let total = keypoints
            .iter()
            .flatten()
            .map(|keypoint| keypoint.score)
            .sum::<f32>();
        let score = total / NUM_KEYPOINTS.to_f32().ok_or(Error::ConvertToF32)?;
        Ok(Self {
            keypoints,
            score: NotNan::new(score)
                .map_err(|e| Error::ConstructNotNan(e, score))?
                .into_inner(),
        })
    }

    pub fn keypoint(&self, kind: KeypointKind) -> Option<&Keypoint> {
        self.keypoints[kind.idx()].as_ref()
    }

    /// Iterate over the parts that received a keypoint, in part order.
    pub fn filled(&self) -> impl Iterator<Item = &Keypoint> + '_ {
        self.keypoints.iter().filter_map(Option::as_ref)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.filled().fold(None, |bbox, keypoint| {
            let (x, y) = (keypoint.point.x(), keypoint.point.y());
            Some(match bbox {
                None => BoundingBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(BoundingBox {
                    min_x,
                    min_y,
                    max_x,
                    max_y,
                }) => BoundingBox {
                    min_x: min_x.min(x),
                    min_y: min_y.min(y),
                    max_x: max_x.max(x),
                    max_y: max_y.max(y),
                },
            })
        })
    }

    /// Pairs of connected keypoints whose scores both reach `min_confidence`.
    pub fn adjacent_keypoints(&self, min_confidence: f32) -> Vec<(Keypoint, Keypoint)> {
        constants::CONNECTED_PARTS
            .iter()
            .filter_map(|&(a, b)| match (self.keypoint(a), self.keypoint(b)) {
                (Some(&a), Some(&b)) if a.score >= min_confidence && b.score >= min_confidence => {
                    Some((a, b))
                }
                _ => None,
            })
            .collect()
    }
}

pub mod constants {
    use crate::pose::KeypointKind::{self, *};

    /// Parent to child edges of the kinematic tree. The position of an edge
    /// in this table is its displacement channel index.
    pub const POSE_CHAIN: [(KeypointKind, KeypointKind); 16] = [
        (Nose, LeftEye),
        (LeftEye, LeftEar),
        (Nose, RightEye),
        (RightEye, RightEar),
        (Nose, LeftShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (LeftShoulder, LeftHip),
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (Nose, RightShoulder),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (RightShoulder, RightHip),
        (RightHip, RightKnee),
        (RightKnee, RightAnkle),
    ];

    pub const CONNECTED_PARTS: [(KeypointKind, KeypointKind); 12] = [
        (LeftHip, LeftShoulder),
        (LeftElbow, LeftShoulder),
        (LeftElbow, LeftWrist),
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (RightHip, RightShoulder),
        (RightElbow, RightShoulder),
        (RightElbow, RightWrist),
        (RightHip, RightKnee),
        (RightKnee, RightAnkle),
        (LeftShoulder, RightShoulder),
        (LeftHip, RightHip),
    ];
}
