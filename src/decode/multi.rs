use crate::{
    decode::{
        candidate::{build_candidate_queue, Candidate},
        check_heatmap, check_shape,
        skeleton::{Direction, Neighbor, SkeletonGraph, Step},
        Displacements, ModelOutputs, OutputStride, Point,
    },
    error::Error,
    pose::{Keypoint, KeypointKind, Keypoints, Pose, NUM_KEYPOINTS},
    tensor::Tensor3,
};
use std::convert::TryFrom;
use tracing::{debug, trace};

const DEFAULT_OUTPUT_STRIDE: &str = "16";
const DEFAULT_MAX_POSE_DETECTIONS: &str = "10";
const DEFAULT_SCORE_THRESHOLD: &str = "0.5";
const DEFAULT_NMS_RADIUS: &str = "20";
const DEFAULT_LOCAL_MAXIMUM_RADIUS: &str = "1";
const DEFAULT_OFFSET_REFINEMENT_STEPS: &str = "1";
const DEFAULT_MIN_POSE_SCORE: &str = "0";

#[derive(Debug, Clone, structopt::StructOpt)]
pub struct Decoder {
    #[structopt(short, long, default_value = DEFAULT_OUTPUT_STRIDE)]
    pub output_stride: u32,
    /// Stop after accepting this many poses.
    #[structopt(short = "-d", long, default_value = DEFAULT_MAX_POSE_DETECTIONS)]
    pub max_pose_detections: usize,
    /// Minimum part score for a heatmap peak to seed a pose.
    #[structopt(short, long, default_value = DEFAULT_SCORE_THRESHOLD)]
    pub score_threshold: f32,
    /// Same-part keypoints of two poses must be further apart than this, in pixels.
    #[structopt(short, long, default_value = DEFAULT_NMS_RADIUS)]
    pub nms_radius: f32,
    #[structopt(short, long, default_value = DEFAULT_LOCAL_MAXIMUM_RADIUS)]
    pub local_maximum_radius: usize,
    #[structopt(short = "-r", long, default_value = DEFAULT_OFFSET_REFINEMENT_STEPS)]
    pub offset_refinement_steps: usize,
    /// Poses scoring below this are dropped.
    #[structopt(short, long, default_value = DEFAULT_MIN_POSE_SCORE)]
    pub min_pose_score: f32,
    #[structopt(skip)]
    skeleton: SkeletonGraph,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            output_stride: 16,
            max_pose_detections: 10,
            score_threshold: 0.5,
            nms_radius: 20.0,
            local_maximum_radius: 1,
            offset_refinement_steps: 1,
            min_pose_score: 0.0,
            skeleton: SkeletonGraph::default(),
        }
    }
}

/// The tensors of one decode call, already checked against each other.
#[derive(Clone, Copy)]
struct Fields<'a> {
    heatmap: Tensor3<'a>,
    offsets: Tensor3<'a>,
    displacements: Displacements<'a>,
    stride: f32,
}

impl<'a> Fields<'a> {
    /// Image-space position of `part` at heatmap cell `(y, x)`.
    fn refine(&self, y: usize, x: usize, part: usize) -> Result<Point, Error> {
        let num_parts = self.heatmap.channels();
        Point::from_cell(
            y,
            x,
            self.stride,
            self.offsets.get(y, x, part),
            self.offsets.get(y, x, part + num_parts),
        )
    }

    /// Displacement along `edge` read at the cell nearest `point`.
    fn displacement(&self, point: Point, edge: usize, direction: Direction) -> Result<Point, Error> {
        let field = match direction {
            Direction::Forward => self.displacements.forward,
            Direction::Backward => self.displacements.backward,
        };
        let (y, x) = point.nearest_cell(self.stride, self.heatmap.height(), self.heatmap.width())?;
        let num_edges = field.channels() / 2;
        Point::new(field.get(y, x, num_edges + edge), field.get(y, x, edge))
    }
}

impl Decoder {
    pub fn validate(&self) -> Result<OutputStride, Error> {
        let output_stride = OutputStride::try_from(self.output_stride)?;
        if !(self.score_threshold >= 0.0) {
            return Err(Error::NegativeScoreThreshold(self.score_threshold));
        }
        if !(self.nms_radius >= 0.0) {
            return Err(Error::NegativeNmsRadius(self.nms_radius));
        }
        Ok(output_stride)
    }

    /// Follow one skeleton edge from `source` and read the neighbor's keypoint.
    fn traverse_to_target(
        &self,
        fields: &Fields<'_>,
        source: Point,
        Neighbor {
            part,
            edge,
            direction,
        }: Neighbor,
    ) -> Result<(Point, f32), Error> {
        let (height, width, _) = fields.heatmap.dim();
        let mut target = source + fields.displacement(source, edge, direction)?;
        let mut cell = target.nearest_cell(fields.stride, height, width)?;
        for step in 0..self.offset_refinement_steps {
            if step > 0 {
                cell = target.nearest_cell(fields.stride, height, width)?;
            }
            target = fields.refine(cell.0, cell.1, part)?;
        }
        Ok((target, fields.heatmap.get(cell.0, cell.1, part)))
    }

    /// Grow a full skeleton breadth-first from `root`. Every part is reached
    /// exactly once and no part is gated on its score.
    fn grow_pose(
        &self,
        fields: &Fields<'_>,
        root: Candidate,
        root_point: Point,
    ) -> Result<Keypoints, Error> {
        let mut points = [Point::default(); NUM_KEYPOINTS];
        let mut scores = [0.0; NUM_KEYPOINTS];
        points[root.part] = root_point;
        scores[root.part] = root.score;

        for Step { source, neighbor } in self.skeleton.traversal_order(root.part) {
            let (point, score) = self.traverse_to_target(fields, points[source], neighbor)?;
            points[neighbor.part] = point;
            scores[neighbor.part] = score;
        }

        let mut keypoints: Keypoints = [None; NUM_KEYPOINTS];
        for (part, slot) in keypoints.iter_mut().enumerate() {
            *slot = Some(Keypoint {
                kind: KeypointKind::from_idx(part)?,
                point: points[part],
                score: scores[part],
            });
        }
        Ok(keypoints)
    }

    pub fn decode_multiple_poses<'a>(
        &self,
        heatmap: Tensor3<'a>,
        offsets: Tensor3<'a>,
        displacements: Displacements<'a>,
    ) -> Result<Vec<Pose>, Error> {
        let output_stride = self.validate()?;

        let num_parts = self.skeleton.num_parts();
        let num_edges = self.skeleton.num_edges();
        check_heatmap(heatmap, num_parts)?;
        let (height, width, _) = heatmap.dim();
        check_shape("offsets", offsets, (height, width), 2 * num_parts)?;
        check_shape(
            "forward displacements",
            displacements.forward,
            (height, width),
            2 * num_edges,
        )?;
        check_shape(
            "backward displacements",
            displacements.backward,
            (height, width),
            2 * num_edges,
        )?;

        let fields = Fields {
            heatmap,
            offsets,
            displacements,
            stride: output_stride.as_f32(),
        };
        let squared_nms_radius = self.nms_radius.powi(2);

        let mut queue =
            build_candidate_queue(heatmap, self.score_threshold, self.local_maximum_radius)?;
        debug!(candidates = queue.len(), "built candidate queue");

        let mut poses = Vec::with_capacity(self.max_pose_detections);

        while poses.len() < self.max_pose_detections {
            let root = match queue.dequeue() {
                Some(root) => root,
                None => break,
            };
            let root_point = fields.refine(root.y, root.x, root.part)?;

            if within_nms_radius(&poses, root.part, root_point, squared_nms_radius) {
                trace!(
                    part = root.part,
                    y = root.y,
                    x = root.x,
                    score = root.score,
                    "root suppressed by an accepted pose"
                );
                continue;
            }

            let mut keypoints = self.grow_pose(&fields, root, root_point)?;
            suppress_overlapping_keypoints(&poses, &mut keypoints, squared_nms_radius);

            let pose = Pose::from_keypoints(keypoints)?;
            if pose.score >= self.min_pose_score {
                trace!(part = root.part, score = pose.score, "accepted pose");
                poses.push(pose);
            } else {
                trace!(part = root.part, score = pose.score, "discarded pose");
            }
        }

        poses.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            poses = poses.len(),
            unused_candidates = queue.len(),
            "decoded poses"
        );
        Ok(poses)
    }
}

/// Whether any accepted pose has a keypoint for `part` within the radius of `point`.
fn within_nms_radius(poses: &[Pose], part: usize, point: Point, squared_nms_radius: f32) -> bool {
    poses.iter().any(|pose| {
        pose.keypoints[part].map_or(false, |keypoint| {
            point.squared_distance(keypoint.point) <= squared_nms_radius
        })
    })
}

/// Unfill every keypoint that lands on the same part of an accepted pose.
fn suppress_overlapping_keypoints(
    poses: &[Pose],
    keypoints: &mut Keypoints,
    squared_nms_radius: f32,
) {
    for (part, slot) in keypoints.iter_mut().enumerate() {
        if slot.map_or(false, |keypoint| {
            within_nms_radius(poses, part, keypoint.point, squared_nms_radius)
        }) {
            *slot = None;
        }
    }
}

impl crate::decode::Decoder for Decoder {
    fn expected_output_tensors(&self) -> usize {
        4
    }

    fn decode(&self, outputs: &ModelOutputs<'_>) -> Result<Vec<Pose>, Error> {
        self.validate()?;
        let displacements = outputs.displacements.ok_or(Error::MissingDisplacements)?;
        self.decode_multiple_poses(outputs.heatmaps, outputs.offsets, displacements)
    }
}
