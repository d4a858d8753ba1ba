use crate::{
    decode::{argmax::is_local_maximum, priority_queue::MaxPriorityQueue},
    error::Error,
    tensor::Tensor3,
};

/// A local maximum of one heatmap channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub score: f32,
    pub part: usize,
    pub y: usize,
    pub x: usize,
}

pub(crate) type CandidateQueue = MaxPriorityQueue<Candidate, fn(&Candidate) -> f32>;

fn candidate_score(candidate: &Candidate) -> f32 {
    candidate.score
}

/// Every cell that clears `score_threshold` and is a local maximum of its
/// channel, queued by score. Cells are visited in `(y, x, part)` raster order,
/// which is also the dequeue order among equal scores.
pub(crate) fn build_candidate_queue(
    heatmap: Tensor3<'_>,
    score_threshold: f32,
    local_maximum_radius: usize,
) -> Result<CandidateQueue, Error> {
    let (height, width, num_parts) = heatmap.dim();
    let mut queue = MaxPriorityQueue::with_capacity(
        height * width * num_parts / 16,
        candidate_score as fn(&Candidate) -> f32,
    );

    itertools::iproduct!(0..height, 0..width, 0..num_parts)
        .filter(|&(y, x, part)| {
            is_local_maximum(heatmap, y, x, part, local_maximum_radius, score_threshold)
        })
        .try_for_each(|(y, x, part)| {
            queue.enqueue(Candidate {
                score: heatmap.get(y, x, part),
                part,
                y,
                x,
            })
        })?;

    Ok(queue)
}
