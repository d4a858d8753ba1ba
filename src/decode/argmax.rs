use crate::tensor::Tensor3;
use ndarray::{s, Axis};

/// Location of the highest score in every channel of `heatmap`.
///
/// Ties go to the first cell in row-major order.
pub fn global_argmax_per_channel(heatmap: Tensor3<'_>) -> Vec<(usize, usize)> {
    heatmap
        .view()
        .axis_iter(Axis(2))
        .map(|channel| {
            let mut best = (0, 0);
            let mut best_score = f32::NEG_INFINITY;
            for ((y, x), &score) in channel.indexed_iter() {
                if score > best_score {
                    best_score = score;
                    best = (y, x);
                }
            }
            best
        })
        .collect()
}

/// Whether the score at `(y, x, channel)` reaches `min_score` and no other
/// score in the surrounding `(2 * radius + 1)` square of the same channel
/// exceeds it.
pub fn is_local_maximum(
    heatmap: Tensor3<'_>,
    y: usize,
    x: usize,
    channel: usize,
    radius: usize,
    min_score: f32,
) -> bool {
    let score = heatmap.get(y, x, channel);
    if !(score >= min_score) {
        return false;
    }
    let (height, width, _) = heatmap.dim();
    let y_start = y.saturating_sub(radius);
    let y_end = height.min(y + radius + 1);
    let x_start = x.saturating_sub(radius);
    let x_end = width.min(x + radius + 1);
    heatmap
        .view()
        .slice(s![y_start..y_end, x_start..x_end, channel])
        .iter()
        .all(|&value| value <= score)
}
