use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use posenet_decode::{
    decode::{Decode, Displacements, ModelOutputs},
    engine::{Engine, Timing},
    pose::{self, Pose},
    tensor::TensorBuf,
    transform::CoordinateTransform,
};
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;

const HEATMAPS_FILE: &str = "heatmaps.f32";
const OFFSETS_FILE: &str = "offsets.f32";
const DISPLACEMENTS_FWD_FILE: &str = "displacements_fwd.f32";
const DISPLACEMENTS_BWD_FILE: &str = "displacements_bwd.f32";

#[derive(structopt::StructOpt)]
struct Opt {
    /// Directories holding the raw little-endian f32 outputs of one inference call each.
    #[structopt(required = true)]
    frames: Vec<PathBuf>,

    /// The width of the image the model expects.
    #[structopt(short = "-w", long, default_value = "641")]
    input_width: usize,

    /// The height of the image the model expects.
    #[structopt(short = "-H", long, default_value = "481")]
    input_height: usize,

    /// Heatmaps hold logits rather than probabilities.
    #[structopt(long)]
    heatmap_logits: bool,

    /// Only print keypoints scoring at least this.
    #[structopt(short, long, default_value = "0")]
    threshold: f32,

    /// Number of decoding threads.
    #[structopt(short, long, default_value = "1")]
    jobs: usize,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,

    #[structopt(flatten)]
    transform: CoordinateTransform,

    #[structopt(subcommand)]
    decoder: Decode,
}

/// Owned model outputs for one frame.
struct Frame {
    heatmaps: TensorBuf,
    offsets: TensorBuf,
    displacements: Option<(TensorBuf, TensorBuf)>,
}

impl Frame {
    fn read(
        dir: &Path,
        (height, width): (usize, usize),
        with_displacements: bool,
        heatmap_logits: bool,
    ) -> Result<Self> {
        let read = |name: &str, channels: usize| {
            TensorBuf::read(dir.join(name), (height, width, channels))
                .with_context(|| format!("failed reading {} from {}", name, dir.display()))
        };

        let num_edges = pose::constants::POSE_CHAIN.len();
        let mut heatmaps = read(HEATMAPS_FILE, pose::NUM_KEYPOINTS)?;
        if heatmap_logits {
            heatmaps = heatmaps.sigmoid();
        }
        let offsets = read(OFFSETS_FILE, 2 * pose::NUM_KEYPOINTS)?;
        let displacements = if with_displacements {
            Some((
                read(DISPLACEMENTS_FWD_FILE, 2 * num_edges)?,
                read(DISPLACEMENTS_BWD_FILE, 2 * num_edges)?,
            ))
        } else {
            None
        };

        Ok(Self {
            heatmaps,
            offsets,
            displacements,
        })
    }

    fn outputs(&self) -> ModelOutputs<'_> {
        ModelOutputs {
            heatmaps: self.heatmaps.as_tensor(),
            offsets: self.offsets.as_tensor(),
            displacements: self
                .displacements
                .as_ref()
                .map(|(forward, backward)| Displacements {
                    forward: forward.as_tensor(),
                    backward: backward.as_tensor(),
                }),
        }
    }
}

fn print_poses(frame: &Path, poses: &[Pose], threshold: f32) {
    for (i, pose) in poses.iter().enumerate() {
        for keypoint in pose.filled().filter(|k| k.score >= threshold) {
            println!(
                "{}\t{}\t{:.4}\t{}\t{:.2}\t{:.2}\t{:.4}",
                frame.display(),
                i,
                pose.score,
                keypoint.part_name(),
                keypoint.point.x(),
                keypoint.point.y(),
                keypoint.score,
            );
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let output_stride = opt
        .decoder
        .output_stride()
        .context("invalid decoder configuration")?;
    let grid = (
        output_stride.heatmap_size(opt.input_height),
        output_stride.heatmap_size(opt.input_width),
    );
    let with_displacements = matches!(opt.decoder, Decode::Multi(_));

    info!(
        message = "decoding frames",
        frames = opt.frames.len(),
        height = grid.0,
        width = grid.1,
        stride = output_stride.get()
    );

    let pb = if opt.show_progress {
        Some(
            ProgressBar::new(opt.frames.len() as u64).with_style(
                ProgressStyle::default_bar()
                    .template("{prefix:.bold.dim} {wide_bar} {pos}/{len} {msg}"),
            ),
        )
    } else {
        None
    };

    let jobs = opt.jobs.max(1);
    let chunk_size = (opt.frames.len() + jobs - 1) / jobs;
    let heatmap_logits = opt.heatmap_logits;
    let transform = opt.transform;
    let decoder = &opt.decoder;
    let frames = &opt.frames;
    let pb_ref = pb.as_ref();

    let chunks = crossbeam::thread::scope(|scope| {
        let handles = frames
            .chunks(chunk_size.max(1))
            .map(|chunk| {
                scope.spawn(move |_| {
                    let mut engine = Engine::new(decoder.clone(), transform);
                    let mut decoded = Vec::with_capacity(chunk.len());
                    for dir in chunk {
                        let frame = Frame::read(dir, grid, with_displacements, heatmap_logits)?;
                        let poses = engine
                            .detect_poses(&frame.outputs())
                            .with_context(|| format!("failed decoding {}", dir.display()))?;
                        debug!(frame = %dir.display(), poses = poses.len());
                        if let Some(pb) = pb_ref {
                            pb.inc(1);
                        }
                        decoded.push((dir.as_path(), poses));
                    }
                    Ok::<_, anyhow::Error>((decoded, engine.timing))
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("decoding thread panicked"))?
            })
            .collect::<Result<Vec<_>>>()
    })
    .map_err(|_| anyhow!("failed joining decoding threads"))??;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut timing = Timing::default();
    for (decoded, chunk_timing) in chunks {
        timing += chunk_timing;
        for (dir, poses) in decoded {
            print_poses(dir, &poses, opt.threshold);
        }
    }

    info!(
        message = "done",
        frames = timing.frames,
        decode_ms = timing.decode.as_millis() as u64,
        fps = timing.frames_per_second().unwrap_or_default()
    );
    Ok(())
}
