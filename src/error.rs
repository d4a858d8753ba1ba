#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("index ({y}, {x}, {channel}) is out of bounds for tensor with shape {shape:?}")]
    OutOfBounds {
        y: usize,
        x: usize,
        channel: usize,
        shape: (usize, usize, usize),
    },

    #[error("output stride must be one of 8, 16 or 32, got {0}")]
    InvalidOutputStride(u32),

    #[error("score threshold must be non-negative, got {0}")]
    NegativeScoreThreshold(f32),

    #[error("nms radius must be non-negative, got {0}")]
    NegativeNmsRadius(f32),

    #[error("{name} tensor has {actual} channels, expected {expected}")]
    ShapeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{name} tensor has shape {actual:?}, expected spatial size {expected:?}")]
    SpatialMismatch {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("{0} tensor has an empty dimension")]
    EmptyTensor(&'static str),

    #[error("skeleton edge {edge} ({parent}, {child}) refers to a part outside 0..{num_parts}")]
    InvalidSkeletonEdge {
        edge: usize,
        parent: usize,
        child: usize,
        num_parts: usize,
    },

    #[error("multi-person decoding requires displacement tensors")]
    MissingDisplacements,

    #[error("expected {0} output tensors, got {1}")]
    GetExpectedNumOutputs(usize, usize),

    #[error("failed to construct array view over tensor buffer")]
    ConstructArrayView(#[source] ndarray::ShapeError),

    #[error("failed to convert usize value to keypoint kind: {0}")]
    ConvertUSizeToKeypointKind(usize),

    #[error("failed to convert value to f32")]
    ConvertToF32,

    #[error("failed to convert value to usize")]
    ConvertToUSize,

    #[error("failed to construct NotNan from f32: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f32),

    #[error("failed to read tensor file: {1:?}")]
    ReadTensor(#[source] std::io::Error, std::path::PathBuf),

    #[error("tensor file {0:?} has {1} bytes, which is not a multiple of 4")]
    TensorByteLength(std::path::PathBuf, usize),
}
