use thiserror::Error;

/// Errors raised by a codec adapter.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The decoder instance could not be created.
    ///
    /// All callers awaiting the same initialization observe this error.
    #[error("{media} decoder initialization failed: {message}")]
    Init {
        media: &'static str,
        message: String,
    },

    /// The decoder rejected the compressed bitstream.
    #[error("{media} decode failed: {message}")]
    Decode {
        media: &'static str,
        message: String,
    },
}

/// Errors raised while building or applying ICC color transforms.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// The color engine could not be constructed from the supplied ICC profile.
    #[error("ICC profile setup failed for image {identity}: {message}")]
    Profile { identity: String, message: String },

    /// The profile declares a frame layout the color path does not handle.
    #[error(
        "unsupported frame layout for ICC transform of image {identity}: \
         {samples} samples at {bits} bits"
    )]
    UnsupportedLayout {
        identity: String,
        samples: u32,
        bits: u16,
    },

    /// The pixel buffer does not divide into whole pixels for the transform.
    #[error(
        "pixel buffer for image {identity} is {actual} bytes, \
         not a multiple of the {pixel_size}-byte pixel size"
    )]
    BufferShape {
        identity: String,
        pixel_size: usize,
        actual: usize,
    },
}

/// Errors raised by the pixel reinterpretation layer.
#[derive(Debug, Clone, Error)]
pub enum PixelError {
    /// Declared bit depth has no typed representation.
    #[error("pixel bit depth {bits} is not supported by the decoder")]
    UnsupportedBitDepth { bits: u16 },

    /// Buffer length does not divide into whole elements.
    #[error("buffer of {actual} bytes is not a multiple of the {element_size}-byte element size")]
    TruncatedBuffer { element_size: usize, actual: usize },
}

/// Errors raised by the worker pool itself.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// The pool has been torn down; no further tasks are accepted and any
    /// tasks drained at teardown settle with this error.
    #[error("decode pool is closed")]
    Closed,

    /// A worker went away without settling its task.
    #[error("worker terminated without completing the task")]
    WorkerLost,
}

/// Failure of one decode task.
///
/// Every task submitted to the pool settles exactly once with either a
/// [`DecodeOutput`](crate::task::DecodeOutput) or one of these. The variants
/// mirror the pipeline stages: classification never fails (unrecognized data
/// falls back to the octet-stream path), so the first fallible stage is the
/// codec.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Codec initialization or bitstream decode failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// ICC transform setup or application failure.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Pixel reinterpretation failure.
    #[error(transparent)]
    Pixel(#[from] PixelError),

    /// Pool-level failure (closed pool, lost worker).
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Declared metadata disagrees with what the decoder produced.
    #[error("{field} mismatch: metadata declares {declared}, decoder reports {decoded}")]
    GeometryMismatch {
        field: &'static str,
        declared: u32,
        decoded: u32,
    },

    /// Decoded buffer length disagrees with the declared geometry.
    #[error("decoded frame is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Declared geometry multiplies out beyond any representable frame.
    #[error(
        "frame geometry {columns}x{rows} with {samples} samples at {bits} bits \
         overflows the maximum frame size"
    )]
    FrameTooLarge {
        rows: u32,
        columns: u32,
        samples: u32,
        bits: u16,
    },

    /// The decode pipeline panicked; the panic was contained at the task
    /// boundary and the worker kept running.
    #[error("decode task panicked: {message}")]
    Panicked { message: String },
}
