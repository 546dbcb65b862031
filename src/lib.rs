//! Off-main-thread frame decoding and color correction for deep-zoom
//! medical image viewers.
//!
//! The viewer's render loop cannot afford to decode tiles itself: a pool of
//! workers takes compressed frames, decodes them, validates the result
//! against the declared DICOM geometry, and applies per-image ICC color
//! correction, settling each submission exactly once.
//!
//! # Pipeline
//!
//! For each submitted frame:
//!
//! 1. **Classify** the payload by magic bytes ([`format::classify`]) —
//!    baseline JPEG, JPEG-LS, JPEG 2000, or raw octet-stream fallback.
//! 2. **Decode** with the matching codec adapter ([`codec`]); adapters
//!    initialize lazily, once per worker.
//! 3. **Validate** decoder-reported geometry against declared metadata,
//!    field by field, then check the buffer length.
//! 4. **Color-correct** with the image's ICC profile ([`color`]), keyed by
//!    SOP Instance UID.
//!
//! The result hands back display-ready bytes plus the merged geometry;
//! [`pixel`] reinterprets them at the frame's bit depth when the caller
//! needs typed samples.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use frame_decoder::config::PoolConfig;
//! use frame_decoder::pool::DecodePool;
//! use frame_decoder::task::{DecodeRequest, TaskPayload};
//!
//! # async fn run(jpeg_bytes: Bytes) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DecodePool::new(PoolConfig::default());
//!
//! let request = DecodeRequest::new(jpeg_bytes, "1.2.840.113654.2.3");
//! let handle = pool.add_task(TaskPayload::DecodeAndTransform(request), 0)?;
//!
//! let output = handle.promise().await?;
//! println!("decoded {} bytes", output.frame_data.len());
//!
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod pixel;
pub mod pool;
pub mod task;

pub use codec::{FrameInfo, PixelRepresentation};
pub use color::ProfileDescriptor;
pub use error::DecodeError;
pub use format::MediaType;
pub use pool::{DecodePool, TaskHandle};
pub use task::{DecodeOutput, DecodeRequest, TaskPayload};
