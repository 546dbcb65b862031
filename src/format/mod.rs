//! Media-type detection for compressed frame data.

mod sniffer;

pub use sniffer::{classify, Classification, MediaType};
