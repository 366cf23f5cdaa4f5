//! Compression negotiation for song and instrument payloads.
//!
//! Writing tries raw DEFLATE from the strongest level down, keeps the first
//! result that inflates back to the exact input, then falls back to RLE and
//! finally to storing the payload as-is.

use miniz_oxide::{deflate, inflate};
use tracing::{debug, warn};

use crate::{rle, FormatError};

/// Upper bound on an inflated payload. A full 16-channel, 256-row song is
/// well under 1 MiB.
pub const MAX_PAYLOAD: usize = 16 << 20;

/// Method byte stored after the version byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMethod {
    None = 0,
    Rle = 1,
    Deflate = 2,
}

impl CompressionMethod {
    pub fn from_code(code: u8) -> Result<Self, FormatError> {
        match code {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Rle),
            2 => Ok(CompressionMethod::Deflate),
            _ => Err(FormatError::Decompression),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Which encoders the negotiator may try.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// DEFLATE levels, tried in order.
    pub deflate_levels: Vec<u8>,
    pub allow_rle: bool,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            deflate_levels: (1..=9).rev().collect(),
            allow_rle: true,
        }
    }
}

impl CompressionPolicy {
    /// Store payloads uncompressed.
    pub fn none() -> Self {
        Self {
            deflate_levels: Vec::new(),
            allow_rle: false,
        }
    }
}

/// Pick the first method that round-trips and return it with the packed bytes.
pub fn compress(data: &[u8], policy: &CompressionPolicy) -> (CompressionMethod, Vec<u8>) {
    negotiate_with(data, policy, deflate::compress_to_vec)
}

fn negotiate_with<D>(data: &[u8], policy: &CompressionPolicy, deflater: D) -> (CompressionMethod, Vec<u8>)
where
    D: Fn(&[u8], u8) -> Vec<u8>,
{
    for &level in &policy.deflate_levels {
        let packed = deflater(data, level);
        match inflate::decompress_to_vec_with_limit(&packed, MAX_PAYLOAD) {
            Ok(check) if check == data => {
                debug!(level, packed = packed.len(), unpacked = data.len(), "deflate");
                return (CompressionMethod::Deflate, packed);
            }
            _ => warn!(level, "deflate output failed verification"),
        }
    }

    if policy.allow_rle {
        let packed = rle::encode(data);
        if rle::decode(&packed).as_deref() == Ok(data) {
            debug!(packed = packed.len(), unpacked = data.len(), "rle");
            return (CompressionMethod::Rle, packed);
        }
        warn!("rle output failed verification");
    }

    if !policy.deflate_levels.is_empty() || policy.allow_rle {
        warn!("storing payload uncompressed");
    }
    (CompressionMethod::None, data.to_vec())
}

/// Unpack a payload written with `method`.
pub fn decompress(method: CompressionMethod, packed: &[u8]) -> Result<Vec<u8>, FormatError> {
    match method {
        CompressionMethod::None => Ok(packed.to_vec()),
        CompressionMethod::Rle => rle::decode(packed),
        CompressionMethod::Deflate => inflate::decompress_to_vec_with_limit(packed, MAX_PAYLOAD)
            .map_err(|_| FormatError::Decompression),
    }
}
