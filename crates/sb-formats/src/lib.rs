//! File formats for the SoundBox synthesizer.
//!
//! Reads and writes SoundBox songs (SBox) and instruments (SBxI), imports
//! legacy Sonant songs, packs songs into shareable links and writes WAV.

mod compression;
mod link;
mod reader;
pub mod rle;
mod sbox_format;
mod sbxi_format;
mod sonant_format;
mod wav_format;

pub use compression::{compress, decompress, CompressionMethod, CompressionPolicy, MAX_PAYLOAD};
pub use link::{link_to_song_bytes, song_to_data_uri, song_to_link};
pub use sbox_format::{load_sbox, save_sbox, SBOX_MAGIC, SBOX_VERSION};
pub use sbxi_format::{load_instrument, save_instrument, SBXI_MAGIC, SBXI_VERSION};
pub use sonant_format::{is_sonant, load_sonant, SONANT_SIZE};
pub use wav_format::{frames_to_wav, mix_to_wav, write_wav, WAV_HEADER_LEN};

use sb_ir::Song;
use tracing::debug;

/// Error type for format parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    #[error("unrecognized file header")]
    InvalidHeader,
    /// Unexpected end of file
    #[error("unexpected end of data")]
    UnexpectedEof,
    /// Version byte outside the supported range
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    /// Unknown compression method or corrupt payload
    #[error("payload failed to decompress")]
    Decompression,
    #[error("not a song link")]
    InvalidLink,
    /// Structured read failure
    #[error("binary parse error: {0}")]
    Binary(String),
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                FormatError::UnexpectedEof
            }
            other => FormatError::Binary(other.to_string()),
        }
    }
}

/// Decode a song of any supported kind: SBox first, then Sonant. When
/// neither matches, the SBox error is returned.
pub fn load_song(data: &[u8]) -> Result<Song, FormatError> {
    match load_sbox(data) {
        Ok(song) => Ok(song),
        Err(sbox_err) if is_sonant(data) => {
            debug!(error = %sbox_err, "not an SBox song, trying Sonant");
            load_sonant(data).map_err(|_| sbox_err)
        }
        Err(sbox_err) => Err(sbox_err),
    }
}
