//! SoundBox instrument format ("SBxI"), versions 1 to 3.
//!
//! The payload is a single parameter vector. Each instrument version
//! shares its field layout with a song version.

use sb_ir::Instrument;
use tracing::debug;

use crate::compression::{self, CompressionMethod, CompressionPolicy};
use crate::reader::{ByteReader, ByteWriter};
use crate::sbox_format::{apply_fixups, read_instrument, Layout};
use crate::FormatError;

/// "SBxI" read as a little-endian u32.
pub const SBXI_MAGIC: u32 = 0x4978_4253;
/// Version written by [`save_instrument`].
pub const SBXI_VERSION: u8 = 3;

fn song_layout(version: u8) -> Result<Layout, FormatError> {
    let song_version = match version {
        1 => 12,
        2 => 13,
        3 => 14,
        v => return Err(FormatError::UnsupportedVersion(v)),
    };
    Layout::for_version(song_version)
}

pub fn load_instrument(data: &[u8]) -> Result<Instrument, FormatError> {
    let mut r = ByteReader::new(data);
    if r.read_u32_le()? != SBXI_MAGIC {
        return Err(FormatError::InvalidHeader);
    }
    let version = r.read_u8()?;
    let layout = song_layout(version)?;
    let method = CompressionMethod::from_code(r.read_u8()?)?;
    let payload = compression::decompress(method, r.tail())?;

    let mut inst = read_instrument(&mut ByteReader::new(&payload), &layout)?;
    apply_fixups(&mut inst, &layout);
    debug!(version, "loaded SBxI instrument");
    Ok(inst)
}

pub fn save_instrument(inst: &Instrument, policy: &CompressionPolicy) -> Vec<u8> {
    let (method, packed) = compression::compress(inst.values(), policy);
    let mut w = ByteWriter::new();
    w.put_u32_le(SBXI_MAGIC);
    w.put_u8(SBXI_VERSION);
    w.put_u8(method.code());
    w.put_bytes(&packed);
    w.into_inner()
}
