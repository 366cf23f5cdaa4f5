//! Little-endian cursor over a byte slice, and its writing counterpart.

use crate::FormatError;

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, FormatError> {
        let v = *self.data.get(self.pos).ok_or(FormatError::UnexpectedEof)?;
        self.pos += 1;
        Ok(v)
    }

    pub(crate) fn read_u16_le(&mut self) -> Result<u16, FormatError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32, FormatError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self.pos.checked_add(n).ok_or(FormatError::UnexpectedEof)?;
        let slice = self.data.get(self.pos..end).ok_or(FormatError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    /// Copy the next `out.len()` bytes into `out`.
    pub(crate) fn read_into(&mut self, out: &mut [u8]) -> Result<(), FormatError> {
        out.copy_from_slice(self.read_bytes(out.len())?);
        Ok(())
    }

    /// Everything not yet consumed.
    pub(crate) fn tail(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }
}

#[derive(Default)]
pub(crate) struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub(crate) fn put_u16_le(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_u32_le(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x53, 0x42, 0x6F, 0x78, 0x0E, 0x34, 0x12, 0xFF];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u32_le(), Ok(0x786F4253));
        assert_eq!(r.read_u8(), Ok(14));
        assert_eq!(r.read_u16_le(), Ok(0x1234));
        assert_eq!(r.tail(), &[0xFF]);
        assert_eq!(r.read_u8(), Err(FormatError::UnexpectedEof));
    }

    #[test]
    fn short_reads_fail() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        assert_eq!(r.read_u32_le(), Err(FormatError::UnexpectedEof));
        assert_eq!(r.read_u16_le(), Ok(0x0201));
        let mut buf = [0u8; 2];
        assert_eq!(r.read_into(&mut buf), Err(FormatError::UnexpectedEof));
    }

    #[test]
    fn writer_round_trip() {
        let mut w = ByteWriter::new();
        w.put_u32_le(0x49784253);
        w.put_u16_le(500);
        w.put_u8(7);
        w.put_bytes(&[9, 9]);
        let bytes = w.into_inner();
        assert_eq!(&bytes[..4], b"SBxI");
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u32_le(), Ok(0x49784253));
        assert_eq!(r.read_u16_le(), Ok(500));
        assert_eq!(r.read_u8(), Ok(7));
        assert_eq!(r.read_bytes(2), Ok(&[9u8, 9][..]));
    }
}
