//! Run-length coder for song payloads.
//!
//! Runs of 4 to 255 equal bytes become `254, len, byte`. A literal 254 is
//! written as `254, 0`.

use crate::FormatError;

const MARKER: u8 = 254;

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let code = data[i];
        let run = data[i..]
            .iter()
            .take(255)
            .take_while(|&&b| b == code)
            .count();

        if run > 3 {
            out.extend_from_slice(&[MARKER, run as u8, code]);
            i += run;
        } else {
            out.push(code);
            if code == MARKER {
                out.push(0);
            }
            i += 1;
        }
    }
    out
}

pub fn decode(data: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut bytes = data.iter().copied();
    while let Some(code) = bytes.next() {
        if code != MARKER {
            out.push(code);
            continue;
        }
        match bytes.next().ok_or(FormatError::Decompression)? {
            0 => out.push(MARKER),
            len => {
                let value = bytes.next().ok_or(FormatError::Decompression)?;
                out.extend(core::iter::repeat(value).take(len as usize));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_of_six() {
        let data = b"AAAAAA";
        let packed = encode(data);
        assert_eq!(packed, vec![254, 6, b'A']);
        assert_eq!(decode(&packed).as_deref(), Ok(&data[..]));
    }

    #[test]
    fn literal_marker_is_escaped() {
        assert_eq!(encode(&[254]), vec![254, 0]);
        assert_eq!(decode(&[254, 0]), Ok(vec![254]));
        assert_eq!(encode(&[254, 254, 254]), vec![254, 0, 254, 0, 254, 0]);
    }

    #[test]
    fn short_runs_are_literal() {
        assert_eq!(encode(&[7, 7, 7, 1]), vec![7, 7, 7, 1]);
    }

    #[test]
    fn long_runs_split_at_255() {
        let data = vec![0u8; 600];
        let packed = encode(&data);
        assert_eq!(packed, vec![254, 255, 0, 254, 255, 0, 254, 90, 0]);
        assert_eq!(decode(&packed), Ok(data));
    }

    #[test]
    fn run_of_markers() {
        let data = vec![254u8; 10];
        assert_eq!(encode(&data), vec![254, 10, 254]);
        assert_eq!(decode(&encode(&data)), Ok(data));
    }

    #[test]
    fn truncated_escape_is_an_error() {
        assert_eq!(decode(&[1, 254]), Err(FormatError::Decompression));
        assert_eq!(decode(&[254, 5]), Err(FormatError::Decompression));
    }

    #[test]
    fn mixed_payload_round_trips() {
        let data: Vec<u8> = (0..2000u32).map(|i| if i % 97 < 40 { 0 } else { (i % 256) as u8 }).collect();
        assert_eq!(decode(&encode(&data)), Ok(data));
    }
}
