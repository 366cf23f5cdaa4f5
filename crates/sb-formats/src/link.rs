//! Shareable song links.
//!
//! A link carries an encoded song in a `data` query parameter as
//! URL-safe base64 without padding. Downloads use a standard base64
//! `data:` URI instead.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::FormatError;

const LINK_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

/// `?data=...` query string for an encoded song.
pub fn song_to_link(bytes: &[u8]) -> String {
    format!("?data={}", LINK_ENGINE.encode(bytes))
}

/// `data:` URI holding an encoded song.
pub fn song_to_data_uri(bytes: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(bytes))
}

/// Recover song bytes from a full link, a bare query string, a bare
/// payload, or a `data:` URI.
pub fn link_to_song_bytes(link: &str) -> Result<Vec<u8>, FormatError> {
    let link = link.trim();

    if let Some(rest) = link.strip_prefix("data:") {
        let (_, payload) = rest.split_once("base64,").ok_or(FormatError::InvalidLink)?;
        return STANDARD.decode(payload).map_err(|_| FormatError::InvalidLink);
    }

    let payload = match link.split_once('?') {
        Some((_, query)) => query
            .split('&')
            .find_map(|pair| pair.strip_prefix("data="))
            .ok_or(FormatError::InvalidLink)?,
        None => link.strip_prefix("data=").unwrap_or(link),
    };
    if payload.is_empty() {
        return Err(FormatError::InvalidLink);
    }
    LINK_ENGINE.decode(payload).map_err(|_| FormatError::InvalidLink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_alphabet_is_url_safe() {
        let bytes = [0xFB, 0xFF, 0xBF, 0x01];
        let link = song_to_link(&bytes);
        assert_eq!(link, "?data=-_-_AQ");
        assert_eq!(link_to_song_bytes(&link), Ok(bytes.to_vec()));
    }

    #[test]
    fn accepts_full_urls_and_bare_payloads() {
        let bytes = b"SBox\x0e\x02payload".to_vec();
        let query = song_to_link(&bytes);
        let url = format!("https://example.org/soundbox/{}&autoplay=1", query);
        assert_eq!(link_to_song_bytes(&url), Ok(bytes.clone()));
        assert_eq!(link_to_song_bytes(&query[6..]), Ok(bytes.clone()));
        assert_eq!(link_to_song_bytes(&format!("{}==", &query[6..])), Ok(bytes));
    }

    #[test]
    fn data_uri_round_trip() {
        let bytes = vec![0xFF, 0x00, 0x3E];
        let uri = song_to_data_uri(&bytes);
        assert!(uri.starts_with("data:application/octet-stream;base64,"));
        assert_eq!(link_to_song_bytes(&uri), Ok(bytes));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(link_to_song_bytes("https://example.org/?song=1"), Err(FormatError::InvalidLink));
        assert_eq!(link_to_song_bytes("?data=***"), Err(FormatError::InvalidLink));
        assert_eq!(link_to_song_bytes(""), Err(FormatError::InvalidLink));
        assert_eq!(link_to_song_bytes("data:text/plain,hello"), Err(FormatError::InvalidLink));
    }
}
