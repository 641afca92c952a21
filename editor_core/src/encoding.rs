//! Reading and writing text files with a legacy single-byte fallback.
//!
//! Files are read as UTF-8 first. If the bytes are not valid UTF-8 they are
//! decoded once more as Windows-1252, the usual "ANSI" code page on Windows.
//! Writes go the other way: UTF-8 first, Windows-1252 if that fails.

use crate::error::FileError;
use encoding_rs::WINDOWS_1252;
use std::fs;
use std::path::Path;

/// Encodings a session can be read from or written in, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
}

impl TextEncoding {
    /// The order in which encodings are attempted.
    pub const FALLBACK_CHAIN: [TextEncoding; 2] = [TextEncoding::Utf8, TextEncoding::Windows1252];

    /// Human-readable encoding label.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Decodes `bytes`, returning `None` if they are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Windows1252 => WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }

    /// Encodes `text`, returning `None` if some character is unmappable.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Some(text.as_bytes().to_vec()),
            TextEncoding::Windows1252 => {
                let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
                if had_errors {
                    None
                } else {
                    Some(bytes.into_owned())
                }
            }
        }
    }
}

/// Text read from disk together with the encoding that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decodes raw file bytes using the fallback chain.
pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<DecodedText, FileError> {
    for encoding in TextEncoding::FALLBACK_CHAIN {
        if let Some(text) = encoding.decode(bytes) {
            if encoding != TextEncoding::Utf8 {
                log::debug!("Decoded {:?} using {}", path, encoding.name());
            }
            return Ok(DecodedText { text, encoding });
        }
    }
    Err(FileError::DecodeFailure {
        path: path.to_path_buf(),
    })
}

/// Reads a text file, falling back to the legacy encoding on decode failure.
pub fn read_text(path: &Path) -> Result<DecodedText, FileError> {
    let bytes = fs::read(path).map_err(|e| FileError::from_io(path, e))?;
    decode_bytes(path, &bytes)
}

/// Writes `text` to `path`, falling back to the legacy encoding if UTF-8
/// cannot represent it. Returns the encoding that was used.
pub fn write_text(path: &Path, text: &str) -> Result<TextEncoding, FileError> {
    let (bytes, encoding) = TextEncoding::FALLBACK_CHAIN
        .iter()
        .find_map(|&encoding| encoding.encode(text).map(|bytes| (bytes, encoding)))
        .ok_or_else(|| FileError::EncodeFailure {
            path: path.to_path_buf(),
        })?;
    fs::write(path, bytes).map_err(|e| FileError::from_io(path, e))?;
    Ok(encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utf8.txt");
        fs::write(&path, "héllo wörld\n").unwrap();

        let decoded = read_text(&path).unwrap();
        assert_eq!(decoded.text, "héllo wörld\n");
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_read_falls_back_to_windows_1252() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ansi.txt");
        // "café €5" in windows-1252
        fs::write(&path, [0x63, 0x61, 0x66, 0xE9, 0x20, 0x80, 0x35]).unwrap();

        let decoded = read_text(&path).unwrap();
        assert_eq!(decoded.text, "café €5");
        assert_eq!(decoded.encoding, TextEncoding::Windows1252);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_text(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_write_prefers_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let used = write_text(&path, "日本語\n").unwrap();
        assert_eq!(used, TextEncoding::Utf8);
        assert_eq!(fs::read_to_string(&path).unwrap(), "日本語\n");
    }

    #[test]
    fn test_windows_1252_rejects_unmappable() {
        assert!(TextEncoding::Windows1252.encode("日本語").is_none());
        assert_eq!(
            TextEncoding::Windows1252.encode("café"),
            Some(vec![0x63, 0x61, 0x66, 0xE9])
        );
    }
}
