//! Conversions between raw bytes, text in a named charset, and base64.
//!
//! Reads hand back raw bytes unless a charset is asked for. Writes either go
//! out as text, or as base64 flagged `encoded` so the remote does not encode
//! them a second time.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, UTF_8};

use crate::error::{FsError, FsResult};

/// Result of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Binary(Vec<u8>),
    Text(String),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Binary(bytes) => bytes,
            Content::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload supplied to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    Bytes(Vec<u8>),
    Text(String),
}

impl Default for FileData {
    fn default() -> Self {
        FileData::Text(String::new())
    }
}

impl From<&str> for FileData {
    fn from(text: &str) -> Self {
        FileData::Text(text.to_string())
    }
}

impl From<String> for FileData {
    fn from(text: String) -> Self {
        FileData::Text(text)
    }
}

impl From<Vec<u8>> for FileData {
    fn from(bytes: Vec<u8>) -> Self {
        FileData::Bytes(bytes)
    }
}

impl From<&[u8]> for FileData {
    fn from(bytes: &[u8]) -> Self {
        FileData::Bytes(bytes.to_vec())
    }
}

impl From<Content> for FileData {
    fn from(content: Content) -> Self {
        match content {
            Content::Binary(bytes) => FileData::Bytes(bytes),
            Content::Text(text) => FileData::Text(text),
        }
    }
}

/// A payload ready for the remote write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub content: String,
    /// `content` is already base64.
    pub encoded: bool,
}

impl Upload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            encoded: false,
        }
    }

    pub fn base64(bytes: &[u8]) -> Self {
        Self {
            content: STANDARD.encode(bytes),
            encoded: true,
        }
    }

    /// The bytes the remote ends up storing.
    pub fn to_bytes(&self) -> FsResult<Vec<u8>> {
        if self.encoded {
            STANDARD
                .decode(self.content.as_bytes())
                .map_err(|e| FsError::Encoding(format!("invalid base64 payload: {e}")))
        } else {
            Ok(self.content.as_bytes().to_vec())
        }
    }
}

fn charset(label: &str) -> FsResult<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| FsError::Encoding(format!("unknown charset `{label}`")))
}

/// Decode bytes in the named charset. Malformed input is an error.
pub fn decode_text(bytes: &[u8], label: &str) -> FsResult<String> {
    let encoding = charset(label)?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| FsError::Encoding(format!("content is not valid {}", encoding.name())))
}

/// Encode text in the named charset. Unmappable characters are an error.
pub fn encode_text(text: &str, label: &str) -> FsResult<Vec<u8>> {
    let encoding = charset(label)?;
    if encoding.output_encoding() != encoding {
        return Err(FsError::Encoding(format!(
            "cannot write content as {}",
            encoding.name()
        )));
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(FsError::Encoding(format!(
            "content cannot be represented in {}",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

/// Shape blob bytes for the caller.
pub fn read_content(bytes: Vec<u8>, encoding: Option<&str>) -> FsResult<Content> {
    match encoding {
        Some(label) => decode_text(&bytes, label).map(Content::Text),
        None => Ok(Content::Binary(bytes)),
    }
}

/// Shape a write payload for the repository write call.
pub fn prepare_upload(data: FileData, encoding: Option<&str>) -> FsResult<Upload> {
    match (data, encoding) {
        (FileData::Text(text), None) => Ok(Upload::text(text)),
        (FileData::Bytes(bytes), None) => Ok(Upload::base64(&bytes)),
        (data, Some(label)) => {
            let text = match data {
                FileData::Text(text) => text,
                FileData::Bytes(bytes) => decode_text(&bytes, label)?,
            };
            let bytes = encode_text(&text, label)?;
            if charset(label)? == UTF_8 {
                Ok(Upload::text(text))
            } else {
                Ok(Upload::base64(&bytes))
            }
        }
    }
}

/// Shape a write payload for a text-only store.
pub fn to_text(data: FileData, encoding: Option<&str>) -> FsResult<String> {
    match data {
        FileData::Text(text) => Ok(text),
        FileData::Bytes(bytes) => decode_text(&bytes, encoding.unwrap_or("utf-8")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn read_without_charset_returns_bytes() {
        let bytes = vec![0xff, 0x00, 0x10];
        assert_eq!(
            read_content(bytes.clone(), None).unwrap(),
            Content::Binary(bytes)
        );
    }

    #[test]
    fn read_with_charset_decodes() {
        let content = read_content("héllo".as_bytes().to_vec(), Some("utf-8")).unwrap();
        assert_eq!(content.as_text(), Some("héllo"));

        let latin = read_content(vec![0x68, 0xe9], Some("latin1")).unwrap();
        assert_eq!(latin.as_text(), Some("hé"));
    }

    #[test]
    fn malformed_input_is_rejected_not_replaced() {
        let err = read_content(vec![0xc3, 0x28], Some("utf-8")).unwrap_err();
        assert!(matches!(err, FsError::Encoding(_)));
    }

    #[test]
    fn unknown_charset_is_rejected() {
        let err = read_content(b"x".to_vec(), Some("klingon")).unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn text_without_charset_goes_out_as_text() {
        let upload = prepare_upload("fn main() {}".into(), None).unwrap();
        assert_eq!(upload, Upload::text("fn main() {}"));
    }

    #[test]
    fn bytes_without_charset_are_base64_and_flagged() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
        let upload = prepare_upload(png.clone().into(), None).unwrap();
        assert!(upload.encoded);
        assert_eq!(upload.content, STANDARD.encode(&png));
        assert_eq!(upload.to_bytes().unwrap(), png);
    }

    #[test]
    fn non_utf8_charset_preserves_bytes() {
        let original = vec![0x63, 0x61, 0x66, 0xe9];
        let upload = prepare_upload(original.clone().into(), Some("windows-1252")).unwrap();
        assert!(upload.encoded);
        assert_eq!(upload.to_bytes().unwrap(), original);
    }

    #[test]
    fn unrepresentable_text_is_rejected() {
        let err = prepare_upload("日本".into(), Some("windows-1252")).unwrap_err();
        assert!(matches!(err, FsError::Encoding(_)));
    }

    #[test]
    fn utf16_cannot_be_written() {
        let err = encode_text("x", "utf-16le").unwrap_err();
        assert!(matches!(err, FsError::Encoding(_)));
    }

    #[test]
    fn text_store_rejects_binary() {
        assert_eq!(to_text(b"plain".to_vec().into(), None).unwrap(), "plain");
        assert!(to_text(vec![0xff, 0xfe, 0x00].into(), None).is_err());
    }

    proptest! {
        #[test]
        fn windows_1252_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let read = read_content(bytes.clone(), Some("windows-1252")).unwrap();
            let upload = prepare_upload(read.into(), Some("windows-1252")).unwrap();
            prop_assert_eq!(upload.to_bytes().unwrap(), bytes);
        }

        #[test]
        fn utf8_round_trips(text in ".*") {
            let read = read_content(text.clone().into_bytes(), Some("utf-8")).unwrap();
            let upload = prepare_upload(read.into(), Some("utf-8")).unwrap();
            prop_assert!(!upload.encoded);
            prop_assert_eq!(upload.to_bytes().unwrap(), text.into_bytes());
        }

        #[test]
        fn binary_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let read = read_content(bytes.clone(), None).unwrap();
            let upload = prepare_upload(read.into(), None).unwrap();
            prop_assert!(upload.encoded);
            prop_assert_eq!(upload.to_bytes().unwrap(), bytes);
        }
    }
}
