//! Image data URIs.
//!
//! Uploaded images travel inside requests as `data:<mime>;base64,<payload>`
//! strings. This module encodes files into that form, enforcing the upload
//! size threshold before anything is read, and validates incoming URIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;

use crate::error::ImageError;

/// Largest accepted image, measured on the decoded bytes.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type, lowercased (e.g. `image/png`).
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parses a base64 data URI.
    pub fn parse(uri: &str) -> Result<Self, ImageError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(ImageError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim().to_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(ImageError::NotBase64);
        }

        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self { mime, bytes })
    }

    /// Encodes back into `data:<mime>;base64,<payload>` form.
    pub fn to_uri(&self) -> String {
        encode_data_uri(&self.mime, &self.bytes)
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Builds a base64 data URI from raw bytes.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Parses `uri` and checks that it is an image no larger than `max_bytes`.
pub fn validate_image_data_uri(uri: &str, max_bytes: usize) -> Result<DataUri, ImageError> {
    let parsed = DataUri::parse(uri)?;
    if !parsed.is_image() {
        return Err(ImageError::UnsupportedMediaType(parsed.mime));
    }
    if parsed.bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: parsed.bytes.len(),
            limit: max_bytes,
        });
    }
    Ok(parsed)
}

/// Guesses an image media type from a file extension.
pub fn image_mime_for_path(path: &Path) -> Result<&'static str, ImageError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "bmp" => Ok("image/bmp"),
        _ => Err(ImageError::UnknownExtension(path.display().to_string())),
    }
}

/// Reads an image file into a data URI.
///
/// The size is checked from file metadata first, so an oversized file is
/// rejected without being read.
pub fn encode_image_file(path: &Path, max_bytes: usize) -> Result<String, ImageError> {
    let mime = image_mime_for_path(path)?;
    let size = fs::metadata(path)?.len() as usize;
    if size > max_bytes {
        return Err(ImageError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let bytes = fs::read(path)?;
    Ok(encode_data_uri(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_valid_uri() {
        let uri = encode_data_uri("image/png", b"\x89PNG");
        let parsed = DataUri::parse(&uri).expect("valid uri");
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.bytes, b"\x89PNG");
        assert_eq!(parsed.to_uri(), uri);
    }

    #[test]
    fn test_parse_rejects_non_data_uri() {
        assert!(matches!(
            DataUri::parse("https://example.com/a.png"),
            Err(ImageError::NotDataUri)
        ));
        assert!(matches!(DataUri::parse("data:image/png;base64"), Err(ImageError::NotDataUri)));
    }

    #[test]
    fn test_parse_requires_base64() {
        assert!(matches!(
            DataUri::parse("data:image/svg+xml,<svg/>"),
            Err(ImageError::NotBase64)
        ));
    }

    #[test]
    fn test_parse_rejects_bad_payload() {
        assert!(matches!(
            DataUri::parse("data:image/png;base64,!!!"),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_images() {
        let uri = encode_data_uri("text/plain", b"hello");
        assert!(matches!(
            validate_image_data_uri(&uri, 1024),
            Err(ImageError::UnsupportedMediaType(m)) if m == "text/plain"
        ));
    }

    #[test]
    fn test_validate_enforces_limit() {
        let uri = encode_data_uri("image/jpeg", &[0u8; 32]);
        assert!(validate_image_data_uri(&uri, 32).is_ok());
        assert!(matches!(
            validate_image_data_uri(&uri, 31),
            Err(ImageError::TooLarge { size: 32, limit: 31 })
        ));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(image_mime_for_path(Path::new("a/b.PNG")).ok(), Some("image/png"));
        assert_eq!(image_mime_for_path(Path::new("x.jpeg")).ok(), Some("image/jpeg"));
        assert!(image_mime_for_path(Path::new("notes.txt")).is_err());
        assert!(image_mime_for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_encode_image_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("problem.png");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(&[1, 2, 3, 4]).expect("write");

        let uri = encode_image_file(&path, 16).expect("encode");
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(DataUri::parse(&uri).expect("parse").bytes, vec![1, 2, 3, 4]);

        let err = encode_image_file(&path, 3).expect_err("too large");
        assert!(matches!(err, ImageError::TooLarge { size: 4, limit: 3 }));
    }
}
