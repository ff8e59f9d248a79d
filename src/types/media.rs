//! Media attachments.
//!
//! An [`Image`] records where its bytes come from and loads them lazily: a
//! path is only read the first time the bytes are needed (usually when a
//! provider adapter serializes the message), and the result is cached in the
//! value. Base64 input is decoded when the image is built and the text is not
//! kept; [`Image::base64`] always re-encodes the bytes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::LlmError;
use crate::utils::mime::guess_mime;

/// Where an attachment's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A local file, read on first use.
    Path(PathBuf),
    /// Base64 text supplied by the caller, decoded on construction.
    Base64,
    /// A remote URL. Fetching is left to providers that accept URLs.
    Url(String),
    /// Raw bytes supplied by the caller.
    Binary,
}

/// An image attachment.
#[derive(Clone)]
pub struct Image {
    source: MediaSource,
    mime_type: Option<String>,
    bytes: Arc<OnceLock<Vec<u8>>>,
    decode_error: Option<String>,
}

impl Image {
    /// Reference a local file. No I/O happens here.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            source: MediaSource::Path(path.as_ref().to_path_buf()),
            mime_type: None,
            bytes: Arc::new(OnceLock::new()),
            decode_error: None,
        }
    }

    /// Decode base64-encoded data.
    ///
    /// Undecodable input is reported by [`Image::bytes`] as
    /// [`LlmError::MediaUnavailable`].
    pub fn from_base64(data: impl AsRef<str>, mime_type: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let decode_error = match STANDARD.decode(data.as_ref().trim()) {
            Ok(bytes) => {
                let _ = cell.set(bytes);
                None
            }
            Err(e) => Some(e.to_string()),
        };
        Self {
            source: MediaSource::Base64,
            mime_type: Some(mime_type.into()),
            bytes: Arc::new(cell),
            decode_error,
        }
    }

    /// Reference a remote image.
    pub fn from_url(url: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            source: MediaSource::Url(url.into()),
            mime_type,
            bytes: Arc::new(OnceLock::new()),
            decode_error: None,
        }
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(bytes.into());
        Self {
            source: MediaSource::Binary,
            mime_type: Some(mime_type.into()),
            bytes: Arc::new(cell),
            decode_error: None,
        }
    }

    /// Override the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn url(&self) -> Option<&str> {
        match &self.source {
            MediaSource::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Whether the bytes are already in memory.
    pub fn is_loaded(&self) -> bool {
        self.bytes.get().is_some()
    }

    /// Raw bytes, loading them on first access.
    ///
    /// Fails with [`LlmError::MediaUnavailable`] when the file cannot be
    /// read, the base64 cannot be decoded, the source is a URL, or the
    /// resulting bytes are empty.
    pub fn bytes(&self) -> Result<&[u8], LlmError> {
        if self.bytes.get().is_none() {
            let loaded = self.load()?;
            // A concurrent loader may have won the race; either value is identical.
            let _ = self.bytes.set(loaded);
        }
        match self.bytes.get() {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(LlmError::media_unavailable(self.describe(), "no bytes")),
        }
    }

    /// Standard base64 encoding of [`Image::bytes`].
    pub fn base64(&self) -> Result<String, LlmError> {
        Ok(STANDARD.encode(self.bytes()?))
    }

    /// Explicit MIME type, otherwise one sniffed from the content or path.
    pub fn mime_type(&self) -> Result<String, LlmError> {
        if let Some(mime) = &self.mime_type {
            return Ok(mime.clone());
        }
        let hint = match &self.source {
            MediaSource::Path(path) => path.to_str().map(str::to_string),
            MediaSource::Url(url) => Some(url.clone()),
            _ => None,
        };
        let bytes = match &self.source {
            MediaSource::Url(_) => None,
            _ => Some(self.bytes()?),
        };
        Ok(guess_mime(bytes, hint.as_deref()))
    }

    fn load(&self) -> Result<Vec<u8>, LlmError> {
        match &self.source {
            MediaSource::Path(path) => std::fs::read(path)
                .map_err(|e| LlmError::media_unavailable(self.describe(), e.to_string())),
            MediaSource::Base64 => Err(LlmError::media_unavailable(
                self.describe(),
                self.decode_error.as_deref().unwrap_or("no bytes"),
            )),
            MediaSource::Url(_) => Err(LlmError::media_unavailable(
                self.describe(),
                "remote media is not downloaded locally",
            )),
            MediaSource::Binary => Err(LlmError::media_unavailable(self.describe(), "no bytes")),
        }
    }

    fn describe(&self) -> String {
        match &self.source {
            MediaSource::Path(path) => format!("path {}", path.display()),
            MediaSource::Base64 => "base64".to_string(),
            MediaSource::Url(url) => format!("url {url}"),
            MediaSource::Binary => "bytes".to_string(),
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("source", &self.describe())
            .field("mime_type", &self.mime_type)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Path and URL images compare by reference, whether or not they are loaded.
/// Images built from in-memory data compare by content.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        if self.source != other.source || self.mime_type != other.mime_type {
            return false;
        }
        match self.source {
            MediaSource::Path(_) | MediaSource::Url(_) => true,
            MediaSource::Base64 | MediaSource::Binary => {
                self.bytes.get() == other.bytes.get() && self.decode_error == other.decode_error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_path_defers_io() {
        let image = Image::from_path("/definitely/not/here.png");
        assert!(!image.is_loaded());
        let err = image.bytes().unwrap_err();
        assert!(matches!(err, LlmError::MediaUnavailable { .. }));
    }

    #[test]
    fn from_path_loads_and_caches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"pixels").unwrap();

        let image = Image::from_path(file.path());
        assert_eq!(image.bytes().unwrap(), b"pixels");
        assert!(image.is_loaded());

        // Cached: removing the file no longer matters.
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
        assert_eq!(image.bytes().unwrap(), b"pixels");
    }

    #[test]
    fn raw_bytes_round_trip_through_base64() {
        let raw = vec![0u8, 1, 2, 254, 255];
        let image = Image::from_bytes(raw.clone(), "image/png");
        let encoded = image.base64().unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), raw);
    }

    #[test]
    fn invalid_base64_is_unavailable() {
        let image = Image::from_base64("%%%not base64%%%", "image/png");
        assert!(matches!(
            image.bytes(),
            Err(LlmError::MediaUnavailable { .. })
        ));
    }

    #[test]
    fn empty_bytes_are_rejected() {
        let image = Image::from_bytes(Vec::new(), "image/png");
        assert!(matches!(
            image.bytes(),
            Err(LlmError::MediaUnavailable { .. })
        ));

        let file = tempfile::NamedTempFile::new().unwrap();
        let image = Image::from_path(file.path());
        assert!(matches!(
            image.bytes(),
            Err(LlmError::MediaUnavailable { .. })
        ));
    }

    #[test]
    fn base64_is_decoded_once_and_not_kept() {
        let image = Image::from_base64(STANDARD.encode(b"pixels"), "image/png");
        assert_eq!(image.source(), &MediaSource::Base64);
        assert!(image.is_loaded());
        assert_eq!(image.bytes().unwrap(), b"pixels");
        assert_eq!(image.base64().unwrap(), STANDARD.encode(b"pixels"));
    }

    #[test]
    fn path_images_compare_equal_regardless_of_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"pixels").unwrap();

        let loaded = Image::from_path(file.path());
        let pending = Image::from_path(file.path());
        loaded.bytes().unwrap();
        assert!(loaded.is_loaded() && !pending.is_loaded());
        assert_eq!(loaded, pending);

        assert_ne!(
            Image::from_bytes(vec![1u8], "image/png"),
            Image::from_bytes(vec![2u8], "image/png")
        );
        assert_eq!(
            Image::from_base64(STANDARD.encode([7u8]), "image/png"),
            Image::from_base64(STANDARD.encode([7u8]), "image/png")
        );
    }

    #[test]
    fn mime_type_is_sniffed_for_paths() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0])
            .unwrap();
        let image = Image::from_path(file.path());
        assert_eq!(image.mime_type().unwrap(), "image/png");
    }
}
