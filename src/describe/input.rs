//! Image input for the describer.
//!
//! The file is read once, decoded with the `image` crate to make sure it is a
//! real bitmap, and kept as raw bytes plus a MIME type for the inline-data
//! part of the request.

use std::path::{Path, PathBuf};

use base64::Engine as _;

use super::DescribeError;

/// A decodable image ready to be sent to the model.
#[derive(Debug, Clone)]
pub struct ImageInput {
    path: PathBuf,
    bytes: Vec<u8>,
    mime_type: &'static str,
    width: u32,
    height: u32,
}

impl ImageInput {
    /// Read and decode the image at `path`.
    ///
    /// # Errors
    ///
    /// - [`DescribeError::ImageNotFound`]: nothing exists at `path`.
    /// - [`DescribeError::ImageRead`]: the file exists but cannot be read.
    /// - [`DescribeError::ImageDecode`]: the bytes are not a supported image.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescribeError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DescribeError::ImageNotFound(path.to_path_buf()),
            _ => DescribeError::ImageRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let format = image::guess_format(&bytes).ok();
        let decoded = match format {
            Some(f) => image::load_from_memory_with_format(&bytes, f),
            None => image::load_from_memory(&bytes),
        }
        .map_err(|e| DescribeError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mime_type = format
            .map(|f| f.to_mime_type())
            .unwrap_or_else(|| mime_from_extension(path));

        log::debug!(
            "loaded {} ({}x{}, {}, {} bytes)",
            path.display(),
            decoded.width(),
            decoded.height(),
            mime_type,
            bytes.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            mime_type,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Pixel dimensions `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Standard base64 encoding of the raw file bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Fallback MIME lookup by file extension.
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
