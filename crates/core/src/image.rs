//! Optional image attached to a submission.
//!
//! Type and size are checked before any bytes are read or stored.

use base64::Engine as _;
use std::path::Path;

pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{media_type:?} is not an image type")]
    UnsupportedType { media_type: String },

    #[error("image is {size} bytes; the limit is {limit} bytes (5 MiB)")]
    TooLarge { size: u64, limit: u64 },

    /// A streamed body ran past the limit before its full size was known.
    #[error("image body exceeds the {limit} byte limit (5 MiB)")]
    BodyTooLarge { limit: u64 },

    #[error("failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn check_upload(media_type: &str, size: u64) -> Result<(), ImageError> {
    if !media_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(ImageError::UnsupportedType {
            media_type: media_type.to_string(),
        });
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let media_type = media_type.into();
        check_upload(&media_type, bytes.len() as u64)?;
        Ok(Self {
            name: name.into(),
            media_type: media_type.trim().to_ascii_lowercase(),
            bytes,
        })
    }

    /// Reads an image file, inferring its media type from the extension.
    pub async fn read_file(path: &Path) -> Result<Self, ImageError> {
        let io = |source| ImageError::Io {
            path: path.display().to_string(),
            source,
        };
        let media_type = media_type_for(path).unwrap_or("application/octet-stream");
        let size = tokio::fs::metadata(path).await.map_err(io)?.len();
        check_upload(media_type, size)?;

        let bytes = tokio::fs::read(path).await.map_err(io)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Self::from_bytes(name, media_type, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
