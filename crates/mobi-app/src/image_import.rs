// Room-photo import: raw bytes or a file on disk become a base64 `ImageFile`
// with its MIME type kept.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mobi_core::ImageFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ImageImportError {
    #[error("El archivo no es una imagen válida.")]
    NotAnImage { mime_type: String },

    #[error("No se pudo leer el archivo como base64.")]
    Empty,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Image MIME type for a path's extension, case-insensitive.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime)
}

/// Encode `bytes` declared as `mime_type`. Only `image/*` is accepted.
pub fn image_from_bytes(bytes: &[u8], mime_type: &str) -> Result<ImageFile, ImageImportError> {
    if !mime_type.starts_with("image/") {
        return Err(ImageImportError::NotAnImage {
            mime_type: mime_type.to_string(),
        });
    }
    if bytes.is_empty() {
        return Err(ImageImportError::Empty);
    }
    Ok(ImageFile {
        base64: BASE64.encode(bytes),
        mime_type: mime_type.to_string(),
    })
}

/// Read an image file. The type check runs before the file is opened.
pub fn image_from_path(path: &Path) -> Result<ImageFile, ImageImportError> {
    let mime_type = mime_type_for_path(path).unwrap_or("application/octet-stream");
    if !mime_type.starts_with("image/") {
        return Err(ImageImportError::NotAnImage {
            mime_type: mime_type.to_string(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| ImageImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), mime_type, "room photo loaded");
    image_from_bytes(&bytes, mime_type)
}
