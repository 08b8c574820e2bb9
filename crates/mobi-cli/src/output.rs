// Generated images are written to disk so they can be opened outside the
// terminal.

use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use mobi_core::ImageFile;
use tracing::info;

/// Directory generated images are saved under, relative to the working
/// directory.
pub const OUTPUT_DIR: &str = "renders";

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "img",
    }
}

/// Split a `data:<mime>;base64,<payload>` URL.
pub fn parse_data_url(url: &str) -> Option<ImageFile> {
    let rest = url.strip_prefix("data:")?;
    let (mime_type, base64) = rest.split_once(";base64,")?;
    Some(ImageFile {
        base64: base64.to_string(),
        mime_type: mime_type.to_string(),
    })
}

/// Decode `image` into `dir` as `<prefix>-<timestamp>.<ext>`.
pub fn save_image(dir: &Path, prefix: &str, image: &ImageFile) -> anyhow::Result<PathBuf> {
    let bytes = BASE64
        .decode(image.base64.as_bytes())
        .context("generated image is not valid base64")?;
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let stamp = Local::now().format("%Y%m%d-%H%M%S%3f");
    let path = dir.join(format!("{prefix}-{stamp}.{}", extension_for(&image.mime_type)));
    std::fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "image saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_parts() {
        let image = parse_data_url("data:image/jpeg;base64,QUJD").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.base64, "QUJD");
        assert!(parse_data_url("https://example.com/a.jpg").is_none());
        assert!(parse_data_url("data:image/png,raw").is_none());
    }

    #[test]
    fn saves_decoded_bytes() {
        let dir = std::env::temp_dir().join("mobi_cli_output");
        let _ = std::fs::remove_dir_all(&dir);

        let path = save_image(
            &dir,
            "design",
            &ImageFile {
                base64: "QUJD".into(),
                mime_type: "image/png".into(),
            },
        )
        .unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("design-"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ABC");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let dir = std::env::temp_dir().join("mobi_cli_output_bad");
        let err = save_image(
            &dir,
            "dream",
            &ImageFile {
                base64: "***".into(),
                mime_type: "image/jpeg".into(),
            },
        );
        assert!(err.is_err());
    }
}
