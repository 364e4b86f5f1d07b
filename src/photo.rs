//! Photo loading.
//!
//! A photo reference is a `data:` URL, an `http(s)://` URL, or a path in the
//! caller's storage layout. Every failure comes back as
//! [`RenderError::AssetLoad`]; deciding to carry on without the photo is the
//! orchestrator's call.

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::error::{RenderError, Result};

/// Upper bound on bytes read for a single photo.
const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;

/// A decoded photo ready to be placed on the page.
#[derive(Debug, Clone)]
pub struct Photo {
    pub image: DynamicImage,
}

impl Photo {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Debug, Clone)]
pub struct PhotoLoader {
    /// Root that `/`-prefixed references are resolved against.
    asset_root: PathBuf,
    /// Directory bare file names are looked up in.
    upload_dir: PathBuf,
    allow_remote: bool,
}

impl Default for PhotoLoader {
    fn default() -> Self {
        PhotoLoader::new(".", "uploads")
    }
}

impl PhotoLoader {
    pub fn new(asset_root: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        PhotoLoader {
            asset_root: asset_root.into(),
            upload_dir: upload_dir.into(),
            allow_remote: false,
        }
    }

    pub fn with_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    pub fn load(&self, reference: &str) -> Result<Photo> {
        let bytes = self.fetch(reference)?;
        let image = decode_image(&bytes)?;
        debug!(
            width = image.width(),
            height = image.height(),
            "decoded photo"
        );
        Ok(Photo { image })
    }

    fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        if reference.starts_with("data:") {
            load_base64_image(reference)
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            if !self.allow_remote {
                return Err(RenderError::AssetLoad(format!(
                    "remote photos are disabled: {}",
                    reference
                )));
            }
            load_remote_image(reference)
        } else {
            let path = self.resolve_path(reference)?;
            load_local_image(&path)
        }
    }

    /// Maps a path-like reference into the storage layout.
    ///
    /// `/uploads/a.png` is relative to the asset root, `a.png` to the upload
    /// directory. Absolute paths are kept only when they already point inside
    /// one of the two roots. `..` components are refused.
    pub fn resolve_path(&self, reference: &str) -> Result<PathBuf> {
        let decoded = urlencoding::decode(reference)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| reference.to_string());
        let path = Path::new(&decoded);

        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(RenderError::AssetLoad(format!(
                "photo path escapes storage: {}",
                reference
            )));
        }

        if path.is_absolute() && (path.starts_with(&self.asset_root) || path.starts_with(&self.upload_dir)) {
            return Ok(path.to_path_buf());
        }

        if decoded.starts_with('/') || has_drive_prefix(&decoded) {
            let relative: PathBuf = path
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            return Ok(self.asset_root.join(relative));
        }

        Ok(self.upload_dir.join(path))
    }
}

fn has_drive_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn load_base64_image(data_url: &str) -> Result<Vec<u8>> {
    // Parse data URL: data:image/png;base64,xxxxx
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| RenderError::AssetLoad("invalid data URL format".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(RenderError::AssetLoad("photo data URL must be base64".to_string()));
    }

    base64::Engine::decode(&base64::engine::general_purpose::STANDARD, payload.trim())
        .map_err(|e| RenderError::AssetLoad(format!("base64 decode error: {}", e)))
}

fn load_remote_image(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| RenderError::AssetLoad(format!("HTTP request failed: {}", e)))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_PHOTO_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| RenderError::AssetLoad(format!("failed to read response: {}", e)))?;

    Ok(bytes)
}

fn load_local_image(path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path)
        .map_err(|e| RenderError::AssetLoad(format!("{}: {}", path.display(), e)))?;
    let mut bytes = Vec::new();
    file.take(MAX_PHOTO_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| RenderError::AssetLoad(format!("{}: {}", path.display(), e)))?;
    Ok(bytes)
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(RenderError::AssetLoad("image data is empty".to_string()));
    }

    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RenderError::AssetLoad(format!("failed to guess image format: {}", e)))?
        .decode()
        .map_err(|e| RenderError::AssetLoad(format!("failed to decode image (len={}): {}", bytes.len(), e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::Engine;
    use image::{ImageFormat, Rgb, RgbImage};

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resolve_path_conventions() {
        let loader = PhotoLoader::new("/srv/app", "/srv/app/uploads");

        assert_eq!(
            loader.resolve_path("/uploads/me.png").unwrap(),
            PathBuf::from("/srv/app/uploads/me.png")
        );
        assert_eq!(
            loader.resolve_path("me-1700000000.png").unwrap(),
            PathBuf::from("/srv/app/uploads/me-1700000000.png")
        );
        assert_eq!(
            loader.resolve_path("/srv/app/uploads/me.png").unwrap(),
            PathBuf::from("/srv/app/uploads/me.png")
        );
        assert_eq!(
            loader.resolve_path("my%20photo.png").unwrap(),
            PathBuf::from("/srv/app/uploads/my photo.png")
        );
    }

    #[test]
    fn test_resolve_path_refuses_traversal() {
        let loader = PhotoLoader::new("/srv/app", "/srv/app/uploads");
        let err = loader.resolve_path("../../etc/passwd").unwrap_err();
        assert!(err.is_recoverable());
        assert!(loader.resolve_path("/uploads/%2E%2E/secret.png").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("me.png"), png_bytes(8, 4)).unwrap();

        let loader = PhotoLoader::new(dir.path(), dir.path());
        let photo = loader.load("me.png").unwrap();
        assert_eq!((photo.width(), photo.height()), (8, 4));
    }

    #[test]
    fn test_load_from_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 3));
        let photo = PhotoLoader::default()
            .load(&format!("data:image/png;base64,{}", encoded))
            .unwrap();
        assert_eq!(photo.width(), 3);
    }

    #[test]
    fn test_failures_are_asset_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not an image").unwrap();
        let loader = PhotoLoader::new(dir.path(), dir.path());

        for reference in ["missing.png", "broken.png", "data:image/png,abc", "https://example.com/me.png"] {
            let err = loader.load(reference).unwrap_err();
            assert!(matches!(err, RenderError::AssetLoad(_)), "{}: {}", reference, err);
        }
    }
}
