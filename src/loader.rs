//! # Source Loading
//!
//! Resolves font and image sources to bytes and decodes images to RGBA8.
//!
//! Supported `src` forms:
//! - `data:<mime>;base64,...`: a data URI
//! - a file path: `/abs`, `./rel`, `../rel`, or any existing file
//! - raw base64-encoded bytes
//!
//! Results are memoized per source string in an [`AssetCache`], so an
//! image placed on every page is decoded once.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;

use crate::asset::AssetCache;
use crate::error::{FolioError, Result};

/// Row-major RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Caches decoded sources. Shareable across threads and documents.
#[derive(Debug, Default)]
pub struct Loader {
    fonts: AssetCache<Vec<u8>>,
    images: AssetCache<DecodedImage>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw font file bytes (TrueType, OpenType or WOFF).
    pub fn load_font(&self, src: &str) -> Result<Arc<Vec<u8>>> {
        self.fonts.get_or_load(src, || read_source_bytes(src))
    }

    pub fn load_image(&self, src: &str) -> Result<Arc<DecodedImage>> {
        self.images
            .get_or_load(src, || decode_image_bytes(&read_source_bytes(src)?))
    }

    pub fn fonts(&self) -> &AssetCache<Vec<u8>> {
        &self.fonts
    }

    pub fn images(&self) -> &AssetCache<DecodedImage> {
        &self.images
    }
}

/// Resolve the source string to raw bytes.
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| FolioError::Image("invalid data URI: missing comma".to_string()))?;
        if !header.ends_with(";base64") {
            return Ok(payload.as_bytes().to_vec());
        }
        return base64_decode(payload);
    }

    // Only explicit path prefixes or existing files count as paths, so
    // base64 (which may contain '/') is not mistaken for one.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") || Path::new(src).is_file() {
        return Ok(std::fs::read(src)?);
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| FolioError::Image(format!("base64 decode error: {}", e)))
}

/// Decode PNG, JPEG or WebP bytes to RGBA8.
pub fn decode_image_bytes(data: &[u8]) -> Result<DecodedImage> {
    if data.len() < 4 {
        return Err(FolioError::Image("image data too short".to_string()));
    }
    let image = image::load_from_memory(data).map_err(|e| FolioError::Image(format!("failed to decode image: {}", e)))?;
    let rgba = image.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
