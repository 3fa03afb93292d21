use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{ImageFormat, RgbaImage};

use crate::{
    backend::{ImageBackend, Layer, blend, codec},
    foundation::{
        core::{DELAY, Metadata, N_PAGES, PAGE_HEIGHT, Region},
        error::{StackError, StackResult},
    },
};

/// Decoded image held by [`RasterBackend`].
///
/// Pixels are straight-alpha RGBA8. Multi-page images are stored as one tall raster whose
/// layout is described by the `page-height` and `n-pages` metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pub(crate) pixels: RgbaImage,
    pub(crate) format: ImageFormat,
    pub(crate) meta: Metadata,
}

impl RasterImage {
    /// Wrap straight-alpha RGBA8 pixels.
    pub fn from_rgba8(pixels: RgbaImage, format: ImageFormat) -> Self {
        Self {
            pixels,
            format,
            meta: Metadata::new(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Format the image was decoded from.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Attached metadata.
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Mutable metadata.
    pub fn meta_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    /// Straight-alpha pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Owned copy of the pixels.
    pub fn to_rgba8(&self) -> RgbaImage {
        self.pixels.clone()
    }
}

/// [`ImageBackend`] backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterBackend;

impl RasterBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for RasterBackend {
    type Handle = RasterImage;

    fn open(&self, path: &Path) -> StackResult<RasterImage> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read '{}'", path.display()))
            .map_err(|e| StackError::load(path, e))?;
        codec::decode_image(&bytes).map_err(|e| StackError::load(path, e))
    }

    fn duplicate(&self, handle: &RasterImage) -> StackResult<RasterImage> {
        Ok(handle.clone())
    }

    fn layer_many(
        &self,
        base: &mut RasterImage,
        layers: &[Layer<'_, RasterImage>],
    ) -> StackResult<()> {
        for layer in layers {
            blend::layer_in_place(
                &mut base.pixels,
                &layer.image.pixels,
                layer.x,
                layer.y,
                layer.blend,
            );
        }
        Ok(())
    }

    fn extract_region(&self, handle: &mut RasterImage, region: Region) -> StackResult<()> {
        let (width, height) = handle.pixels.dimensions();
        if !region.fits_within(width, height) {
            return Err(StackError::region(format!(
                "{}x{} at ({}, {}) is outside the {width}x{height} image",
                region.width, region.height, region.x, region.y
            )));
        }
        handle.pixels = image::imageops::crop_imm(
            &handle.pixels,
            region.x,
            region.y,
            region.width,
            region.height,
        )
        .to_image();
        Ok(())
    }

    fn required_int_meta(&self, handle: &RasterImage, key: &str) -> StackResult<i64> {
        handle.meta.required_int(key)
    }

    fn optional_int_meta(
        &self,
        handle: &RasterImage,
        key: &str,
        default: i64,
    ) -> StackResult<i64> {
        handle.meta.int_or(key, default)
    }

    fn width(&self, handle: &RasterImage) -> u32 {
        handle.width()
    }

    fn height(&self, handle: &RasterImage) -> u32 {
        handle.height()
    }

    fn format_name(&self, handle: &RasterImage) -> String {
        codec::format_label(handle.format)
    }

    fn join_vertically(&self, frames: Vec<RasterImage>) -> StackResult<RasterImage> {
        let Some(first) = frames.first() else {
            return Err(StackError::reassembly("cannot join an empty frame sequence"));
        };
        let (width, page_height) = first.pixels.dimensions();
        let format = first.format;
        let mut meta = first.meta.clone();

        let pages = u32::try_from(frames.len())
            .map_err(|_| StackError::reassembly("frame count overflows u32"))?;
        let total_height = page_height
            .checked_mul(pages)
            .ok_or_else(|| StackError::reassembly("joined height overflows u32"))?;

        let mut pixels = RgbaImage::new(width, total_height);
        for (idx, frame) in frames.iter().enumerate() {
            if frame.pixels.dimensions() != (width, page_height) {
                return Err(StackError::reassembly(format!(
                    "frame {idx} is {}x{}, expected {width}x{page_height}",
                    frame.width(),
                    frame.height()
                )));
            }
            let top = i64::from(page_height) * idx as i64;
            image::imageops::replace(&mut pixels, &frame.pixels, 0, top);
        }

        meta.set_int(PAGE_HEIGHT, i64::from(page_height));
        meta.set_int(N_PAGES, i64::from(pages));
        Ok(RasterImage {
            pixels,
            format,
            meta,
        })
    }

    fn export_animated(&self, handle: &RasterImage) -> StackResult<Vec<u8>> {
        codec::encode_gif(handle)
    }

    fn export_native(&self, handle: &RasterImage) -> StackResult<Vec<u8>> {
        codec::encode_native(handle)
    }
}

/// Facts about an input image, as seen by [`RasterBackend`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ImageProbe {
    /// Probed path.
    pub path: PathBuf,
    /// Detected format label.
    pub format: String,
    /// Width in pixels.
    pub width: u32,
    /// Height of one page in pixels.
    pub page_height: u32,
    /// Number of pages (1 for still images).
    pub pages: u32,
    /// Per-page delays in milliseconds (empty for still images).
    pub delays_ms: Vec<i64>,
}

/// Decode `path` and describe its layout.
pub fn probe_image(path: &Path) -> StackResult<ImageProbe> {
    let backend = RasterBackend::new();
    let img = backend.open(path)?;
    let height = img.height();

    let page_height = img.meta.int_or(PAGE_HEIGHT, i64::from(height))?;
    let pages = img.meta.int_or(N_PAGES, 1)?;
    let page_height = u32::try_from(page_height)
        .map_err(|_| StackError::metadata(PAGE_HEIGHT, format!("out of range: {page_height}")))?;
    let pages = u32::try_from(pages)
        .map_err(|_| StackError::metadata(N_PAGES, format!("out of range: {pages}")))?;

    Ok(ImageProbe {
        path: path.to_path_buf(),
        format: codec::format_label(img.format),
        width: img.width(),
        page_height,
        pages,
        delays_ms: img
            .meta
            .int_array(DELAY)
            .map(<[i64]>::to_vec)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/backend/raster.rs"]
mod tests;
