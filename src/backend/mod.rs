//! Image collaborator used by the compositing pipeline.
//!
//! The pipeline never touches pixels directly. Everything it needs from an image library is
//! expressed by [`ImageBackend`], and [`RasterBackend`] is the default implementation on top of
//! the `image` crate.

use std::path::Path;

use crate::foundation::{core::BlendMode, core::Region, error::StackResult};

pub mod blend;
pub mod codec;
pub mod raster;

#[cfg(test)]
#[path = "../../tests/unit/support/mock.rs"]
pub(crate) mod mock;

pub use raster::{ImageProbe, RasterBackend, RasterImage, probe_image};

/// One entry of a batched layering call: paint `image` at `(x, y)` using `blend`.
#[derive(Debug)]
pub struct Layer<'a, H> {
    /// Image to paint.
    pub image: &'a H,
    /// Blend rule.
    pub blend: BlendMode,
    /// Horizontal offset into the base.
    pub x: i64,
    /// Vertical offset into the base.
    pub y: i64,
}

impl<'a, H> Layer<'a, H> {
    /// Layer painted at the base origin.
    pub fn at_origin(image: &'a H, blend: BlendMode) -> Self {
        Self {
            image,
            blend,
            x: 0,
            y: 0,
        }
    }
}

/// Capability surface of an image-processing library.
///
/// Handles are owned values; dropping a handle releases whatever it holds, so every exit path of
/// a caller (including `?` returns) releases the handles it created.
pub trait ImageBackend {
    /// Opaque decoded image.
    type Handle;

    /// Decode the image at `path`.
    fn open(&self, path: &Path) -> StackResult<Self::Handle>;

    /// Independent deep copy of `handle`.
    fn duplicate(&self, handle: &Self::Handle) -> StackResult<Self::Handle>;

    /// Paint every entry of `layers` onto `base`, in order.
    fn layer_many(&self, base: &mut Self::Handle, layers: &[Layer<'_, Self::Handle>])
    -> StackResult<()>;

    /// Paint a single `overlay` onto `base`.
    fn layer(
        &self,
        base: &mut Self::Handle,
        overlay: &Self::Handle,
        blend: BlendMode,
        x: i64,
        y: i64,
    ) -> StackResult<()> {
        self.layer_many(
            base,
            &[Layer {
                image: overlay,
                blend,
                x,
                y,
            }],
        )
    }

    /// Crop `handle` in place to `region`.
    fn extract_region(&self, handle: &mut Self::Handle, region: Region) -> StackResult<()>;

    /// Integer metadata that must be present.
    fn required_int_meta(&self, handle: &Self::Handle, key: &str) -> StackResult<i64>;

    /// Integer metadata with a fallback for absence. Malformed values still fail.
    fn optional_int_meta(&self, handle: &Self::Handle, key: &str, default: i64)
    -> StackResult<i64>;

    /// Width in pixels.
    fn width(&self, handle: &Self::Handle) -> u32;

    /// Height in pixels (the full packed height for multi-page images).
    fn height(&self, handle: &Self::Handle) -> u32;

    /// Label of the format `handle` was decoded from.
    fn format_name(&self, handle: &Self::Handle) -> String;

    /// Stack `frames` top to bottom into one multi-page image.
    fn join_vertically(&self, frames: Vec<Self::Handle>) -> StackResult<Self::Handle>;

    /// Encode a multi-page image as an animation.
    fn export_animated(&self, handle: &Self::Handle) -> StackResult<Vec<u8>>;

    /// Encode in the format the image was decoded from.
    fn export_native(&self, handle: &Self::Handle) -> StackResult<Vec<u8>>;
}
