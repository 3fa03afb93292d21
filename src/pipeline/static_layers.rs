use std::path::PathBuf;

use crate::{
    backend::{ImageBackend, Layer},
    foundation::{
        core::BlendMode,
        error::{StackError, StackResult},
    },
};

/// Load `paths` and paint them, in order, onto the first one.
///
/// Every later image is painted source-over at the origin of the first. All images are decoded
/// before any layering happens, so a load failure leaves nothing half-composited.
pub fn composite_static<B: ImageBackend + ?Sized>(
    backend: &B,
    paths: &[PathBuf],
) -> StackResult<B::Handle> {
    let Some((first, rest)) = paths.split_first() else {
        return Err(StackError::invalid_input("no static images to composite"));
    };

    let mut base = backend.open(first)?;
    if rest.is_empty() {
        return Ok(base);
    }

    let overlays = rest
        .iter()
        .map(|path| backend.open(path))
        .collect::<StackResult<Vec<_>>>()?;
    let layers = overlays
        .iter()
        .map(|img| Layer::at_origin(img, BlendMode::Over))
        .collect::<Vec<_>>();

    backend.layer_many(&mut base, &layers)?;
    Ok(base)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/static_layers.rs"]
mod tests;
