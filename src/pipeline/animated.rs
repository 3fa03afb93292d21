use rayon::prelude::*;

use crate::{
    backend::ImageBackend,
    foundation::{
        core::{BlendMode, N_PAGES, PAGE_HEIGHT, Region},
        error::{StackError, StackResult},
    },
};

/// How the per-frame work of [`composite_animated`] is scheduled.
#[derive(Clone, Debug, Default)]
pub struct FrameThreading {
    /// Compose frames on a dedicated rayon pool.
    pub parallel: bool,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl FrameThreading {
    /// Reject `threads: Some(0)`, whether or not `parallel` is set.
    pub fn validate(&self) -> StackResult<()> {
        if self.threads == Some(0) {
            return Err(StackError::invalid_input(
                "frame threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Page layout read from an animated source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLayout {
    /// Height of one frame.
    pub page_height: u32,
    /// Number of frames.
    pub pages: u32,
}

impl PageLayout {
    /// Read `page-height` (required) and `n-pages` (defaults to 0) from `anim`.
    pub fn read<B: ImageBackend + ?Sized>(backend: &B, anim: &B::Handle) -> StackResult<Self> {
        let page_height = backend.required_int_meta(anim, PAGE_HEIGHT)?;
        let pages = backend.optional_int_meta(anim, N_PAGES, 0)?;

        let page_height = u32::try_from(page_height)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                StackError::metadata(PAGE_HEIGHT, format!("must be positive, got {page_height}"))
            })?;
        let pages = u32::try_from(pages).map_err(|_| {
            StackError::metadata(N_PAGES, format!("must be non-negative, got {pages}"))
        })?;

        Ok(Self { page_height, pages })
    }
}

/// Place a copy of `base` behind every frame of `anim` and join the results.
///
/// Frame `i` is rows `[i * page_height, (i + 1) * page_height)` of `anim`. Each frame is cut
/// from its own copy of `anim` and receives its own copy of `base`, painted destination-over, so
/// opaque frame pixels stay as they were and transparent ones show the base. Neither input is
/// modified. The first failing frame aborts the whole operation.
pub fn composite_animated<B>(
    backend: &B,
    base: &B::Handle,
    anim: &B::Handle,
    threading: &FrameThreading,
) -> StackResult<B::Handle>
where
    B: ImageBackend + Sync + ?Sized,
    B::Handle: Send + Sync,
{
    threading.validate()?;
    let layout = PageLayout::read(backend, anim)?;
    if layout.pages == 0 {
        return Err(StackError::reassembly("animated source reports zero frames"));
    }
    let width = backend.width(anim);

    let compose = |index: u32| compose_frame(backend, base, anim, index, width, layout);

    let frames = if threading.parallel {
        let pool = build_thread_pool(threading.threads)?;
        let composed = pool.install(|| {
            (0..layout.pages)
                .into_par_iter()
                .map(compose)
                .collect::<Vec<_>>()
        });
        // Report the lowest failing index, as the sequential path would.
        composed.into_iter().collect::<StackResult<Vec<_>>>()?
    } else {
        (0..layout.pages)
            .map(compose)
            .collect::<StackResult<Vec<_>>>()?
    };

    backend.join_vertically(frames).map_err(|e| match e {
        StackError::Reassembly(_) => e,
        other => StackError::reassembly(other.to_string()),
    })
}

fn compose_frame<B: ImageBackend + ?Sized>(
    backend: &B,
    base: &B::Handle,
    anim: &B::Handle,
    index: u32,
    width: u32,
    layout: PageLayout,
) -> StackResult<B::Handle> {
    let idx = index as usize;

    let mut frame = backend
        .duplicate(anim)
        .map_err(|e| StackError::frame_extraction(idx, e))?;
    let region = Region::page(index, width, layout.page_height)
        .map_err(|e| StackError::frame_extraction(idx, e))?;
    backend
        .extract_region(&mut frame, region)
        .map_err(|e| StackError::frame_extraction(idx, e))?;

    let canvas = backend
        .duplicate(base)
        .map_err(|e| StackError::frame_composite(idx, e))?;
    backend
        .layer(&mut frame, &canvas, BlendMode::DestOver, 0, 0)
        .map_err(|e| StackError::frame_composite(idx, e))?;

    Ok(frame)
}

fn build_thread_pool(threads: Option<usize>) -> StackResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        StackError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/animated.rs"]
mod tests;
