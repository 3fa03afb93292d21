//! gifstack composites still images and at most one animated GIF into a single image.
//!
//! # Pipeline overview
//!
//! 1. **Classify**: input paths split into still layers and an optional animated source.
//! 2. **Static**: the still layers are painted source-over, in order, onto the first one.
//! 3. **Animated** (only with an animated source): the static canvas is painted
//!    destination-over behind every frame of the source, and the frames are joined back into
//!    one packed multi-page image with the source's page height.
//! 4. **Export + write**: the result is encoded (animated GIF, or the native format of the
//!    first still) and written once to the output path.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Fail fast, no partial output**: every error aborts the request and nothing is written.
//! - **Pluggable image library**: the pipeline only talks to [`ImageBackend`];
//!   [`RasterBackend`] is the default, built on the `image` crate.
//! - **Straight-alpha RGBA8** inside [`RasterBackend`]; blending weights by alpha in wider
//!   integers, so pixels no layer covers are written back unchanged.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backend;
mod foundation;
mod pipeline;

pub use backend::codec::{
    DEFAULT_DELAY_MS, decode_gif_pages, decode_image, encode_gif, encode_native, format_label,
};
pub use backend::{ImageBackend, ImageProbe, Layer, RasterBackend, RasterImage, probe_image};
pub use foundation::core::{
    BlendMode, DELAY, LOOP, MetaValue, Metadata, N_PAGES, OutputKind, PAGE_HEIGHT, Region,
};
pub use foundation::error::{StackError, StackResult};
pub use pipeline::animated::{FrameThreading, PageLayout, composite_animated};
pub use pipeline::classify::{ANIMATED_EXTENSIONS, InputPlan, classify_inputs, is_animated_path};
pub use pipeline::orchestrate::{
    CompositeOpts, CompositeOutput, CompositeSummary, Stage, composite_files,
    composite_files_with, render_composite,
};
pub use pipeline::output::{OUTPUT_MODE, ensure_parent_dir, write_output};
pub use pipeline::static_layers::composite_static;
