use std::path::{Path, PathBuf};

use crate::{
    backend::{ImageBackend, RasterBackend},
    foundation::{core::OutputKind, error::StackResult},
    pipeline::{
        animated::{FrameThreading, PageLayout, composite_animated},
        classify::classify_inputs,
        output::{check_overwrite, write_output},
        static_layers::composite_static,
    },
};

/// Options for a composite request.
#[derive(Clone, Debug)]
pub struct CompositeOpts {
    /// Compose animation frames in parallel.
    pub parallel: bool,
    /// Override rayon worker threads (parallel mode only).
    pub threads: Option<usize>,
    /// Replace an existing output file.
    pub overwrite: bool,
}

impl Default for CompositeOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            overwrite: true,
        }
    }
}

impl CompositeOpts {
    /// Check option values before any input is touched.
    pub fn validate(&self) -> StackResult<()> {
        self.threading().validate()
    }

    fn threading(&self) -> FrameThreading {
        FrameThreading {
            parallel: self.parallel,
            threads: self.threads,
        }
    }
}

/// Steps of a composite request, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Splitting inputs into static and animated.
    Classifying,
    /// Loading and layering the static images.
    CompositingStatic,
    /// Placing the static canvas behind every animation frame.
    CompositingAnimated,
    /// Encoding the result.
    Exporting,
    /// Output persisted.
    Written,
}

/// Encoded result of a composite request, before it is written anywhere.
#[derive(Clone, Debug)]
pub struct CompositeOutput {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Whether the bytes are an animation or the native still format.
    pub kind: OutputKind,
    /// Format label of the bytes.
    pub format: String,
    /// Number of static inputs that were layered.
    pub static_inputs: usize,
    /// Frame count of the animated output, if any.
    pub frames: Option<u32>,
    /// Frame height of the animated output, if any.
    pub frame_height: Option<u32>,
}

/// What a completed request wrote.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CompositeSummary {
    /// Written file.
    pub out_path: PathBuf,
    /// Output shape.
    pub kind: OutputKind,
    /// Output format label.
    pub format: String,
    /// Number of static inputs that were layered.
    pub static_inputs: usize,
    /// Frame count of the animated output, if any.
    pub frames: Option<u32>,
    /// Frame height of the animated output, if any.
    pub frame_height: Option<u32>,
    /// Size of the written file.
    pub bytes_written: usize,
}

/// Composite `inputs` into `out` with the default backend and options.
pub fn composite_files<P: AsRef<Path>>(
    inputs: &[P],
    out: &Path,
) -> StackResult<CompositeSummary> {
    composite_files_with(&RasterBackend::new(), inputs, out, &CompositeOpts::default())
}

/// Composite `inputs` into `out`.
///
/// Nothing is written unless every step succeeds; the output file is then written exactly once.
pub fn composite_files_with<B, P>(
    backend: &B,
    inputs: &[P],
    out: &Path,
    opts: &CompositeOpts,
) -> StackResult<CompositeSummary>
where
    B: ImageBackend + Sync + ?Sized,
    B::Handle: Send + Sync,
    P: AsRef<Path>,
{
    opts.validate()?;
    check_overwrite(out, opts.overwrite)?;

    let output = render_composite(backend, inputs, opts)?;
    write_output(out, &output.bytes, opts.overwrite)?;
    tracing::debug!(stage = ?Stage::Written, out = %out.display(), bytes = output.bytes.len());

    Ok(CompositeSummary {
        out_path: out.to_path_buf(),
        kind: output.kind,
        format: output.format,
        static_inputs: output.static_inputs,
        frames: output.frames,
        frame_height: output.frame_height,
        bytes_written: output.bytes.len(),
    })
}

/// Run classification, compositing and export without writing anything.
#[tracing::instrument(skip_all, fields(inputs = inputs.len(), parallel = opts.parallel))]
pub fn render_composite<B, P>(
    backend: &B,
    inputs: &[P],
    opts: &CompositeOpts,
) -> StackResult<CompositeOutput>
where
    B: ImageBackend + Sync + ?Sized,
    B::Handle: Send + Sync,
    P: AsRef<Path>,
{
    opts.validate()?;
    tracing::debug!(stage = ?Stage::Classifying);
    let plan = classify_inputs(inputs)?;

    tracing::debug!(
        stage = ?Stage::CompositingStatic,
        layers = plan.static_paths.len(),
    );
    let base = composite_static(backend, &plan.static_paths)?;

    let Some(anim_path) = plan.animated.as_deref() else {
        tracing::debug!(stage = ?Stage::Exporting, kind = "native");
        let bytes = backend.export_native(&base)?;
        return Ok(CompositeOutput {
            bytes,
            kind: OutputKind::Native,
            format: backend.format_name(&base),
            static_inputs: plan.static_paths.len(),
            frames: None,
            frame_height: None,
        });
    };

    tracing::debug!(stage = ?Stage::CompositingAnimated, source = %anim_path.display());
    let anim = backend.open(anim_path)?;
    let joined = composite_animated(backend, &base, &anim, &opts.threading())?;
    drop(anim);
    drop(base);

    let layout = PageLayout::read(backend, &joined)?;
    tracing::debug!(
        stage = ?Stage::Exporting,
        kind = "animated",
        frames = layout.pages,
        page_height = layout.page_height,
    );
    let bytes = backend.export_animated(&joined)?;

    Ok(CompositeOutput {
        bytes,
        kind: OutputKind::Animated,
        format: backend.format_name(&joined),
        static_inputs: plan.static_paths.len(),
        frames: Some(layout.pages),
        frame_height: Some(layout.page_height),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrate.rs"]
mod tests;
