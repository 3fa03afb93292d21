use std::path::PathBuf;

/// Convenience result type used across gifstack.
pub type StackResult<T> = Result<T, StackError>;

/// Error taxonomy for a composite request.
///
/// Every variant is fatal to the request that raised it. Variants that concern a specific input
/// or animation frame carry the offending path or frame index.
#[derive(thiserror::Error, Debug)]
pub enum StackError {
    /// The request itself is malformed (too few inputs, bad options).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// More than one animated input was supplied.
    #[error("unsupported: more than one animated input ('{}' and '{}')", .first.display(), .second.display())]
    MultipleAnimated {
        /// First animated path seen.
        first: PathBuf,
        /// Second animated path seen.
        second: PathBuf,
    },

    /// An input could not be read or decoded.
    #[error("load error: '{}': {source:#}", .path.display())]
    Load {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying decode or IO failure.
        #[source]
        source: anyhow::Error,
    },

    /// Required per-image metadata is missing or malformed.
    #[error("metadata error: '{key}': {reason}")]
    Metadata {
        /// Metadata key that was queried.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A sub-region could not be extracted from an image.
    #[error("region error: {0}")]
    Region(String),

    /// Layering one image onto another failed.
    #[error("composite error: {0}")]
    Composite(String),

    /// Extracting animation frame `index` failed.
    #[error("frame {index}: extraction failed: {source}")]
    FrameExtraction {
        /// Zero-based frame index.
        index: usize,
        /// Backend failure.
        #[source]
        source: Box<StackError>,
    },

    /// Compositing the static canvas onto animation frame `index` failed.
    #[error("frame {index}: composite failed: {source}")]
    FrameComposite {
        /// Zero-based frame index.
        index: usize,
        /// Backend failure.
        #[source]
        source: Box<StackError>,
    },

    /// Joining composed frames back into one animated image failed.
    #[error("reassembly error: {0}")]
    Reassembly(String),

    /// Encoding the final image failed.
    #[error("export error: {format}: {source:#}")]
    Export {
        /// Target format label.
        format: String,
        /// Encoder failure.
        #[source]
        source: anyhow::Error,
    },

    /// Writing the output file failed.
    #[error("io error: '{}': {source}", .path.display())]
    Io {
        /// Output path being written.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StackError {
    /// Build a [`StackError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`StackError::Load`] value.
    pub fn load(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Build a [`StackError::Metadata`] value.
    pub fn metadata(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Metadata {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`StackError::Region`] value.
    pub fn region(msg: impl Into<String>) -> Self {
        Self::Region(msg.into())
    }

    /// Build a [`StackError::Composite`] value.
    pub fn composite(msg: impl Into<String>) -> Self {
        Self::Composite(msg.into())
    }

    /// Build a [`StackError::Reassembly`] value.
    pub fn reassembly(msg: impl Into<String>) -> Self {
        Self::Reassembly(msg.into())
    }

    /// Build a [`StackError::Export`] value.
    pub fn export(format: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Export {
            format: format.into(),
            source: source.into(),
        }
    }

    /// Build a [`StackError::Io`] value.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a backend failure for animation frame `index` as an extraction error.
    pub fn frame_extraction(index: usize, source: StackError) -> Self {
        Self::FrameExtraction {
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a backend failure for animation frame `index` as a composite error.
    pub fn frame_composite(index: usize, source: StackError) -> Self {
        Self::FrameComposite {
            index,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
