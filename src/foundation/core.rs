use std::collections::BTreeMap;

use crate::foundation::error::{StackError, StackResult};

/// Metadata key holding the height of one frame of a packed multi-page image.
pub const PAGE_HEIGHT: &str = "page-height";
/// Metadata key holding the number of frames of a packed multi-page image.
pub const N_PAGES: &str = "n-pages";
/// Metadata key holding per-frame delays in milliseconds.
pub const DELAY: &str = "delay";
/// Metadata key holding the animation repeat count (`0` repeats forever).
pub const LOOP: &str = "loop";

/// Rule used when painting one image onto another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source-over: the layer is painted on top of the base.
    Over,
    /// Destination-over: the layer is painted behind the base.
    DestOver,
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Build a region from its origin and size.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Row band `[index * height, (index + 1) * height)` spanning the full `width`.
    pub fn page(index: u32, width: u32, height: u32) -> StackResult<Self> {
        let y = index.checked_mul(height).ok_or_else(|| {
            StackError::region(format!("page {index} of height {height} overflows u32"))
        })?;
        Ok(Self::new(0, y, width, height))
    }

    /// Returns `true` if the region lies fully inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        self.width > 0
            && self.height > 0
            && right <= u64::from(width)
            && bottom <= u64::from(height)
    }
}

/// One metadata value attached to an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaValue {
    /// Single integer.
    Int(i64),
    /// Integer list (per-frame values).
    IntArray(Vec<i64>),
    /// Free-form text.
    Text(String),
}

/// Keyed metadata carried alongside image pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, MetaValue>,
}

impl Metadata {
    /// Create an empty metadata set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`.
    pub fn set(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.insert(key.into(), value);
    }

    /// Shorthand for setting an integer value.
    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, MetaValue::Int(value));
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Integer value of `key`; absent or non-integer values are errors.
    pub fn required_int(&self, key: &str) -> StackResult<i64> {
        match self.entries.get(key) {
            Some(MetaValue::Int(v)) => Ok(*v),
            Some(other) => Err(StackError::metadata(
                key,
                format!("expected an integer, found {}", other.kind()),
            )),
            None => Err(StackError::metadata(key, "missing")),
        }
    }

    /// Integer value of `key`, or `default` when absent; non-integer values are errors.
    pub fn int_or(&self, key: &str, default: i64) -> StackResult<i64> {
        match self.entries.get(key) {
            None => Ok(default),
            Some(_) => self.required_int(key),
        }
    }

    /// Integer list stored under `key`, if present and well formed.
    pub fn int_array(&self, key: &str) -> Option<&[i64]> {
        match self.entries.get(key) {
            Some(MetaValue::IntArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl MetaValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::IntArray(_) => "int array",
            Self::Text(_) => "text",
        }
    }
}

/// Shape of the final encoded artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Animated container (an animated input was present).
    Animated,
    /// Native format of the composited static canvas.
    Native,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
