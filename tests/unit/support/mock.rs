//! Recording [`ImageBackend`] for pipeline tests.
//!
//! Images carry a label instead of pixels. Layering appends to the label history, extraction
//! renames the label after the page it cut, and joins remember the parts in order.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    backend::{ImageBackend, Layer},
    foundation::{
        core::{Metadata, N_PAGES, PAGE_HEIGHT, Region},
        error::{StackError, StackResult},
    },
};

#[derive(Debug)]
pub struct MockImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub meta: Metadata,
    pub layers: Vec<String>,
    pub parts: Vec<String>,
    live: Arc<AtomicUsize>,
}

impl MockImage {
    fn new(
        label: String,
        width: u32,
        height: u32,
        meta: Metadata,
        live: &Arc<AtomicUsize>,
    ) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            label,
            width,
            height,
            meta,
            layers: Vec::new(),
            parts: Vec::new(),
            live: Arc::clone(live),
        }
    }

    pub fn describe(&self) -> String {
        if self.layers.is_empty() {
            self.label.clone()
        } else {
            format!("{}<{}>", self.label, self.layers.join(","))
        }
    }
}

impl Drop for MockImage {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
struct MockFixture {
    width: u32,
    height: u32,
    meta: Metadata,
}

#[derive(Debug, Default)]
pub struct MockBackend {
    fixtures: BTreeMap<PathBuf, MockFixture>,
    ops: Mutex<Vec<String>>,
    live: Arc<AtomicUsize>,
    pub fail_extract_page: Option<u32>,
    pub fail_layer_for: Option<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_still(self, path: &str, width: u32, height: u32) -> Self {
        self.with_image(path, width, height, Metadata::new())
    }

    pub fn with_anim(self, path: &str, width: u32, page_height: u32, pages: u32) -> Self {
        let mut meta = Metadata::new();
        meta.set_int(PAGE_HEIGHT, i64::from(page_height));
        meta.set_int(N_PAGES, i64::from(pages));
        self.with_image(path, width, page_height * pages.max(1), meta)
    }

    pub fn with_image(mut self, path: &str, width: u32, height: u32, meta: Metadata) -> Self {
        self.fixtures.insert(
            PathBuf::from(path),
            MockFixture {
                width,
                height,
                meta,
            },
        );
        self
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

impl ImageBackend for MockBackend {
    type Handle = MockImage;

    fn open(&self, path: &Path) -> StackResult<MockImage> {
        self.record(format!("open:{}", path.display()));
        let fixture = self.fixtures.get(path).ok_or_else(|| {
            StackError::load(path, anyhow::anyhow!("no such mock image"))
        })?;
        Ok(MockImage::new(
            path.display().to_string(),
            fixture.width,
            fixture.height,
            fixture.meta.clone(),
            &self.live,
        ))
    }

    fn duplicate(&self, handle: &MockImage) -> StackResult<MockImage> {
        self.record(format!("duplicate:{}", handle.label));
        let mut copy = MockImage::new(
            handle.label.clone(),
            handle.width,
            handle.height,
            handle.meta.clone(),
            &self.live,
        );
        copy.layers = handle.layers.clone();
        copy.parts = handle.parts.clone();
        Ok(copy)
    }

    fn layer_many(&self, base: &mut MockImage, layers: &[Layer<'_, MockImage>]) -> StackResult<()> {
        self.record(format!("layer_many:{}:{}", base.label, layers.len()));
        if self.fail_layer_for.as_deref() == Some(base.label.as_str()) {
            return Err(StackError::composite(format!("injected failure on {}", base.label)));
        }
        for layer in layers {
            base.layers
                .push(format!("{:?}:{}", layer.blend, layer.image.describe()));
        }
        Ok(())
    }

    fn extract_region(&self, handle: &mut MockImage, region: Region) -> StackResult<()> {
        let page = region.y / region.height.max(1);
        self.record(format!("extract:{}:{page}", handle.label));
        if self.fail_extract_page == Some(page) {
            return Err(StackError::region(format!("injected failure on page {page}")));
        }
        if !region.fits_within(handle.width, handle.height) {
            return Err(StackError::region("out of bounds"));
        }
        handle.label = format!("{}#page{page}", handle.label);
        handle.width = region.width;
        handle.height = region.height;
        Ok(())
    }

    fn required_int_meta(&self, handle: &MockImage, key: &str) -> StackResult<i64> {
        handle.meta.required_int(key)
    }

    fn optional_int_meta(&self, handle: &MockImage, key: &str, default: i64) -> StackResult<i64> {
        handle.meta.int_or(key, default)
    }

    fn width(&self, handle: &MockImage) -> u32 {
        handle.width
    }

    fn height(&self, handle: &MockImage) -> u32 {
        handle.height
    }

    fn format_name(&self, _handle: &MockImage) -> String {
        "mock".to_string()
    }

    fn join_vertically(&self, frames: Vec<MockImage>) -> StackResult<MockImage> {
        self.record(format!("join:{}", frames.len()));
        let Some(first) = frames.first() else {
            return Err(StackError::reassembly("empty"));
        };
        let mut meta = first.meta.clone();
        meta.set_int(PAGE_HEIGHT, i64::from(first.height));
        meta.set_int(N_PAGES, frames.len() as i64);

        let mut joined = MockImage::new(
            "joined".to_string(),
            first.width,
            first.height * frames.len() as u32,
            meta,
            &self.live,
        );
        joined.parts = frames.iter().map(MockImage::describe).collect();
        Ok(joined)
    }

    fn export_animated(&self, handle: &MockImage) -> StackResult<Vec<u8>> {
        self.record("export_animated".to_string());
        Ok(format!("animated|{}", handle.parts.join("|")).into_bytes())
    }

    fn export_native(&self, handle: &MockImage) -> StackResult<Vec<u8>> {
        self.record("export_native".to_string());
        Ok(format!("native|{}", handle.describe()).into_bytes())
    }
}
