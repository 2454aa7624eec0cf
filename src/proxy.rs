use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::bitmap::Bitmap;
use crate::foundation::error::{CacheError, CacheResult};

/// Process-wide epoch against which access timestamps are measured.
fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

fn micros_since_epoch(t: Instant) -> u64 {
    t.saturating_duration_since(epoch()).as_micros() as u64
}

/// Materialized GPU-side resource stand-in: a label, dimensions, the uploaded
/// bytes, and a last-access timestamp bumped on every cache hit.
#[derive(Debug)]
pub struct Texture {
    label: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    last_access_micros: AtomicU64,
}

impl Texture {
    /// Create a texture with the access time set to now.
    pub fn new(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            pixels,
            last_access_micros: AtomicU64::new(micros_since_epoch(Instant::now())),
        }
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Uploaded RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Record an access at `Instant::now()`.
    pub fn update_access_time(&self) {
        self.last_access_micros
            .store(micros_since_epoch(Instant::now()), Ordering::Release);
    }

    /// Most recent access time.
    pub fn last_access_time(&self) -> Instant {
        epoch() + Duration::from_micros(self.last_access_micros.load(Ordering::Acquire))
    }
}

/// Lazily materialized, shareable handle to a GPU texture.
///
/// Shared ownership is `Arc<TextureProxy>`; the backing [`Texture`] is absent
/// until [`Self::instantiate`] runs (or forever, if the resource was
/// reclaimed upstream before materialization).
#[derive(Debug)]
pub struct TextureProxy {
    label: String,
    width: u32,
    height: u32,
    texture: OnceLock<Texture>,
}

impl TextureProxy {
    /// Create an unmaterialized proxy.
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            width,
            height,
            texture: OnceLock::new(),
        })
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The backing resource, if materialization has happened.
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.get()
    }

    /// Fill in the backing resource. Materializing twice is an error.
    pub fn instantiate(&self, texture: Texture) -> CacheResult<()> {
        self.texture
            .set(texture)
            .map_err(|_| CacheError::upload(format!("proxy '{}' already materialized", self.label)))
    }

    /// Whether `handle` is the only live reference to this proxy. Accurate
    /// only while every handle stays on the owning recorder thread.
    pub fn is_uniquely_held(handle: &Arc<Self>) -> bool {
        Arc::strong_count(handle) == 1
    }
}

/// Upload seam: turns bitmap content into a GPU-resident proxy.
///
/// Upload mechanics (command encoding, color conversion, memory budgeting)
/// live behind this trait; the cache only consumes the returned handle.
pub trait TextureUploader {
    /// Upload the visible subset of `bitmap`, returning a proxy for it.
    fn upload(&mut self, bitmap: &Bitmap, label: &str) -> CacheResult<Arc<TextureProxy>>;
}

/// CPU-side uploader that materializes proxies immediately from the bitmap
/// bytes. The software fallback, and the uploader the test suite runs on.
#[derive(Debug, Default)]
pub struct SoftwareUploader {
    uploads: usize,
}

impl SoftwareUploader {
    /// Create an uploader with a zeroed upload counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful uploads performed.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }
}

impl TextureUploader for SoftwareUploader {
    fn upload(&mut self, bitmap: &Bitmap, label: &str) -> CacheResult<Arc<TextureProxy>> {
        if bitmap.is_empty() {
            return Err(CacheError::upload("cannot upload an empty bitmap"));
        }
        // Snapshot the subset under the buffer lock so a concurrent mutation
        // cannot tear the uploaded bytes.
        let pixels = bitmap.to_rgba8_rows();
        let proxy = TextureProxy::new(label, bitmap.width(), bitmap.height());
        proxy.instantiate(Texture::new(label, bitmap.width(), bitmap.height(), pixels))?;
        self.uploads += 1;
        Ok(proxy)
    }
}

#[cfg(test)]
#[path = "../tests/unit/proxy.rs"]
mod tests;
