use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::foundation::core::IRect;
use crate::foundation::error::{CacheError, CacheResult};

/// Bytes per RGBA8 pixel.
const BYTES_PER_PIXEL: usize = 4;

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Allocate a process-unique nonzero content-generation id.
fn next_generation_id() -> u32 {
    loop {
        let id = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

/// Detach token returned by [`PixelBuffer::add_change_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerToken(u64);

struct ListenerSlot {
    token: u64,
    callback: Box<dyn FnOnce() + Send>,
}

/// Shared RGBA8 pixel storage with a content-generation counter and one-shot
/// change listeners.
///
/// The generation id is replaced with a fresh process-unique value on every
/// content mutation, so `(generation, visible subset)` identifies pixel
/// content. Registered listeners fire exactly once, on the first mutation
/// after registration or on buffer destruction, and are then discarded.
/// Firing may happen on whatever thread mutates or drops the buffer.
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Mutex<Vec<u8>>,
    generation: AtomicU32,
    immutable: AtomicBool,
    listeners: Mutex<Vec<ListenerSlot>>,
    next_token: AtomicU64,
}

impl PixelBuffer {
    /// Create a buffer from RGBA8 bytes. `pixels.len()` must equal
    /// `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> CacheResult<Arc<Self>> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(CacheError::validation(format!(
                "pixel byte length {} does not match {width}x{height} RGBA8 ({expected})",
                pixels.len()
            )));
        }
        Ok(Arc::new(Self {
            width,
            height,
            pixels: Mutex::new(pixels),
            generation: AtomicU32::new(next_generation_id()),
            immutable: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }))
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current content-generation id. Never zero.
    pub fn generation_id(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether the content is frozen. Immutability is one-way.
    pub fn is_immutable(&self) -> bool {
        self.immutable.load(Ordering::Acquire)
    }

    /// Freeze the content. Mutation attempts after this point are caller
    /// bugs and panic.
    pub fn set_immutable(&self) {
        self.immutable.store(true, Ordering::Release);
    }

    /// Run `f` over the current pixel bytes.
    pub fn with_pixels<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.pixels.lock())
    }

    /// Mutate the pixel bytes in place, then advance the generation and fire
    /// pending listeners.
    pub fn write_pixels(&self, f: impl FnOnce(&mut [u8])) {
        assert!(
            !self.is_immutable(),
            "write_pixels on an immutable PixelBuffer"
        );
        f(&mut self.pixels.lock());
        self.notify_pixels_changed();
    }

    /// Advance the generation id and fire (then drop) all registered
    /// listeners. Called automatically by [`Self::write_pixels`]; exposed for
    /// callers that mutate through an aliasing view of the same bytes.
    pub fn notify_pixels_changed(&self) {
        assert!(
            !self.is_immutable(),
            "notify_pixels_changed on an immutable PixelBuffer"
        );
        self.generation.store(next_generation_id(), Ordering::Release);
        self.fire_listeners();
    }

    /// Register a one-shot callback invoked on the next content mutation or
    /// on buffer destruction, whichever comes first. Returns a token that can
    /// detach the callback before it fires.
    pub fn add_change_listener(&self, callback: impl FnOnce() + Send + 'static) -> ListenerToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push(ListenerSlot {
            token,
            callback: Box::new(callback),
        });
        ListenerToken(token)
    }

    /// Detach a listener before it fires. Returns whether it was still
    /// registered.
    pub fn remove_change_listener(&self, token: ListenerToken) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|slot| slot.token != token.0);
        listeners.len() != before
    }

    fn fire_listeners(&self) {
        // Take the whole list before invoking anything so a callback that
        // re-registers cannot observe itself mid-fire.
        let fired = std::mem::take(&mut *self.listeners.lock());
        for slot in fired {
            (slot.callback)();
        }
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        // Destruction without a prior mutation still fires pending listeners.
        let fired = std::mem::take(self.listeners.get_mut());
        for slot in fired {
            (slot.callback)();
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("generation", &self.generation_id())
            .field("immutable", &self.is_immutable())
            .finish()
    }
}

/// A lightweight view of a shared [`PixelBuffer`]: an origin plus visible
/// dimensions inside the (possibly larger) buffer.
///
/// Distinct `Bitmap` values aliasing the same buffer and subset are
/// cache-equivalent by construction; see [`crate::build_bitmap_key`].
#[derive(Clone, Debug)]
pub struct Bitmap {
    buffer: Arc<PixelBuffer>,
    origin_x: u32,
    origin_y: u32,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// View covering the whole buffer.
    pub fn new(buffer: Arc<PixelBuffer>) -> Self {
        let (width, height) = (buffer.width(), buffer.height());
        Self {
            buffer,
            origin_x: 0,
            origin_y: 0,
            width,
            height,
        }
    }

    /// Aliasing view restricted to `rect`, given in this view's coordinates.
    pub fn subset(&self, rect: IRect) -> CacheResult<Self> {
        let bounds = IRect::from_pt_size(0, 0, self.width, self.height);
        if !bounds.contains(rect) {
            return Err(CacheError::validation(format!(
                "subset {rect:?} out of bounds for {}x{} bitmap",
                self.width, self.height
            )));
        }
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            origin_x: self.origin_x + rect.left as u32,
            origin_y: self.origin_y + rect.top as u32,
            width: rect.width(),
            height: rect.height(),
        })
    }

    /// Shared backing buffer.
    pub fn pixel_buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }

    /// Visible width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Visible height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the view covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Visible sub-rectangle in buffer coordinates.
    pub fn subset_rect(&self) -> IRect {
        IRect::from_pt_size(
            self.origin_x as i32,
            self.origin_y as i32,
            self.width,
            self.height,
        )
    }

    /// Whether the backing content is frozen.
    pub fn is_immutable(&self) -> bool {
        self.buffer.is_immutable()
    }

    /// Whether this view holds the only live handle to the backing buffer,
    /// meaning nothing else could mutate it. Accurate only while all handles
    /// stay on the calling thread.
    pub fn buffer_uniquely_held(&self) -> bool {
        Arc::strong_count(&self.buffer) == 1
    }

    /// Copy the visible sub-rectangle out as tightly packed RGBA8 rows.
    pub fn to_rgba8_rows(&self) -> Vec<u8> {
        let row_len = self.width as usize * BYTES_PER_PIXEL;
        let stride = self.buffer.width() as usize * BYTES_PER_PIXEL;
        self.buffer.with_pixels(|pixels| {
            let mut out = Vec::with_capacity(row_len * self.height as usize);
            for row in 0..self.height as usize {
                let y = self.origin_y as usize + row;
                let start = y * stride + self.origin_x as usize * BYTES_PER_PIXEL;
                out.extend_from_slice(&pixels[start..start + row_len]);
            }
            out
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/bitmap.rs"]
mod tests;
