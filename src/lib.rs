//! Texproxy is a content-addressed cache of GPU texture proxies.
//!
//! The cache memoizes the upload of a CPU-side pixel buffer (a [`Bitmap`])
//! into a GPU-resident handle (a [`TextureProxy`]), keyed deterministically
//! from the bitmap's content identity, so repeated draws of the same content
//! reuse one upload instead of re-encoding pixels every frame.
//!
//! # Pipeline overview
//!
//! 1. **Key**: `Bitmap -> ContentKey` (generation id + visible sub-rectangle)
//! 2. **Lookup**: drain pending invalidations, then probe the store
//! 3. **Generate + upload** (miss only): caller-supplied generator produces
//!    pixel content, the [`TextureUploader`] seam materializes a proxy
//! 4. **Track**: a one-shot listener on the source pixel buffer posts an
//!    invalidation when the content mutates or the buffer is destroyed
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded store**: a [`ProxyCache`] is owned by one recording
//!   context and is never locked internally.
//! - **Cross-thread invalidation only through the inbox**: listeners fire on
//!   arbitrary threads and post into an mpsc channel the owning thread drains
//!   at the top of every cache operation.
//! - **Absence is the error signal**: failed generation or upload returns
//!   `None` and caches nothing, so every later call retries.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bitmap;
mod cache;
mod foundation;
mod inbox;
mod key;
mod proxy;

pub use bitmap::{Bitmap, ListenerToken, PixelBuffer};
pub use cache::ProxyCache;
pub use foundation::core::{IRect, RecorderId};
pub use foundation::error::{CacheError, CacheResult};
pub use inbox::{
    InvalidationMessage, InvalidationPoster, KeyInvalidationInbox, attach_invalidation_listener,
};
pub use key::{ContentKey, Domain, KEY_DATA_LEN, build_bitmap_key};
pub use proxy::{SoftwareUploader, Texture, TextureProxy, TextureUploader};
