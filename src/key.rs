use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::bitmap::Bitmap;

static NEXT_DOMAIN: AtomicU32 = AtomicU32::new(1);

/// Domain tag separating one cache family's keys from unrelated caches that
/// share the same key space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Domain(u32);

impl Domain {
    /// Allocate a fresh process-unique domain.
    pub fn generate() -> Self {
        Self(NEXT_DOMAIN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Number of payload words in a [`ContentKey`].
pub const KEY_DATA_LEN: usize = 5;

/// Opaque fixed-size content key: a domain tag plus an ordered payload of
/// integers (generation id and visible subset edges for bitmap keys).
///
/// The debug `tag` is carried for labeling only and is excluded from
/// equality and hashing.
#[derive(Clone, Copy, Debug)]
pub struct ContentKey {
    domain: Domain,
    data: [u32; KEY_DATA_LEN],
    tag: &'static str,
}

impl ContentKey {
    /// Build a key from raw payload words.
    pub fn new(domain: Domain, data: [u32; KEY_DATA_LEN], tag: &'static str) -> Self {
        Self { domain, data, tag }
    }

    /// Domain this key belongs to.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Raw payload words.
    pub fn data(&self) -> &[u32; KEY_DATA_LEN] {
        &self.data
    }

    /// Debug tag, used as an upload label fallback.
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.data == other.data
    }
}

impl Eq for ContentKey {}

impl Hash for ContentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.domain.hash(state);
        self.data.hash(state);
    }
}

/// Domain shared by every proxy cache in the process, generated lazily so
/// unrelated key users can never collide with it.
fn proxy_cache_domain() -> Domain {
    static DOMAIN: OnceLock<Domain> = OnceLock::new();
    *DOMAIN.get_or_init(Domain::generate)
}

/// Derive the cache key for `bitmap`: its pixel-buffer generation id plus the
/// four edges of the visible sub-rectangle.
///
/// Pure and deterministic: distinct `Bitmap` values aliasing the same buffer
/// and subset yield equal keys, which is the basis for cache sharing.
pub fn build_bitmap_key(bitmap: &Bitmap) -> ContentKey {
    let subset = bitmap.subset_rect();
    ContentKey::new(
        proxy_cache_domain(),
        [
            bitmap.pixel_buffer().generation_id(),
            subset.left as u32,
            subset.top as u32,
            subset.right as u32,
            subset.bottom as u32,
        ],
        "ProxyCache",
    )
}

#[cfg(test)]
#[path = "../tests/unit/key.rs"]
mod tests;
