use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::bitmap::Bitmap;
use crate::foundation::core::RecorderId;
use crate::inbox::{InvalidationMessage, KeyInvalidationInbox, attach_invalidation_listener};
use crate::key::{ContentKey, build_bitmap_key};
use crate::proxy::{TextureProxy, TextureUploader};

/// Content-addressed store of texture proxies, owned by one single-threaded
/// recording context.
///
/// Lookup, insertion and eviction are never internally synchronized; callers
/// must not touch one cache from multiple threads. The only cross-thread
/// element is the invalidation inbox, which change listeners post into from
/// wherever the source pixel buffer mutates or dies. Every public operation
/// drains that inbox before doing anything else, so a stale entry survives at
/// most until the next operation.
///
/// The cache holds one shared reference per entry and never forces
/// destruction of a proxy other owners still hold; eviction merely drops the
/// cache's own share.
#[derive(Debug)]
pub struct ProxyCache {
    recorder: RecorderId,
    entries: HashMap<ContentKey, Arc<TextureProxy>>,
    inbox: KeyInvalidationInbox,
}

impl ProxyCache {
    /// Create an empty cache owned by `recorder`'s thread.
    pub fn new(recorder: RecorderId) -> Self {
        Self {
            recorder,
            entries: HashMap::new(),
            inbox: KeyInvalidationInbox::new(recorder),
        }
    }

    /// Owning recorder id.
    pub fn recorder(&self) -> RecorderId {
        self.recorder
    }

    /// Find or create a proxy for `bitmap`, keyed from its content identity
    /// (pixel-buffer generation id plus visible sub-rectangle).
    ///
    /// Returns `None` when the bitmap is empty or the upload fails; nothing
    /// is cached in that case, so a later call retries.
    pub fn find_or_create_cached_proxy(
        &mut self,
        uploader: &mut dyn TextureUploader,
        bitmap: &Bitmap,
        label: &str,
    ) -> Option<Arc<TextureProxy>> {
        let key = build_bitmap_key(bitmap);
        self.find_or_create_cached_proxy_with_key(
            uploader,
            key,
            bitmap,
            |source| Some((*source).clone()),
            label,
        )
    }

    /// Generic find-or-create for callers that already hold a semantically
    /// meaningful key (for example derived from an upstream cache).
    ///
    /// On a miss, `generator(context)` materializes the pixel content; a
    /// `None` or empty result means "nothing to cache" and is never recorded,
    /// so every future call regenerates. On a hit the generator is not
    /// invoked and the entry's access time is bumped. An empty `label` falls
    /// back to the key's debug tag.
    #[tracing::instrument(skip(self, uploader, context, generator))]
    pub fn find_or_create_cached_proxy_with_key<C>(
        &mut self,
        uploader: &mut dyn TextureUploader,
        key: ContentKey,
        context: &C,
        generator: impl FnOnce(&C) -> Option<Bitmap>,
        label: &str,
    ) -> Option<Arc<TextureProxy>> {
        self.process_invalid_key_msgs();

        if let Some(cached) = self.entries.get(&key) {
            if let Some(texture) = cached.texture() {
                texture.update_access_time();
            }
            return Some(Arc::clone(cached));
        }

        let bitmap = generator(context)?;
        if bitmap.is_empty() {
            tracing::debug!(?key, "generator produced an empty bitmap");
            return None;
        }

        let label = if label.is_empty() { key.tag() } else { label };
        let proxy = match uploader.upload(&bitmap, label) {
            Ok(proxy) => proxy,
            Err(err) => {
                tracing::debug!(?key, %err, "upload failed; result not cached");
                return None;
            }
        };

        // An immutable or solely-held source cannot be mutated behind the
        // cache's back at insertion time, so it needs no invalidation
        // tracking. This is the documented contract, not a guarantee that
        // holds if the buffer is aliased out again later.
        if !bitmap.is_immutable() && !bitmap.buffer_uniquely_held() {
            attach_invalidation_listener(&bitmap, key, self.recorder, self.inbox.poster());
        }

        let prev = self.entries.insert(key, Arc::clone(&proxy));
        debug_assert!(prev.is_none(), "insert after miss overwrote a live entry");
        Some(proxy)
    }

    /// Apply every pending invalidation message to the store.
    ///
    /// Invoked at the top of every public operation. A message whose key is
    /// already gone (an eviction pass got there first) is silently ignored;
    /// removal is idempotent.
    pub fn process_invalid_key_msgs(&mut self) {
        let mut msgs: Vec<InvalidationMessage> = Vec::new();
        self.inbox.poll(&mut msgs);
        for msg in msgs {
            if self.entries.remove(&msg.key()).is_some() {
                tracing::trace!(key = ?msg.key(), "removed invalidated entry");
            }
        }
    }

    /// Memory-pressure pass: drop every entry this cache is the sole owner
    /// of. Entries with live external holders survive untouched.
    #[tracing::instrument(skip(self))]
    pub fn free_uniquely_held(&mut self) {
        self.process_invalid_key_msgs();
        let before = self.entries.len();
        self.entries
            .retain(|_, proxy| !TextureProxy::is_uniquely_held(proxy));
        tracing::debug!(freed = before - self.entries.len(), "freed uniquely held proxies");
    }

    /// Staleness pass: drop every materialized entry whose last access is
    /// older than `purge_time`; with `None`, drop every materialized entry.
    /// Entries still awaiting materialization carry no age signal and are
    /// left alone.
    #[tracing::instrument(skip(self))]
    pub fn purge_proxies_not_used_since(&mut self, purge_time: Option<Instant>) {
        self.process_invalid_key_msgs();
        self.entries.retain(|_, proxy| match proxy.texture() {
            Some(texture) => match purge_time {
                Some(t) => texture.last_access_time() >= t,
                None => false,
            },
            None => true,
        });
    }

    /// Drop every entry unconditionally, releasing the cache's references.
    /// Used on catastrophic invalidation such as loss of the GPU context.
    /// Handles held elsewhere stay valid.
    pub fn purge_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ProxyCache {
    /// Number of live entries.
    pub fn num_cached(&self) -> usize {
        self.entries.len()
    }

    /// Lookup without generation, keyed from `bitmap`.
    pub fn find(&self, bitmap: &Bitmap) -> Option<Arc<TextureProxy>> {
        self.entries.get(&build_bitmap_key(bitmap)).cloned()
    }

    /// Deterministic test hook for the inbox drain.
    pub fn force_process_invalid_key_msgs(&mut self) {
        self.process_invalid_key_msgs();
    }

    /// Deterministic test hook for the exclusive-ownership pass.
    pub fn force_free_uniquely_held(&mut self) {
        self.free_uniquely_held();
    }

    /// Deterministic test hook for the staleness pass.
    pub fn force_purge_proxies_not_used_since(&mut self, purge_time: Instant) {
        self.purge_proxies_not_used_since(Some(purge_time));
    }
}

#[cfg(test)]
#[path = "../tests/unit/cache.rs"]
mod tests;
