use std::sync::mpsc;

use crate::bitmap::{Bitmap, ListenerToken};
use crate::foundation::core::RecorderId;
use crate::key::ContentKey;

/// One invalidation event: which key to drop, and which recorder's cache the
/// message targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidationMessage {
    key: ContentKey,
    recorder: RecorderId,
}

impl InvalidationMessage {
    /// Build a message targeting `recorder`'s cache.
    pub fn new(key: ContentKey, recorder: RecorderId) -> Self {
        Self { key, recorder }
    }

    /// Key to invalidate.
    pub fn key(&self) -> ContentKey {
        self.key
    }

    /// Targeted recorder.
    pub fn recorder(&self) -> RecorderId {
        self.recorder
    }
}

/// Cheap clonable capability for posting invalidation messages from any
/// thread.
#[derive(Clone, Debug)]
pub struct InvalidationPoster {
    tx: mpsc::Sender<InvalidationMessage>,
}

impl InvalidationPoster {
    /// Post one message. Never blocks. A disconnected consumer (the cache was
    /// already dropped) is not an error; the message has no one left to serve.
    pub fn post(&self, msg: InvalidationMessage) {
        let _ = self.tx.send(msg);
    }
}

/// Single-consumer inbox draining invalidation traffic for one recorder's
/// cache.
///
/// Producers are [`InvalidationPoster`] clones held by change listeners on
/// arbitrary threads; the sole consumer is the owning cache, polling from its
/// recorder thread. Delivery is at-most-once per posted message and lossless
/// under concurrent posting (mpsc channel guarantees). Messages carrying a
/// foreign recorder id are dropped at poll time, so a poster shared across
/// cache instances never leaks traffic into the wrong store.
#[derive(Debug)]
pub struct KeyInvalidationInbox {
    owner: RecorderId,
    tx: mpsc::Sender<InvalidationMessage>,
    rx: mpsc::Receiver<InvalidationMessage>,
}

impl KeyInvalidationInbox {
    /// Create an inbox owned by `owner`'s recorder thread.
    pub fn new(owner: RecorderId) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { owner, tx, rx }
    }

    /// Owning recorder.
    pub fn owner(&self) -> RecorderId {
        self.owner
    }

    /// New posting capability for producers on other threads.
    pub fn poster(&self) -> InvalidationPoster {
        InvalidationPoster {
            tx: self.tx.clone(),
        }
    }

    /// Drain everything currently queued into `out`, keeping only messages
    /// addressed to this inbox's owner. Never blocks; per-producer posting
    /// order is preserved.
    pub fn poll(&self, out: &mut Vec<InvalidationMessage>) {
        for msg in self.rx.try_iter() {
            if msg.recorder() == self.owner {
                out.push(msg);
            }
        }
    }
}

/// Install a one-shot listener on `bitmap`'s pixel buffer that posts exactly
/// one invalidation for `key` when the buffer mutates or is destroyed, then
/// detaches. Returns the detach token in case the caller wants to cancel the
/// subscription early.
pub fn attach_invalidation_listener(
    bitmap: &Bitmap,
    key: ContentKey,
    recorder: RecorderId,
    poster: InvalidationPoster,
) -> ListenerToken {
    let msg = InvalidationMessage::new(key, recorder);
    bitmap
        .pixel_buffer()
        .add_change_listener(move || poster.post(msg))
}

#[cfg(test)]
#[path = "../tests/unit/inbox.rs"]
mod tests;
