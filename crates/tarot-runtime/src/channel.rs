//! Live push channel state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tarot_core::PushFrame;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Sender half of a live channel, as seen by the relay.
///
/// The receiving half belongs to the stream task that writes frames to the
/// browser. Frames are pre-serialized JSON so one serialization serves every
/// write.
pub struct LiveChannel {
    /// Unique channel ID.
    pub id: String,
    /// Queue to the stream task.
    tx: mpsc::Sender<Arc<String>>,
    /// Fired when the registry supersedes or drops this channel.
    close: CancellationToken,
    /// When this channel was opened.
    pub connected_at: Instant,
    /// Frames accepted into the queue.
    delivered_frames: AtomicU64,
    /// Frames rejected because the queue was full or closed.
    dropped_frames: AtomicU64,
}

impl LiveChannel {
    /// Create a channel around an existing sender.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            close: CancellationToken::new(),
            connected_at: Instant::now(),
            delivered_frames: AtomicU64::new(0),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Create a channel with a fresh id and a bounded queue of `buffer` frames.
    pub fn open(buffer: usize) -> (Self, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let id = format!("chan_{}", uuid::Uuid::now_v7());
        (Self::new(id, tx), rx)
    }

    /// Queue a serialized frame without waiting.
    ///
    /// Returns `false` if the queue is full or the receiver is gone, and
    /// increments the dropped frame counter.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.is_closed() {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        if self.tx.try_send(frame).is_ok() {
            let _ = self.delivered_frames.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize a push frame and queue it.
    pub fn send_frame(&self, frame: &PushFrame) -> bool {
        match serde_json::to_string(frame) {
            Ok(json) => self.send(Arc::new(json)),
            Err(_) => false,
        }
    }

    /// Signal the stream task to end.
    pub fn close(&self) {
        self.close.cancel();
    }

    /// Whether the channel was closed or its receiver dropped.
    pub fn is_closed(&self) -> bool {
        self.close.is_cancelled() || self.tx.is_closed()
    }

    /// Token the stream task watches to learn it was closed.
    pub fn close_token(&self) -> CancellationToken {
        self.close.clone()
    }

    /// Frames accepted so far.
    pub fn delivered_count(&self) -> u64 {
        self.delivered_frames.load(Ordering::Relaxed)
    }

    /// Frames dropped so far.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Channel age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChannel")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("delivered", &self.delivered_count())
            .field("dropped", &self.drop_count())
            .finish_non_exhaustive()
    }
}
