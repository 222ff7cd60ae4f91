//! Bounded hand-off from a callback thread to the run loop.
//!
//! The producer never blocks. When the consumer falls behind, new frames are
//! dropped and counted instead of piling up.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::event_dispatcher::Frame;

/// Frames allowed to wait for the run loop.
pub const FRAME_QUEUE_CAPACITY: usize = 64;

pub fn frame_queue<C>(capacity: usize) -> (FrameProducer<C>, FrameConsumer<C>) {
    let (tx, rx) = mpsc::channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FrameProducer {
            tx,
            dropped: dropped.clone(),
        },
        FrameConsumer { rx, dropped },
    )
}

pub struct FrameProducer<C> {
    tx: mpsc::Sender<Frame<C>>,
    dropped: Arc<AtomicU64>,
}

impl<C> FrameProducer<C> {
    /// Returns `false` if the frame was dropped, either because the queue is
    /// full or because the consumer is gone.
    pub fn push(&self, frame: Frame<C>) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                // 只在 1, 2, 4, 8... 时打日志，免得刷屏
                if dropped.is_power_of_two() {
                    warn!(
                        dropped,
                        frame = frame.frame,
                        "frame queue full, dropping frames"
                    );
                }
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

pub struct FrameConsumer<C> {
    rx: mpsc::Receiver<Frame<C>>,
    dropped: Arc<AtomicU64>,
}

impl<C> FrameConsumer<C> {
    /// `None` once every producer is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Frame<C>> {
        self.rx.recv().await
    }

    /// Frames lost to a full queue so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
