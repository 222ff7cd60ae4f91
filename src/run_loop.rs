use std::future::Future;
use std::io;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::event_dispatcher::{Deliver, Frame, MessageEncoder};
use crate::shutdown::Shutdown;

/// Anything that produces complete frames: the evdev slot tracker or the
/// callback-driven macOS backend.
pub trait FrameSource {
    type Contact: Serialize;

    /// Waits for the next frame. `Err` is fatal for the source.
    fn next_frame(&mut self) -> impl Future<Output = io::Result<Frame<Self::Contact>>>;
}

/// Why a run ended without an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    #[default]
    Shutdown,
    /// The reading side of the output went away.
    ConsumerClosed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    /// Frames delivered with trailing fingers cut off.
    pub truncated: u64,
    pub stopped: StopReason,
}

/// Everything the run loop owns. Dropping it releases the device.
pub struct RunContext<S, W> {
    pub source: S,
    pub encoder: MessageEncoder,
    pub channel: W,
    pub shutdown: Shutdown,
}

/// Streams frames from `source` to `channel` until shutdown is requested,
/// the consumer goes away, or something fails.
///
/// Shutdown is checked between frames; a frame already read is still
/// delivered. The source is dropped before returning on every path.
pub async fn run<S, W>(ctx: RunContext<S, W>) -> Result<RunSummary, StreamError>
where
    S: FrameSource,
    W: Deliver,
{
    let RunContext {
        mut source,
        encoder,
        mut channel,
        mut shutdown,
    } = ctx;
    let mut summary = RunSummary::default();
    info!("streaming frames");

    let result = loop {
        if shutdown.is_requested() {
            break Ok(StopReason::Shutdown);
        }

        let frame = tokio::select! {
            biased;
            _ = shutdown.requested() => break Ok(StopReason::Shutdown),
            frame = source.next_frame() => frame,
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => break Err(StreamError::Read(e)),
        };

        let encoded = match encoder.encode(&frame) {
            Ok(encoded) => encoded,
            Err(e) => break Err(e.into()),
        };
        if encoded.is_truncated() {
            summary.truncated += 1;
            warn!(
                frame = frame.frame,
                dropped = encoded.dropped,
                limit = ?encoder.limit(),
                "message over size limit, trailing fingers dropped"
            );
        }

        match channel.deliver(&encoded.body) {
            Ok(()) => summary.frames += 1,
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                info!("consumer closed the output");
                break Ok(StopReason::ConsumerClosed);
            }
            Err(e) => break Err(StreamError::Deliver(e)),
        }
    };

    drop(source);
    debug!(frames = summary.frames, ok = result.is_ok(), "run loop stopped");
    result.map(|stopped| RunSummary { stopped, ..summary })
}
