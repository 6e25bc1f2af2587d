// Throttled progress reporting. Grounded on the teacher's token-bucket
// rate limiter (toxicity/rate_limiter.rs), repurposed from gating outbound
// API calls to gating outbound progress events: suppress events arriving
// less than 120ms after the previous one, except forced events (stage
// start, stage completion, current == total).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use std::sync::Arc;

const THROTTLE: Duration = Duration::from_millis(120);

/// A single progress observation, as described in spec §4.5 / §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: String,
    pub current: Option<u64>,
    pub total: Option<u64>,
}

/// Sender half of the engine's progress channel. Cheap to clone; all
/// clones share the same rate-limiter state and the same underlying
/// channel.
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<ProgressEvent>,
    last_sent: Arc<Mutex<Option<Instant>>>,
}

impl ProgressSender {
    /// Construct a bounded channel pair for progress events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, last_sent: Arc::new(Mutex::new(None)) }, rx)
    }

    /// Emit a stage-progress update, subject to the 120ms throttle.
    pub async fn emit(&self, stage: &str, current: Option<u64>, total: Option<u64>) {
        let forced = current.is_some() && current == total;
        if forced {
            self.emit_forced(stage, current, total).await;
            return;
        }

        let mut last_sent = self.last_sent.lock().await;
        let now = Instant::now();
        if let Some(last) = *last_sent {
            if now.duration_since(last) < THROTTLE {
                return;
            }
        }
        *last_sent = Some(now);
        drop(last_sent);

        let _ = self.tx.send(ProgressEvent { stage: stage.to_string(), current, total }).await;
    }

    /// Emit an event bypassing the throttle — stage boundaries, stage
    /// completion, and `current == total`.
    pub async fn emit_forced(&self, stage: &str, current: Option<u64>, total: Option<u64>) {
        *self.last_sent.lock().await = Some(Instant::now());
        let _ = self.tx.send(ProgressEvent { stage: stage.to_string(), current, total }).await;
    }

    /// Convenience: emit a forced `stage start` event (`current = 0`, no total).
    pub async fn stage_start(&self, stage: &str) {
        self.emit_forced(stage, None, None).await;
    }

    /// Convenience: emit a forced stage-completion event (`current == total`).
    pub async fn stage_done(&self, stage: &str, total: u64) {
        self.emit_forced(stage, Some(total), Some(total)).await;
    }
}
