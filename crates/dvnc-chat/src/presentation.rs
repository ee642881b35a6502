//! Presentation seam between a conversation session and whatever renders it.

use std::sync::Mutex;

use dvnc_core::events::SessionEvent;
use tokio::sync::broadcast;

/// Receives session events in emission order.
///
/// Called synchronously while the session holds its state lock, so the event
/// stream always agrees with transcript order. Implementations must not call
/// back into the session and must not block; anything slow (animation, I/O)
/// belongs on the other side of a channel.
pub trait PresentationDriver: Send + Sync {
    fn handle(&self, event: &SessionEvent);
}

/// Forwards events to a broadcast channel for a render task to consume.
#[derive(Debug, Clone)]
pub struct ChannelDriver {
    tx: broadcast::Sender<SessionEvent>,
}

impl ChannelDriver {
    /// Create a driver and the first receiver.
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<SessionEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl PresentationDriver for ChannelDriver {
    fn handle(&self, event: &SessionEvent) {
        // No receivers just means nothing is rendering right now.
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(event = event.event_type(), "No presentation subscribers");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Event type names, convenient for asserting on ordering.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(SessionEvent::event_type).collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl PresentationDriver for RecordingDriver {
    fn handle(&self, event: &SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Successive prefixes of `text`, growing by `chunk_chars` characters each,
/// ending with the full text. Slices on char boundaries, so multi-byte text
/// is safe. An empty text yields no frames; a `chunk_chars` of 0 is treated
/// as 1.
pub fn reveal_frames(text: &str, chunk_chars: usize) -> impl Iterator<Item = &str> {
    let chunk = chunk_chars.max(1);
    let mut ends: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .skip(chunk)
        .step_by(chunk)
        .collect();
    if !text.is_empty() {
        ends.push(text.len());
    }
    ends.into_iter().map(move |end| &text[..end])
}
