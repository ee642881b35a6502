use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Events a conversation session emits towards the presentation layer.
///
/// The session never renders anything itself. A driver consumes these in
/// emission order and is responsible for:
/// - hiding and re-showing the welcome screen
/// - the typing indicator between `ThinkingStarted` and `ThinkingEnded`
/// - revealing appended bot messages (e.g. a few characters per frame)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The first message of a conversation arrived; hide the welcome UI.
    WelcomeHidden,

    /// A submit is waiting on its reply; show the typing indicator.
    ThinkingStarted,

    /// A submit finished waiting. Emitted exactly once per `ThinkingStarted`,
    /// including when the reply was discarded by a reset.
    ThinkingEnded,

    /// A message was appended to the transcript.
    MessageAppended { message: Message },

    /// The session was reset; clear rendered messages and show the welcome UI.
    TranscriptCleared,
}

impl SessionEvent {
    /// Returns the event name used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::WelcomeHidden => "welcome_hidden",
            SessionEvent::ThinkingStarted => "thinking_started",
            SessionEvent::ThinkingEnded => "thinking_ended",
            SessionEvent::MessageAppended { .. } => "message_appended",
            SessionEvent::TranscriptCleared => "transcript_cleared",
        }
    }

    /// The appended message, if this is a `MessageAppended` event.
    pub fn message(&self) -> Option<&Message> {
        match self {
            SessionEvent::MessageAppended { message } => Some(message),
            _ => None,
        }
    }
}
