//! Conversation session: the welcome/active state machine and the transcript.
//!
//! - `welcome` is the initial phase; the first accepted message moves the
//!   session to `active`.
//! - `reset` clears the transcript and returns to `welcome`.
//!
//! Every reset starts a new generation. A submit remembers the generation it
//! started in, and its reply is discarded if a reset happened meanwhile.
//! Submits are not serialized against each other: user messages are recorded
//! immediately, bot replies land whenever their resolution finishes.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dvnc_core::config::{QuickAction, SessionConfig};
use dvnc_core::events::SessionEvent;
use dvnc_core::types::{Message, Phase, Sender};

use crate::error::ChatError;
use crate::presentation::PresentationDriver;
use crate::resolver::ResponseResolver;

/// What happened to the reply of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The bot reply was appended to the transcript.
    Replied(Message),
    /// The session was reset while the reply was pending; nothing was appended.
    Discarded,
}

impl SubmitOutcome {
    pub fn reply(&self) -> Option<&Message> {
        match self {
            SubmitOutcome::Replied(message) => Some(message),
            SubmitOutcome::Discarded => None,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    phase: Phase,
    transcript: Vec<Message>,
    generation: u64,
}

/// One conversation with the widget.
pub struct ConversationSession {
    resolver: Arc<ResponseResolver>,
    driver: Arc<dyn PresentationDriver>,
    state: Mutex<SessionState>,
    think_delay: Duration,
}

impl ConversationSession {
    /// Create a session in the welcome phase with the default think delay.
    pub fn new(resolver: Arc<ResponseResolver>, driver: Arc<dyn PresentationDriver>) -> Self {
        Self {
            resolver,
            driver,
            state: Mutex::new(SessionState::default()),
            think_delay: SessionConfig::default().think_delay(),
        }
    }

    pub fn with_think_delay(mut self, think_delay: Duration) -> Self {
        self.think_delay = think_delay;
        self
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// Snapshot of the transcript, oldest first.
    pub fn transcript(&self) -> Vec<Message> {
        self.lock_state().transcript.clone()
    }

    /// Number of resets so far.
    pub fn generation(&self) -> u64 {
        self.lock_state().generation
    }

    pub fn resolver(&self) -> &ResponseResolver {
        &self.resolver
    }

    /// Record `text` as a user message and append the resolved bot reply.
    ///
    /// Fails with [`ChatError::EmptyInput`] when `text` is blank, leaving the
    /// session untouched. Otherwise the reply is always produced; it is only
    /// dropped if the session is reset before it arrives.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let generation = {
            let mut state = self.lock_state();
            self.record(&mut state, Message::user(text));
            self.driver.handle(&SessionEvent::ThinkingStarted);
            state.generation
        };
        tracing::debug!(generation, chars = text.chars().count(), "Message submitted");

        if !self.think_delay.is_zero() {
            tokio::time::sleep(self.think_delay).await;
        }
        let reply = self.resolver.resolve(text).await;

        let mut state = self.lock_state();
        if state.generation != generation {
            self.driver.handle(&SessionEvent::ThinkingEnded);
            tracing::debug!(
                submitted_in = generation,
                current = state.generation,
                "Discarding reply for a reset conversation"
            );
            return Ok(SubmitOutcome::Discarded);
        }

        let message = Message::bot(reply);
        state.transcript.push(message.clone());
        self.driver.handle(&SessionEvent::ThinkingEnded);
        self.driver.handle(&SessionEvent::MessageAppended {
            message: message.clone(),
        });
        Ok(SubmitOutcome::Replied(message))
    }

    /// Submit a quick action's canned prompt.
    pub async fn submit_quick_action(
        &self,
        action: &QuickAction,
    ) -> Result<SubmitOutcome, ChatError> {
        tracing::debug!(label = %action.label, "Quick action selected");
        self.submit(&action.message).await
    }

    /// Append a message directly, without resolving a reply.
    pub fn append_message(&self, text: &str, sender: Sender) -> Result<Message, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let message = Message::new(sender, text);
        let mut state = self.lock_state();
        self.record(&mut state, message.clone());
        Ok(message)
    }

    /// Clear the transcript and return to the welcome phase.
    ///
    /// Safe to call in any phase. Replies still pending from before the reset
    /// are discarded when they arrive.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.transcript.clear();
        state.phase = Phase::Welcome;
        state.generation += 1;
        self.driver.handle(&SessionEvent::TranscriptCleared);
        tracing::debug!(generation = state.generation, "Conversation reset");
    }

    /// Activate the session if needed and append `message`.
    fn record(&self, state: &mut SessionState, message: Message) {
        if state.phase == Phase::Welcome {
            state.phase = Phase::Active;
            self.driver.handle(&SessionEvent::WelcomeHidden);
        }
        state.transcript.push(message.clone());
        self.driver.handle(&SessionEvent::MessageAppended { message });
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ResponseCatalog, ResponseRule};
    use crate::presentation::RecordingDriver;

    fn catalog() -> ResponseCatalog {
        ResponseCatalog::new(
            vec![ResponseRule::new(["hello", "hi"], "Greetings!").unwrap()],
            "I don't understand.",
        )
        .unwrap()
    }

    fn new_session(think_delay: Duration) -> (ConversationSession, Arc<RecordingDriver>) {
        let driver = Arc::new(RecordingDriver::new());
        let resolver = Arc::new(ResponseResolver::new(catalog()));
        let session =
            ConversationSession::new(resolver, driver.clone()).with_think_delay(think_delay);
        (session, driver)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (session, driver) = new_session(Duration::ZERO);
        assert_eq!(session.phase(), Phase::Welcome);
        assert!(session.transcript().is_empty());
        assert_eq!(session.generation(), 0);
        assert!(driver.events().is_empty());
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_bot() {
        let (session, _) = new_session(Duration::ZERO);
        let outcome = session.submit("Hi there").await.unwrap();

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].sender, Sender::User);
        assert_eq!(transcript[0].text, "Hi there");
        assert_eq!(transcript[1].sender, Sender::Bot);
        assert_eq!(transcript[1].text, "Greetings!");
        assert_eq!(outcome.reply(), Some(&transcript[1]));
    }

    #[tokio::test]
    async fn test_submit_trims_input() {
        let (session, _) = new_session(Duration::ZERO);
        session.submit("  What time is it?\n").await.unwrap();
        let transcript = session.transcript();
        assert_eq!(transcript[0].text, "What time is it?");
        assert_eq!(transcript[1].text, "I don't understand.");
    }

    #[tokio::test]
    async fn test_first_submit_activates_session() {
        let (session, _) = new_session(Duration::ZERO);
        session.submit("hello").await.unwrap();
        assert_eq!(session.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn test_empty_submit_is_rejected_without_state_change() {
        let (session, driver) = new_session(Duration::ZERO);
        for blank in ["", "   ", "\n\t"] {
            assert!(matches!(
                session.submit(blank).await,
                Err(ChatError::EmptyInput)
            ));
        }
        assert_eq!(session.phase(), Phase::Welcome);
        assert!(session.transcript().is_empty());
        assert!(driver.events().is_empty());

        session.submit("hello").await.unwrap();
        assert!(session.submit(" ").await.is_err());
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn test_event_order_for_first_submit() {
        let (session, driver) = new_session(Duration::ZERO);
        session.submit("hello").await.unwrap();
        assert_eq!(
            driver.event_types(),
            vec![
                "welcome_hidden",
                "message_appended",
                "thinking_started",
                "thinking_ended",
                "message_appended",
            ]
        );
    }

    #[tokio::test]
    async fn test_welcome_hidden_only_once() {
        let (session, driver) = new_session(Duration::ZERO);
        session.submit("hello").await.unwrap();
        session.submit("again").await.unwrap();
        let hidden = driver
            .event_types()
            .into_iter()
            .filter(|t| *t == "welcome_hidden")
            .count();
        assert_eq!(hidden, 1);
    }

    #[tokio::test]
    async fn test_appended_events_carry_transcript_messages() {
        let (session, driver) = new_session(Duration::ZERO);
        session.submit("hello").await.unwrap();
        let appended: Vec<Message> = driver
            .events()
            .iter()
            .filter_map(|e| e.message().cloned())
            .collect();
        assert_eq!(appended, session.transcript());
    }

    #[tokio::test]
    async fn test_reset_returns_to_welcome() {
        let (session, driver) = new_session(Duration::ZERO);
        session.submit("hello").await.unwrap();
        session.reset();

        assert_eq!(session.phase(), Phase::Welcome);
        assert!(session.transcript().is_empty());
        assert_eq!(session.generation(), 1);
        assert_eq!(driver.event_types().last(), Some(&"transcript_cleared"));
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (session, _) = new_session(Duration::ZERO);
        session.reset();
        session.reset();
        assert_eq!(session.phase(), Phase::Welcome);
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_reset_hides_welcome_again() {
        let (session, driver) = new_session(Duration::ZERO);
        session.submit("hello").await.unwrap();
        session.reset();
        driver.clear();

        session.submit("hi").await.unwrap();
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(driver.event_types()[0], "welcome_hidden");
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_think_delay_is_respected() {
        let (session, _) = new_session(Duration::from_millis(600));
        let start = tokio::time::Instant::now();
        session.submit("hello").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_message_recorded_before_reply() {
        let (session, _) = new_session(Duration::from_millis(600));
        let observe = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let transcript = session.transcript();
            assert_eq!(transcript.len(), 1);
            assert_eq!(transcript[0].sender, Sender::User);
        };
        let (outcome, _) = tokio::join!(session.submit("hello"), observe);
        assert!(matches!(outcome, Ok(SubmitOutcome::Replied(_))));
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submits_are_not_serialized() {
        let (session, _) = new_session(Duration::from_millis(600));
        let (a, b) = tokio::join!(session.submit("hello"), session.submit("what?"));
        assert!(a.is_ok() && b.is_ok());

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0].text, "hello");
        assert_eq!(transcript[1].text, "what?");
        assert_eq!(transcript[2].sender, Sender::Bot);
        assert_eq!(transcript[3].sender, Sender::Bot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_submit_discards_reply() {
        let (session, driver) = new_session(Duration::from_millis(600));
        let reset_later = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.reset();
        };
        let (outcome, _) = tokio::join!(session.submit("hello"), reset_later);

        assert_eq!(outcome.unwrap(), SubmitOutcome::Discarded);
        assert!(session.transcript().is_empty());
        assert_eq!(session.phase(), Phase::Welcome);
        assert_eq!(
            driver.event_types(),
            vec![
                "welcome_hidden",
                "message_appended",
                "thinking_started",
                "transcript_cleared",
                "thinking_ended",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_from_old_generation_does_not_leak_into_new_conversation() {
        let (session, _) = new_session(Duration::from_millis(600));
        let restart = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.reset();
            session.submit("what?").await
        };
        let (first, second) = tokio::join!(session.submit("hello"), restart);

        assert_eq!(first.unwrap(), SubmitOutcome::Discarded);
        assert!(matches!(second, Ok(SubmitOutcome::Replied(_))));
        let texts: Vec<String> = session.transcript().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["what?", "I don't understand."]);
    }

    #[tokio::test]
    async fn test_append_message_without_resolution() {
        let (session, driver) = new_session(Duration::ZERO);
        let message = session
            .append_message("Welcome back.", Sender::Bot)
            .unwrap();
        assert_eq!(message.sender, Sender::Bot);
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.transcript(), vec![message]);
        assert_eq!(
            driver.event_types(),
            vec!["welcome_hidden", "message_appended"]
        );

        assert!(matches!(
            session.append_message("  ", Sender::User),
            Err(ChatError::EmptyInput)
        ));
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_quick_action() {
        let (session, _) = new_session(Duration::ZERO);
        let action = QuickAction::new("Say hello", "Hello!");
        session.submit_quick_action(&action).await.unwrap();
        let transcript = session.transcript();
        assert_eq!(transcript[0].text, "Hello!");
        assert_eq!(transcript[1].text, "Greetings!");
    }
}
