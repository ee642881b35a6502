//! Terminal rendering of session events.
//!
//! Runs on its own task behind a [`dvnc_chat::ChannelDriver`], so the typing
//! animation never holds up the session.

use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use dvnc_chat::reveal_frames;
use dvnc_core::config::{PresentationConfig, QuickAction};
use dvnc_core::events::SessionEvent;
use dvnc_core::types::Sender;

const BOT_PREFIX: &str = "dvnc > ";
const USER_PREFIX: &str = "you  > ";

pub struct TerminalRenderer<W: Write> {
    out: W,
    typing_delay: Duration,
    chunk_chars: usize,
    quick_actions: Vec<QuickAction>,
    /// Submits currently waiting on a reply.
    thinking: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, presentation: &PresentationConfig, quick_actions: Vec<QuickAction>) -> Self {
        Self {
            out,
            typing_delay: presentation.typing_delay(),
            chunk_chars: presentation.reveal_chunk_chars,
            quick_actions,
            thinking: 0,
        }
    }

    /// Render events until every sender is gone.
    pub async fn run(mut self, mut rx: broadcast::Receiver<SessionEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = self.render(&event).await {
                        tracing::warn!(error = %e, "Terminal output failed, renderer stopping");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Renderer fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Renderer stopped");
    }

    pub async fn render(&mut self, event: &SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::WelcomeHidden => {
                writeln!(self.out)?;
            }
            SessionEvent::ThinkingStarted => {
                self.thinking += 1;
                if self.thinking == 1 {
                    writeln!(self.out, "{}...", BOT_PREFIX)?;
                }
            }
            SessionEvent::ThinkingEnded => {
                self.thinking = self.thinking.saturating_sub(1);
            }
            SessionEvent::MessageAppended { message } => match message.sender {
                Sender::User => writeln!(self.out, "{}{}", USER_PREFIX, message.text)?,
                Sender::Bot => self.type_out(&message.text).await?,
            },
            SessionEvent::TranscriptCleared => {
                self.thinking = 0;
                self.welcome()?;
            }
        }
        self.out.flush()
    }

    /// Banner with the numbered quick actions.
    pub fn welcome(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "DVNC.AI")?;
        writeln!(self.out, "Ask about invention, art, or how things work.")?;
        write_quick_actions(&mut self.out, &self.quick_actions)?;
        self.out.flush()
    }

    async fn type_out(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{}", BOT_PREFIX)?;
        let mut shown = 0;
        for frame in reveal_frames(text, self.chunk_chars) {
            write!(self.out, "{}", &frame[shown..])?;
            self.out.flush()?;
            shown = frame.len();
            if !self.typing_delay.is_zero() {
                tokio::time::sleep(self.typing_delay).await;
            }
        }
        writeln!(self.out)
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// Numbered quick action list, as `/quick N` expects it.
pub fn write_quick_actions(out: &mut impl Write, actions: &[QuickAction]) -> io::Result<()> {
    for (i, action) in actions.iter().enumerate() {
        writeln!(out, "  /quick {}  {}", i + 1, action.label)?;
    }
    Ok(())
}
