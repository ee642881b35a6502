//! Chat pipeline for the DVNC.AI widget.
//!
//! Takes free-text user input, resolves a reply from a keyword catalog or a
//! remote chat endpoint, and drives the welcome/conversation state machine
//! that a presentation layer renders.

pub mod backend;
pub mod catalog;
pub mod error;
pub mod presentation;
pub mod resolver;
pub mod session;

pub use backend::{ChatBackend, HttpChatBackend};
pub use catalog::{ResponseCatalog, ResponseRule};
pub use error::{ChatError, RemoteResolutionError};
pub use presentation::{reveal_frames, ChannelDriver, PresentationDriver, RecordingDriver};
pub use resolver::{ResolverConfig, ResponseResolver};
pub use session::{ConversationSession, SubmitOutcome};
