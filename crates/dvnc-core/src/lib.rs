pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{DvncConfig, QuickAction};
pub use error::{DvncError, Result};
pub use events::SessionEvent;
pub use types::*;
