//! The visitor's side: ask for a name once, describe the environment, report it.

pub mod capture;
pub mod prompt;
pub mod report;
pub mod session;

pub use capture::Environment;
pub use prompt::{NamePrompt, PromptState};
pub use report::{Reporter, TrackError};
pub use session::{FileSession, MemorySession, SessionError, SessionStore};
