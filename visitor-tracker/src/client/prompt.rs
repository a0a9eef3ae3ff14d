//! The once-per-session "may I have your name?" prompt.

use std::time::Duration;

use super::session::{SessionError, SessionStore, VISITOR_NAME};

pub const PROMPT_DELAY: Duration = Duration::from_secs(3);
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    /// Already answered this session.
    Hidden,
    /// Waiting to appear.
    Scheduled { delay: Duration },
    Open,
}

#[derive(Debug)]
pub struct NamePrompt {
    state: PromptState,
}

impl NamePrompt {
    pub fn mount(store: &impl SessionStore) -> Self {
        let state = if store.is_set(VISITOR_NAME) {
            PromptState::Hidden
        } else {
            PromptState::Scheduled {
                delay: PROMPT_DELAY,
            }
        };
        NamePrompt { state }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PromptState::Open
    }

    /// Called once the scheduled delay has elapsed.
    pub fn open(&mut self) {
        if matches!(self.state, PromptState::Scheduled { .. }) {
            self.state = PromptState::Open;
        }
    }

    /// Records a non-blank name and closes. Blank input leaves the prompt
    /// open and yields `None`.
    pub fn submit(
        &mut self,
        store: &mut impl SessionStore,
        input: &str,
    ) -> Result<Option<String>, SessionError> {
        let name = input.trim();
        if !self.is_open() || name.is_empty() {
            return Ok(None);
        }
        self.answer(store, name).map(Some)
    }

    /// Dismissing the prompt counts as an answer.
    pub fn skip(&mut self, store: &mut impl SessionStore) -> Result<Option<String>, SessionError> {
        if !self.is_open() {
            return Ok(None);
        }
        self.answer(store, ANONYMOUS).map(Some)
    }

    fn answer(&mut self, store: &mut impl SessionStore, name: &str) -> Result<String, SessionError> {
        store.set(VISITOR_NAME, name)?;
        self.state = PromptState::Hidden;
        tracing::debug!(%name, "visitor answered the name prompt");
        Ok(name.to_string())
    }
}
