//! Narrative client: one generator request per scene
//!
//! Builds the request from session state, sends it once, and validates the
//! reply. Any failure is returned as-is; there is no retry or repair.

use tracing::{debug, info};

use crate::client::{ChatMessage, Generator};
use crate::error::GeneratorError;
use crate::prompt::{opening_message, NarrativePrompt};
use crate::scene::{parse_reply, GeneratorReply};
use crate::state::SessionState;

pub struct NarrativeClient<G> {
    generator: G,
}

impl<G: Generator> NarrativeClient<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Messages for a request. Without a choice the user message is the
    /// serialized game state; with one it is the choice text.
    pub fn build_messages(state: &SessionState, choice: Option<&str>) -> Vec<ChatMessage> {
        let user = match choice {
            Some(text) => text.to_string(),
            None => opening_message(state),
        };
        vec![ChatMessage::system(NarrativePrompt::new(state).build()), ChatMessage::user(user)]
    }

    pub async fn request_scene(
        &self,
        state: &SessionState,
        choice: Option<&str>,
    ) -> Result<GeneratorReply, GeneratorError> {
        let messages = Self::build_messages(state, choice);
        info!(scene = %state.current_scene, continuation = choice.is_some(), "requesting scene");

        let raw = self.generator.complete(messages).await?;
        debug!(response = %raw, "generator reply");

        let reply = parse_reply(&raw)?;
        info!(options = reply.scene.options.len(), end_game = reply.scene.end_game, "scene received");
        Ok(reply)
    }
}
