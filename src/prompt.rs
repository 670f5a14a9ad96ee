//! System prompt for the narrative generator
//!
//! Tells the model the JSON contract, the hidden character background and the
//! recent actions, plus the current game state and memory.

use serde_json::Value;

use crate::state::SessionState;

// ═══════════════════════════════════════════════════════════════
// SYSTEM PROMPT BUILDER
// ═══════════════════════════════════════════════════════════════

/// Builds the per-request system prompt from session state
pub struct NarrativePrompt<'a> {
    state: &'a SessionState,
}

impl<'a> NarrativePrompt<'a> {
    pub fn new(state: &'a SessionState) -> Self {
        Self { state }
    }

    /// Generate the full system prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&self.contract_section());
        prompt.push_str(&self.memory_rules_section());
        prompt.push_str(&self.background_section());
        prompt.push_str(&self.recent_actions_section());
        prompt.push_str(&self.state_section());

        prompt
    }

    fn contract_section(&self) -> String {
        r#"You are a text-based adventure game. Respond with a single JSON object containing:
- 'text' (scene description)
- 'options' (array of choices with 'text' and 'next_scene' properties)
- 'changes' (modifications to player_info or inventory, e.g. {"player_info": {"health": 90}, "inventory": {"add": ["rope"], "remove": ["torch"]}})
- 'memory' (a narrative summary of the game session)
- 'character_background' (updates to the character's background information)
- 'end_game' (true only when the story has reached its end)
You can modify the player's inventory by adding or removing items.
You can change any information in the player_info.
You can update the character_background to reflect character development or new information.
Use color tags like <color="red">text</color> to highlight only specific important words or phrases, not entire paragraphs.

"#
        .to_string()
    }

    fn memory_rules_section(&self) -> String {
        r#"The 'memory' field should contain a concise summary of the game session, including:
- Key plot points and events that have occurred
- Character development and important decisions made by the player
- Current goals or objectives the player is pursuing
- Potential future plot directions or challenges
- Any significant changes in the game world or relationships with NPCs
Do not include specific game mechanics like health points or inventory items in the memory.
Focus on creating a narrative summary that captures the essence of the story and the player's journey.

"#
        .to_string()
    }

    fn background_section(&self) -> String {
        format!(
            "Current Character Background (not visible to the player):\n{}\n\n\
             Use this background information to inform the character's actions, dialogue, and the overall narrative, \
             but do not explicitly mention it to the player.\n\
             Update the character_background if significant character development occurs or new information about the character is revealed.\n\n",
            pretty(&self.state.character_background)
        )
    }

    fn recent_actions_section(&self) -> String {
        let history = &self.state.action_history;
        let lines = if history.is_empty() {
            "(none yet)".to_string()
        } else {
            history.transcript()
        };
        format!(
            "Last three actions:\n{}\n\nUse these last actions to maintain continuity and context in the story.\n\n",
            lines
        )
    }

    fn state_section(&self) -> String {
        let memory = if self.state.memory.is_empty() { "(empty)" } else { &self.state.memory };
        format!(
            "Current game state:\n{}\n\nMemory:\n{}\n",
            pretty(&self.state.snapshot()),
            memory
        )
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// User message for the opening request of a session
pub fn opening_message(state: &SessionState) -> String {
    serde_json::json!({
        "game_state": state.snapshot(),
        "memory": state.memory,
    })
    .to_string()
}
