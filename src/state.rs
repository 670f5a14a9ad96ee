//! Session state - the authoritative record of a playthrough
//!
//! Owned by the turn loop and mutated only through the merge operations here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use crate::scene::{Changes, GeneratorReply};

/// Entries kept in the rolling action history (three user/response pairs)
pub const HISTORY_CAPACITY: usize = 6;

// ═══════════════════════════════════════════════════════════════
// INITIAL GAME DATA
// ═══════════════════════════════════════════════════════════════

/// Starting point of a session, read from `game_data.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub player_info: Map<String, Value>,
    pub inventory: Vec<String>,
    pub current_scene: String,
    #[serde(default = "empty_object")]
    pub character_background: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl GameData {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

// ═══════════════════════════════════════════════════════════════
// ACTION HISTORY
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UserAction,
    ModelResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub text: String,
}

/// Bounded FIFO of recent actions. Eviction always drops a whole
/// user/response pair from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionHistory {
    entries: VecDeque<ActionEntry>,
}

impl ActionHistory {
    pub fn push_user(&mut self, text: &str) {
        // leave room for this action's response
        self.make_room(2);
        self.entries.push_back(ActionEntry { kind: ActionKind::UserAction, text: text.to_string() });
    }

    pub fn push_response(&mut self, text: &str) {
        self.make_room(1);
        self.entries.push_back(ActionEntry { kind: ActionKind::ModelResponse, text: text.to_string() });
    }

    fn make_room(&mut self, needed: usize) {
        while !self.entries.is_empty() && self.entries.len() + needed > HISTORY_CAPACITY {
            self.entries.pop_front();
            if matches!(self.entries.front(), Some(e) if e.kind == ActionKind::ModelResponse) {
                self.entries.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionEntry> {
        self.entries.iter()
    }

    /// Alternating `User:` / `Game:` lines for the generator prompt
    pub fn transcript(&self) -> String {
        self.entries
            .iter()
            .map(|e| match e.kind {
                ActionKind::UserAction => format!("User: {}", e.text),
                ActionKind::ModelResponse => format!("Game: {}", e.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ═══════════════════════════════════════════════════════════════
// SESSION STATE
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub player_info: Map<String, Value>,
    pub inventory: Vec<String>,
    pub current_scene: String,
    pub memory: String,
    pub character_background: Value,
    pub action_history: ActionHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_choice: Option<String>,
}

impl SessionState {
    pub fn new(data: GameData) -> Self {
        Self {
            player_info: data.player_info,
            inventory: data.inventory,
            current_scene: data.current_scene,
            memory: String::new(),
            character_background: data.character_background,
            action_history: ActionHistory::default(),
            last_choice: None,
        }
    }

    /// The `game_state` object sent to the generator
    pub fn snapshot(&self) -> Value {
        serde_json::json!({
            "player_info": self.player_info,
            "inventory": self.inventory,
            "current_scene": self.current_scene,
            "last_choice": self.last_choice,
        })
    }

    /// Merge a `changes` payload: player_info key-by-key, inventory adds
    /// appended, inventory removes by first match (absent items ignored).
    pub fn apply_changes(&mut self, changes: Option<&Changes>) {
        let Some(changes) = changes else { return };

        if let Some(info) = &changes.player_info {
            for (key, value) in info {
                self.player_info.insert(key.clone(), value.clone());
            }
        }

        if let Some(inv) = &changes.inventory {
            self.inventory.extend(inv.add.iter().cloned());
            for item in &inv.remove {
                if let Some(pos) = self.inventory.iter().position(|i| i == item) {
                    self.inventory.remove(pos);
                }
            }
        }
    }

    /// Fold the side-channel fields of a reply into state. Returns the new
    /// background when it structurally differs from the stored one.
    pub fn absorb(&mut self, reply: &GeneratorReply) -> Option<&Value> {
        if let Some(memory) = &reply.memory {
            self.memory = memory.clone();
        }
        match &reply.character_background {
            Some(bg) if *bg != self.character_background => {
                self.character_background = bg.clone();
                Some(&self.character_background)
            }
            _ => None,
        }
    }

    /// Commit the player's choice for this turn
    pub fn commit_choice(&mut self, choice: &str) {
        self.last_choice = Some(choice.to_string());
        self.action_history.push_user(choice);
    }
}
