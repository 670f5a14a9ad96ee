//! Generator reply envelope
//!
//! A reply is a JSON object with the displayable scene (`text`, `options`,
//! `changes`, `end_game`) plus side-channel bookkeeping (`memory`,
//! `character_background`) that never reaches the screen.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::GeneratorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneOption {
    pub text: String,
    pub next_scene: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryChanges {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Requested mutation of session state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_info: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryChanges>,
}

/// The displayable part of a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub text: String,
    pub options: Vec<SceneOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Changes>,
    #[serde(default, deserialize_with = "truthy")]
    pub end_game: bool,
}

/// A full reply with side-channel fields split off
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorReply {
    #[serde(flatten)]
    pub scene: Scene,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub character_background: Option<Value>,
}

/// Accept `true`, `1`, `"yes"` and friends the way a loosely typed producer
/// might send them. Null, false, zero and empty values are false.
fn truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

/// Remove surrounding code fences and stray backticks from a reply body
pub fn strip_fences(content: &str) -> &str {
    let mut body = content.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim().trim_matches('`').trim()
}

/// Parse and structurally validate a reply
pub fn parse_reply(content: &str) -> Result<GeneratorReply, GeneratorError> {
    let body = strip_fences(content);
    let malformed = |reason: String| GeneratorError::Malformed { raw: content.to_string(), reason };

    let reply: GeneratorReply =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

    if reply.scene.options.is_empty() && !reply.scene.end_game {
        return Err(malformed("scene has no options and does not end the game".into()));
    }
    Ok(reply)
}
