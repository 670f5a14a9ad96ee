//! Session recording - transcript, status snapshot, error artifacts
//!
//! Every session writes into the logs directory:
//! - session_<stamp>.md: Markdown transcript (append-only)
//! - player_status_<stamp>.json: final session state, written at termination
//! - error_<stamp>.txt: raw reply or error text when the generator fails

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::GeneratorError;
use crate::scene::Scene;
use crate::state::SessionState;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    GameOver,
    Interrupted,
}

pub struct SessionRecorder {
    dir: PathBuf,
    transcript: PathBuf,
    status: PathBuf,
}

impl SessionRecorder {
    /// Create a recorder for a new session in `dir`
    pub fn create(dir: &Path) -> Result<Self> {
        Self::create_at(dir, Local::now())
    }

    pub fn create_at(dir: &Path, started: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let stamp = started.format("%Y%m%d_%H%M%S");
        Ok(Self {
            dir: dir.to_path_buf(),
            transcript: dir.join(format!("session_{}.md", stamp)),
            status: dir.join(format!("player_status_{}.json", stamp)),
        })
    }

    pub fn transcript_path(&self) -> &Path {
        &self.transcript
    }

    pub fn status_path(&self) -> &Path {
        &self.status
    }

    /// Append one section to the transcript
    fn append(&self, section: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.transcript)
            .with_context(|| format!("Failed to open {}", self.transcript.display()))?;
        write!(file, "{}\n\n", section)?;
        Ok(())
    }

    pub fn session_started(&self, state: &SessionState) -> Result<()> {
        self.append(&format!("# Game Session Log\n\nStarted at: {}", now()))?;
        self.append(&format!(
            "## Initial Character Background\n\n{}",
            pretty(&state.character_background)
        ))
    }

    pub fn scene_presented(&self, state: &SessionState, scene: &Scene) -> Result<()> {
        let options = scene
            .options
            .iter()
            .map(|o| format!("- {}", o.text))
            .collect::<Vec<_>>()
            .join("\n");
        self.append(&format!(
            "## Scene: {}\n\n### Description\n\n{}\n\n### Options\n\n{}\n\n### Memory\n\n{}",
            state.current_scene, scene.text, options, state.memory
        ))
    }

    pub fn background_updated(&self, background: &Value) -> Result<()> {
        self.append(&format!("## Updated Character Background\n\n{}", pretty(background)))
    }

    pub fn choice_made(&self, state: &SessionState, choice: &str) -> Result<()> {
        self.append(&format!(
            "### Player's Choice\n\n{}\n\n### Status\n\n{}\n- Inventory: {}",
            choice,
            status_lines(&state.player_info),
            state.inventory.join(", ")
        ))
    }

    /// Write the closing sections and the status snapshot
    pub fn session_ended(&self, state: &SessionState, ending: Ending) -> Result<()> {
        match ending {
            Ending::GameOver => self.append(&format!(
                "## Game Over\n\nEnded at: {}\n\n### Final Memory\n\n{}",
                now(),
                state.memory
            ))?,
            Ending::Interrupted => {
                self.append(&format!("## Game Interrupted\n\nEnded at: {}", now()))?
            }
        }
        self.append(&format!(
            "## Final Character Background\n\n{}",
            pretty(&state.character_background)
        ))?;
        self.save_status(state)
    }

    /// Save the status snapshot atomically (temp file + rename)
    pub fn save_status(&self, state: &SessionState) -> Result<()> {
        let tmp_path = self.dir.join(".player_status.json.tmp");
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&tmp_path, &content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.status)
            .with_context(|| format!("Failed to write {}", self.status.display()))?;
        Ok(())
    }

    /// Persist a generator failure to its own timestamped file
    pub fn error_artifact(&self, err: &GeneratorError) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        let path = self.dir.join(format!("error_{}.txt", stamp));
        fs::write(&path, err.artifact_body())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn now() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Render a scalar for display without JSON string quotes
pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn status_lines(info: &Map<String, Value>) -> String {
    info.iter()
        .map(|(k, v)| format!("- {}: {}", k, scalar(v)))
        .collect::<Vec<_>>()
        .join("\n")
}
