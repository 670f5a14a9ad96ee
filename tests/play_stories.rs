//! User Story Integration Tests
//!
//! These tests drive a whole play session with a scripted narrator and a
//! scripted keyboard, and verify what the player and the log files see.
//!
//! Each test represents a real user story:
//! - "As a player, I want to..."
//! - Tests verify the resulting state and files
//! - Steps are traced to stderr for debugging

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use talespin::client::{ChatMessage, Generator};
use talespin::error::{GameError, GeneratorError};
use talespin::game::Game;
use talespin::input::{Scripted, ScriptedInput, UiEvent};
use talespin::recorder::{Ending, SessionRecorder};
use talespin::state::{ActionKind, GameData, SessionState};

/// Test helper to capture and display trace logs
struct TestTracer {
    name: String,
}

impl TestTracer {
    fn new(name: &str) -> Self {
        eprintln!("\n╔═══════════════════════════════════════════════════════════════");
        eprintln!("║ USER STORY: {}", name);
        eprintln!("╚═══════════════════════════════════════════════════════════════\n");
        Self { name: name.to_string() }
    }

    fn step(&mut self, description: &str) {
        eprintln!("  → {}", description);
    }

    fn expect(&mut self, condition: bool, description: &str) {
        let status = if condition { "✓" } else { "✗" };
        eprintln!("    {} {}", status, description);
        assert!(condition, "FAILED: {}", description);
    }

    fn done(&self) {
        eprintln!("\n  ✓ Story completed: {}\n", self.name);
    }
}

// ═══════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Narrator {
    replies: Mutex<VecDeque<Result<String, GeneratorError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

#[derive(Clone, Default)]
struct ScriptedNarrator(Arc<Narrator>);

impl ScriptedNarrator {
    fn new(replies: Vec<Result<String, GeneratorError>>) -> Self {
        let narrator = Narrator { replies: Mutex::new(replies.into()), ..Default::default() };
        Self(Arc::new(narrator))
    }

    fn user_messages(&self) -> Vec<String> {
        self.0
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|msgs| msgs.last().unwrap().content.clone())
            .collect()
    }

    fn system_prompts(&self) -> Vec<String> {
        self.0.requests.lock().unwrap().iter().map(|msgs| msgs[0].content.clone()).collect()
    }
}

#[async_trait]
impl Generator for ScriptedNarrator {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GeneratorError> {
        self.0.requests.lock().unwrap().push(messages);
        self.0
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GeneratorError::Transport("script exhausted".into())))
    }
}

fn reply(value: Value) -> Result<String, GeneratorError> {
    Ok(value.to_string())
}

fn fork_options() -> Value {
    json!([
        {"text": "Go left", "next_scene": "cave"},
        {"text": "Go right", "next_scene": "river"}
    ])
}

fn fork_scene() -> Value {
    json!({"text": "The path forks.", "options": fork_options(), "memory": "A traveller reached a fork."})
}

fn initial_state() -> SessionState {
    SessionState::new(GameData {
        player_info: json!({"health": 100}).as_object().unwrap().clone(),
        inventory: vec!["torch".into()],
        current_scene: "crossroads".into(),
        character_background: json!({}),
    })
}

type TestGame = Game<ScriptedNarrator, ScriptedInput, Vec<u8>>;

fn game(logs: &Path, narrator: &ScriptedNarrator, steps: Vec<Scripted>) -> TestGame {
    let recorder = SessionRecorder::create(logs).unwrap();
    Game::new(narrator.clone(), ScriptedInput::new(steps), Vec::new(), recorder, initial_state(), 9)
        .with_progress(false)
}

fn ev(e: UiEvent) -> Scripted {
    Scripted::Event(e)
}

fn error_artifacts(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with("error_"))
        .collect()
}

// ═══════════════════════════════════════════════════════════════
// STORY: Picking an option advances via the first option
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn story_choice_applies_changes_and_advances_by_first_option() {
    let mut t = TestTracer::new("Choosing 'Go right' still advances to the first option's scene");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    t.step("Given a narrator offering Go left (cave) / Go right (river)");
    let narrator = ScriptedNarrator::new(vec![
        reply(fork_scene()),
        reply(json!({
            "text": "You find a rope by the water.",
            "options": fork_options(),
            "changes": {"inventory": {"add": ["rope"]}}
        })),
    ]);

    t.step("When the player moves down once, selects, then quits");
    let mut g = game(&logs, &narrator, vec![ev(UiEvent::Down), ev(UiEvent::Select)]);
    let ending = g.run().await.unwrap();

    t.expect(ending == Ending::Interrupted, "Session ends as interrupted once keys run out");
    let state = g.state();
    t.expect(state.inventory == vec!["torch", "rope"], "Rope appended after the torch");
    // The next scene follows options[0].next_scene even though option 1 was picked.
    t.expect(state.current_scene == "cave", "current_scene is 'cave', not 'river'");
    t.expect(state.last_choice.as_deref() == Some("Go right"), "last_choice is the picked option");
    t.expect(state.memory == "A traveller reached a fork.", "Memory carried from the opening reply");

    let kinds: Vec<_> = state.action_history.iter().map(|e| e.kind).collect();
    t.expect(kinds == vec![ActionKind::UserAction, ActionKind::ModelResponse], "One user/response pair");

    t.step("Then the continuation request carried the choice text");
    let users = narrator.user_messages();
    t.expect(users.len() == 2, "Exactly two generator calls");
    let opening: Value = serde_json::from_str(&users[0]).unwrap();
    t.expect(opening["game_state"]["current_scene"] == "crossroads", "Opening call sends game state");
    t.expect(users[1] == "Go right", "Continuation sends the choice");
    t.expect(narrator.system_prompts()[1].contains("User: Go right"), "Recent actions in prompt");

    t.step("And the status snapshot was written");
    let status: Value =
        serde_json::from_str(&fs::read_to_string(g.recorder().status_path()).unwrap()).unwrap();
    t.expect(status["inventory"] == json!(["torch", "rope"]), "Snapshot inventory matches");
    t.expect(status["current_scene"] == "cave", "Snapshot scene matches");

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Malformed reply is fatal
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn story_malformed_reply_stops_session_and_keeps_raw_text() {
    let mut t = TestTracer::new("Malformed narrator output ends the session");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    t.step("Given a narrator that answers with prose instead of JSON");
    let raw = "Once upon a time {\"text\": unterminated";
    let narrator = ScriptedNarrator::new(vec![Ok(raw.to_string())]);

    let mut g = game(&logs, &narrator, vec![]);
    let result = g.run().await;

    t.expect(
        matches!(result, Err(GameError::Generator(GeneratorError::Malformed { .. }))),
        "run() fails with a malformed-reply error",
    );

    let artifacts = error_artifacts(&logs);
    t.expect(artifacts.len() == 1, "One error artifact written");
    let body = fs::read_to_string(&artifacts[0]).unwrap();
    t.expect(body.contains(raw), "Artifact holds the raw reply");
    t.expect(!g.recorder().status_path().exists(), "No status snapshot written");

    t.done();
}

#[tokio::test]
async fn story_transport_failure_mid_session_is_fatal() {
    let mut t = TestTracer::new("Transport failure during continuation");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let narrator = ScriptedNarrator::new(vec![
        reply(fork_scene()),
        Err(GeneratorError::Transport("connection reset by peer".into())),
    ]);
    let mut g = game(&logs, &narrator, vec![ev(UiEvent::Select)]);
    let result = g.run().await;

    t.expect(matches!(result, Err(GameError::Generator(GeneratorError::Transport(_)))), "Transport error surfaces");
    t.expect(g.state().inventory == vec!["torch"], "State untouched by failed turn");
    let artifacts = error_artifacts(&logs);
    t.expect(artifacts.len() == 1, "Error artifact written");
    t.expect(fs::read_to_string(&artifacts[0]).unwrap().contains("connection reset"), "Artifact has error text");
    t.expect(!g.recorder().status_path().exists(), "No status snapshot written");

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Free-text entry
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn story_blank_custom_input_returns_to_menu() {
    let mut t = TestTracer::new("Whitespace-only custom option is discarded");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let narrator = ScriptedNarrator::new(vec![
        reply(fork_scene()),
        reply(json!({"text": "The river carries you home.", "options": [], "end_game": true})),
    ]);

    t.step("When the player moves down, opens free text, submits spaces, then selects");
    let mut g = game(
        &logs,
        &narrator,
        vec![
            ev(UiEvent::Down),
            ev(UiEvent::RequestCustomInput),
            Scripted::Line("   ".into()),
            ev(UiEvent::Select),
        ],
    );
    let ending = g.run().await.unwrap();

    t.expect(ending == Ending::GameOver, "Story ends with game over");
    t.expect(g.state().last_choice.as_deref() == Some("Go right"), "Selection stayed on index 1");
    t.expect(narrator.user_messages()[1] == "Go right", "Blank text never sent");

    let log = fs::read_to_string(g.recorder().transcript_path()).unwrap();
    t.expect(log.contains("## Game Over"), "Transcript records game over");
    t.expect(log.contains("### Final Memory\n\nA traveller reached a fork."), "Final memory recorded");

    t.done();
}

#[tokio::test]
async fn story_ctrl_c_while_typing_ends_session() {
    let mut t = TestTracer::new("Ctrl-C during free-text entry quits without a line");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let narrator = ScriptedNarrator::new(vec![reply(fork_scene())]);

    t.step("When the player opens free text and presses Ctrl-C before Enter");
    let mut g = game(
        &logs,
        &narrator,
        vec![
            ev(UiEvent::Down),
            ev(UiEvent::RequestCustomInput),
            ev(UiEvent::Interrupt),
            // would be chosen if the interrupt were ignored
            ev(UiEvent::Select),
        ],
    );
    let ending = g.run().await.unwrap();

    t.expect(ending == Ending::Interrupted, "Session ends as interrupted");
    t.expect(g.state().last_choice.is_none(), "Nothing committed");
    t.expect(narrator.user_messages().len() == 1, "No continuation requested");
    t.expect(g.recorder().status_path().exists(), "Status snapshot written");
    let log = fs::read_to_string(g.recorder().transcript_path()).unwrap();
    t.expect(log.contains("## Game Interrupted"), "Transcript records the interrupt");

    t.done();
}

#[tokio::test]
async fn story_custom_input_is_sent_as_choice() {
    let mut t = TestTracer::new("Typed option becomes the player's choice");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let narrator = ScriptedNarrator::new(vec![
        reply(fork_scene()),
        reply(json!({
            "text": "You climb the old oak.",
            "options": [{"text": "Look around", "next_scene": "treetop"}],
            "changes": {"player_info": {"location": "oak"}, "inventory": {"remove": ["torch", "lantern"]}}
        })),
    ]);
    let mut g = game(
        &logs,
        &narrator,
        vec![ev(UiEvent::RequestCustomInput), Scripted::Line("  climb the tree ".into())],
    );
    g.run().await.unwrap();

    let state = g.state();
    t.expect(narrator.user_messages()[1] == "climb the tree", "Trimmed text sent");
    t.expect(state.last_choice.as_deref() == Some("climb the tree"), "last_choice is the typed text");
    t.expect(state.inventory.is_empty(), "Torch removed, absent lantern ignored");
    t.expect(state.player_info["location"] == "oak", "player_info merged");
    t.expect(state.player_info["health"] == 100, "Existing keys kept");
    t.expect(state.current_scene == "treetop", "Advanced to first option's scene");

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Bookkeeping across many turns
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn story_history_keeps_last_three_pairs() {
    let mut t = TestTracer::new("Action history keeps only the last three turns");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let mut replies = vec![reply(fork_scene())];
    for i in 1..=4 {
        replies.push(reply(json!({"text": format!("Beat {}", i), "options": fork_options()})));
    }
    let narrator = ScriptedNarrator::new(replies);
    let steps = (0..4).map(|_| ev(UiEvent::Select)).collect();

    let mut g = game(&logs, &narrator, steps);
    g.run().await.unwrap();

    let texts: Vec<_> = g.state().action_history.iter().map(|e| e.text.clone()).collect();
    t.expect(texts.len() == 6, "History holds six entries");
    t.expect(
        texts == vec!["Go left", "Beat 2", "Go left", "Beat 3", "Go left", "Beat 4"],
        "Oldest pair evicted, order preserved",
    );
    t.expect(narrator.user_messages().len() == 5, "One opening plus four continuations");

    t.done();
}

#[tokio::test]
async fn story_background_logged_only_when_changed() {
    let mut t = TestTracer::new("Character background updates are logged once per change");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let bg = json!({"secret": "lost heir"});
    let narrator = ScriptedNarrator::new(vec![
        reply(json!({"text": "A", "options": fork_options(), "character_background": bg})),
        reply(json!({"text": "B", "options": fork_options(), "character_background": bg})),
        reply(json!({"text": "C", "options": fork_options(), "character_background": {"secret": "lost heir", "scar": "left hand"}})),
    ]);
    let mut g = game(&logs, &narrator, vec![ev(UiEvent::Select), ev(UiEvent::Select)]);
    g.run().await.unwrap();

    let log = fs::read_to_string(g.recorder().transcript_path()).unwrap();
    t.expect(log.matches("## Updated Character Background").count() == 2, "Two real changes logged");
    t.expect(g.state().character_background["scar"] == "left hand", "Latest background stored");
    t.expect(log.contains("## Game Interrupted"), "Interrupted ending recorded");
    t.expect(log.matches("## Scene: ").count() == 3, "One section per scene shown");

    t.done();
}

#[tokio::test]
async fn story_interrupt_at_first_menu_saves_state() {
    let mut t = TestTracer::new("Ctrl-C at the first menu still saves");
    let tmp = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");

    let narrator = ScriptedNarrator::new(vec![reply(fork_scene())]);
    let mut g = game(&logs, &narrator, vec![ev(UiEvent::Down), ev(UiEvent::Interrupt)]);
    let ending = g.run().await.unwrap();

    t.expect(ending == Ending::Interrupted, "Interrupted ending");
    t.expect(g.state().last_choice.is_none(), "No choice committed");
    t.expect(g.state().current_scene == "crossroads", "Scene unchanged");
    t.expect(g.recorder().status_path().exists(), "Status snapshot written");
    t.expect(narrator.user_messages().len() == 1, "No continuation requested");

    t.done();
}
