//! Turn loop
//!
//! One `Game` owns the session state, the narrative client, the input source
//! and the recorder for a whole playthrough. Each turn:
//!
//!   AwaitingInitialScene -> PresentingMenu -> AwaitingContinuation
//!     -> Applying -> (PresentingMenu | Terminating)
//!
//! The continuation reply becomes the next displayed scene directly, so the
//! opening request happens once per session. After a turn, `current_scene`
//! follows the first option's `next_scene` no matter which option was picked.

use crossterm::style::Color;
use std::io::Write;
use tracing::{error, info};

use crate::client::Generator;
use crate::display;
use crate::error::{GameError, GeneratorError};
use crate::input::{key_name, InputSource, TextEntry};
use crate::menu::{Menu, MenuStep};
use crate::narrative::NarrativeClient;
use crate::recorder::{Ending, SessionRecorder};
use crate::scene::{GeneratorReply, Scene};
use crate::spinner::Spinner;
use crate::state::SessionState;

const CUSTOM_PROMPT: &str = "Enter your own option (press Enter to send): ";
const WAIT_LABEL: &str = "Please wait...";

/// Turn-loop states
#[derive(Debug)]
pub enum Phase {
    AwaitingInitialScene,
    PresentingMenu(Scene),
    AwaitingContinuation(String),
    Applying(Scene),
    Terminating(Ending),
}

pub struct Game<G, I, W> {
    narrator: NarrativeClient<G>,
    input: I,
    out: W,
    recorder: SessionRecorder,
    state: SessionState,
    custom_key: String,
    show_progress: bool,
}

impl<G: Generator, I: InputSource, W: Write> Game<G, I, W> {
    pub fn new(
        generator: G,
        input: I,
        out: W,
        recorder: SessionRecorder,
        state: SessionState,
        custom_key: u32,
    ) -> Self {
        Self {
            narrator: NarrativeClient::new(generator),
            input,
            out,
            recorder,
            state,
            custom_key: key_name(custom_key),
            show_progress: true,
        }
    }

    /// Toggle the spinner shown during generator calls
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    /// Play until the story ends or the operator interrupts
    pub async fn run(&mut self) -> Result<Ending, GameError> {
        self.recorder.session_started(&self.state)?;
        let mut phase = Phase::AwaitingInitialScene;

        loop {
            phase = match phase {
                Phase::AwaitingInitialScene => {
                    let reply = self.fetch(None).await?;
                    Phase::PresentingMenu(self.absorb(reply)?)
                }
                Phase::PresentingMenu(scene) => {
                    self.recorder.scene_presented(&self.state, &scene)?;
                    match self.choose(&scene)? {
                        Some(choice) => {
                            self.state.commit_choice(&choice);
                            Phase::AwaitingContinuation(choice)
                        }
                        None => Phase::Terminating(Ending::Interrupted),
                    }
                }
                Phase::AwaitingContinuation(choice) => {
                    let reply = self.fetch(Some(&choice)).await?;
                    let scene = self.absorb(reply)?;
                    self.state.action_history.push_response(&scene.text);
                    Phase::Applying(scene)
                }
                Phase::Applying(scene) => self.apply(scene)?,
                Phase::Terminating(ending) => {
                    self.finish(ending)?;
                    return Ok(ending);
                }
            };
        }
    }

    /// One generator call bracketed by the spinner. Failures are written to an
    /// error artifact before they propagate.
    async fn fetch(&mut self, choice: Option<&str>) -> Result<GeneratorReply, GameError> {
        let spinner = self.show_progress.then(|| Spinner::start(WAIT_LABEL));
        let result = self.narrator.request_scene(&self.state, choice).await;
        if let Some(spinner) = spinner {
            spinner.stop();
        }

        result.map_err(|err| self.record_failure(err))
    }

    fn record_failure(&self, err: GeneratorError) -> GameError {
        match self.recorder.error_artifact(&err) {
            Ok(path) => error!(artifact = %path.display(), "generator failure: {}", err),
            Err(e) => error!("generator failure: {} (artifact not written: {:#})", err, e),
        }
        err.into()
    }

    /// Fold side-channel fields into state and hand back the displayable scene
    fn absorb(&mut self, reply: GeneratorReply) -> Result<Scene, GameError> {
        if let Some(background) = self.state.absorb(&reply) {
            info!("character background updated");
            self.recorder.background_updated(background)?;
        }
        Ok(reply.scene)
    }

    /// Run the menu until a choice is final. `None` means interrupted.
    fn choose(&mut self, scene: &Scene) -> Result<Option<String>, GameError> {
        let mut menu = Menu::new(scene.options.len());

        loop {
            display::render_scene(&mut self.out, &self.state, scene, menu.selected(), &self.custom_key)?;

            match menu.handle(self.input.next_event()?) {
                MenuStep::Redraw => {}
                MenuStep::Chosen(index) => return Ok(Some(scene.options[index].text.clone())),
                MenuStep::CaptureText => match self.input.read_line(CUSTOM_PROMPT)? {
                    TextEntry::Line(text) if !text.trim().is_empty() => {
                        return Ok(Some(text.trim().to_string()))
                    }
                    TextEntry::Line(_) => info!("empty custom option discarded"),
                    TextEntry::Interrupted => return Ok(None),
                },
                MenuStep::Interrupted => return Ok(None),
            }
        }
    }

    fn apply(&mut self, scene: Scene) -> Result<Phase, GameError> {
        self.state.apply_changes(scene.changes.as_ref());
        let choice = self.state.last_choice.clone().unwrap_or_default();
        self.recorder.choice_made(&self.state, &choice)?;

        if scene.end_game {
            return Ok(Phase::Terminating(Ending::GameOver));
        }
        if let Some(first) = scene.options.first() {
            self.state.current_scene = first.next_scene.clone();
        }
        info!(scene = %self.state.current_scene, "turn complete");
        Ok(Phase::PresentingMenu(scene))
    }

    fn finish(&mut self, ending: Ending) -> Result<(), GameError> {
        self.recorder.session_ended(&self.state, ending)?;
        info!(?ending, "session ended");

        let (message, color) = match ending {
            Ending::GameOver => ("Game Over. Thank you for playing!", Color::Green),
            Ending::Interrupted => ("Exiting the game...", Color::Yellow),
        };
        display::render_farewell(
            &mut self.out,
            message,
            color,
            self.recorder.transcript_path(),
            self.recorder.status_path(),
        )?;

        if ending == Ending::GameOver {
            // Enter and Ctrl+C both leave
            self.input.read_line("Press Enter to exit...")?;
        }
        Ok(())
    }
}
