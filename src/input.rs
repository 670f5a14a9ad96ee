//! Keyboard input for the scene menu
//!
//! `InputSource` is the seam between the turn loop and the platform: the
//! terminal implementation polls crossterm at a fixed interval, tests supply a
//! scripted one. Free-text entry stays in raw mode and edits the line key by
//! key, so Ctrl+C ends it as promptly as it ends the menu.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Stylize,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Poll interval while waiting for a key
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default free-text key: Tab
pub const DEFAULT_CUSTOM_KEY: u32 = 9;

/// Discrete menu events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Up,
    Down,
    Select,
    RequestCustomInput,
    Interrupt,
}

/// Outcome of a free-text read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEntry {
    Line(String),
    Interrupted,
}

/// Source of menu events and free-text lines
pub trait InputSource {
    /// Block until the next menu event
    fn next_event(&mut self) -> Result<UiEvent>;

    /// Read one line of free text, or stop early on an interrupt
    fn read_line(&mut self, prompt: &str) -> Result<TextEntry>;
}

/// Console key code for a key event, in the classic numbering
/// (Tab = 9, Enter = 13, Esc = 27, printable characters by code point).
pub fn key_code(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::Tab => Some(9),
        KeyCode::Backspace => Some(8),
        KeyCode::Enter => Some(13),
        KeyCode::Esc => Some(27),
        KeyCode::Char(c) => Some(c as u32),
        _ => None,
    }
}

/// Human-readable name for a key code, used in the menu hint
pub fn key_name(code: u32) -> String {
    match code {
        8 => "BACKSPACE".into(),
        9 => "TAB".into(),
        13 => "ENTER".into(),
        27 => "ESC".into(),
        32 => "SPACE".into(),
        c => char::from_u32(c)
            .filter(|c| !c.is_control())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| format!("key {}", c)),
    }
}

/// Translate one key press into a menu event
pub fn classify(key: &KeyEvent, custom_key: u32) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Interrupt);
    }
    if key_code(key.code) == Some(custom_key) {
        return Some(UiEvent::RequestCustomInput);
    }
    match key.code {
        KeyCode::Up => Some(UiEvent::Up),
        KeyCode::Down => Some(UiEvent::Down),
        KeyCode::Enter => Some(UiEvent::Select),
        _ => None,
    }
}

/// One key press while a line is being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKey {
    Insert(char),
    Erase,
    Submit,
    Interrupt,
}

/// Translate one key press during free-text entry
pub fn classify_line_key(key: &KeyEvent) -> Option<LineKey> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(LineKey::Interrupt),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(LineKey::Insert(c)),
        KeyCode::Backspace => Some(LineKey::Erase),
        KeyCode::Enter => Some(LineKey::Submit),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════
// TERMINAL
// ═══════════════════════════════════════════════════════════════

/// crossterm-backed input. Holds raw mode for its lifetime.
pub struct TerminalInput {
    custom_key: u32,
    interrupted: Arc<AtomicBool>,
}

impl TerminalInput {
    pub fn new(custom_key: u32) -> Result<Self> {
        let interrupted = Arc::new(AtomicBool::new(false));

        // Raw mode turns Ctrl+C into a key event; this catches an external SIGINT
        let flag = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        }) {
            tracing::warn!("SIGINT handler not installed: {}", e);
        }

        enable_raw_mode()?;
        Ok(Self { custom_key, interrupted })
    }

    fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }
}

impl InputSource for TerminalInput {
    fn next_event(&mut self) -> Result<UiEvent> {
        loop {
            if self.take_interrupt() {
                return Ok(UiEvent::Interrupt);
            }
            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if let Some(ev) = classify(&key, self.custom_key) {
                        return Ok(ev);
                    }
                }
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<TextEntry> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt.yellow())?;
        stdout.flush()?;

        let mut line = String::new();
        loop {
            if self.take_interrupt() {
                write!(stdout, "\r\n")?;
                return Ok(TextEntry::Interrupted);
            }
            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let Event::Key(key) = event::read()? else { continue };
            match classify_line_key(&key) {
                Some(LineKey::Insert(c)) => {
                    line.push(c);
                    write!(stdout, "{}", c)?;
                }
                Some(LineKey::Erase) => {
                    if line.pop().is_some() {
                        write!(stdout, "\u{8} \u{8}")?;
                    }
                }
                Some(LineKey::Submit) => {
                    write!(stdout, "\r\n")?;
                    return Ok(TextEntry::Line(line));
                }
                Some(LineKey::Interrupt) => {
                    write!(stdout, "\r\n")?;
                    return Ok(TextEntry::Interrupted);
                }
                None => continue,
            }
            stdout.flush()?;
        }
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

// ═══════════════════════════════════════════════════════════════
// SCRIPTED
// ═══════════════════════════════════════════════════════════════

/// One scripted step
#[derive(Debug, Clone)]
pub enum Scripted {
    Event(UiEvent),
    Line(String),
}

/// Replays a fixed sequence of events and lines. When the script runs out,
/// both reads report an interrupt. A scripted `Interrupt` event also ends a
/// line read.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    steps: VecDeque<Scripted>,
}

impl ScriptedInput {
    pub fn new(steps: impl IntoIterator<Item = Scripted>) -> Self {
        Self { steps: steps.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_event(&mut self) -> Result<UiEvent> {
        loop {
            match self.steps.pop_front() {
                Some(Scripted::Event(ev)) => return Ok(ev),
                Some(Scripted::Line(_)) => continue,
                None => return Ok(UiEvent::Interrupt),
            }
        }
    }

    fn read_line(&mut self, _prompt: &str) -> Result<TextEntry> {
        loop {
            match self.steps.pop_front() {
                Some(Scripted::Line(line)) => return Ok(TextEntry::Line(line)),
                Some(Scripted::Event(UiEvent::Interrupt)) | None => return Ok(TextEntry::Interrupted),
                Some(Scripted::Event(_)) => continue,
            }
        }
    }
}
