//! Scene rendering
//!
//! Writes through any `Write` so the turn loop can draw to the terminal or to
//! a buffer. Lines end in `\r\n` because the terminal is in raw mode.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Stylize},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

use crate::markup;
use crate::recorder::scalar;
use crate::scene::Scene;
use crate::state::SessionState;

fn line(out: &mut impl Write, text: &str) -> io::Result<()> {
    write!(out, "{}\r\n", text)
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// `Key: value | Key: value` summary of player_info
pub fn header_line(state: &SessionState) -> String {
    state
        .player_info
        .iter()
        .map(|(k, v)| format!("{}: {}", capitalize(k), scalar(v)))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))
}

pub fn render_header(out: &mut impl Write, state: &SessionState) -> io::Result<()> {
    let header = header_line(state);
    let rule = "-".repeat(markup::strip(&header).width());
    line(out, &markup::render(&header))?;
    line(out, &rule)?;
    let inventory = if state.inventory.is_empty() {
        "Empty".to_string()
    } else {
        state.inventory.join(", ")
    };
    line(out, &format!("Inventory: {}", inventory))?;
    line(out, &rule)
}

/// Full menu frame: header, previous choice, scene text, options, hint
pub fn render_scene(
    out: &mut impl Write,
    state: &SessionState,
    scene: &Scene,
    selected: usize,
    custom_key: &str,
) -> io::Result<()> {
    clear_screen(out)?;
    render_header(out, state)?;

    if let Some(choice) = &state.last_choice {
        line(out, "")?;
        line(out, &format!("Previous choice: {}", markup::strip(choice)).with(Color::Cyan).to_string())?;
    }

    line(out, "")?;
    for text_line in markup::render(&scene.text).lines() {
        line(out, text_line)?;
    }
    line(out, "")?;

    for (i, option) in scene.options.iter().enumerate() {
        if i == selected {
            let plain = markup::strip(&option.text);
            line(out, &plain.with(Color::Black).on(Color::White).to_string())?;
        } else {
            line(out, &markup::render(&option.text))?;
        }
    }

    line(out, "")?;
    line(out, &format!("Press {} to enter your own option", custom_key).with(Color::Yellow).to_string())?;
    out.flush()
}

/// Closing screen after the session ends
pub fn render_farewell(
    out: &mut impl Write,
    message: &str,
    color: Color,
    transcript: &std::path::Path,
    status: &std::path::Path,
) -> io::Result<()> {
    clear_screen(out)?;
    line(out, "")?;
    line(out, &message.with(color).to_string())?;
    line(out, &format!("Game log saved to file: {}", transcript.display()))?;
    line(out, &format!("Player status saved to file: {}", status.display()))?;
    out.flush()
}
