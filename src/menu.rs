//! Option cursor for the scene menu

use crate::input::UiEvent;

/// What the turn loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuStep {
    /// Cursor may have moved; redraw and keep polling
    Redraw,
    /// The highlighted option was chosen
    Chosen(usize),
    /// Read a free-text line instead
    CaptureText,
    Interrupted,
}

/// Selection cursor clamped to `[0, len - 1]`
#[derive(Debug, Clone)]
pub struct Menu {
    selected: usize,
    len: usize,
}

impl Menu {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn handle(&mut self, event: UiEvent) -> MenuStep {
        match event {
            UiEvent::Up => {
                self.selected = self.selected.saturating_sub(1);
                MenuStep::Redraw
            }
            UiEvent::Down => {
                self.selected = (self.selected + 1).min(self.len.saturating_sub(1));
                MenuStep::Redraw
            }
            UiEvent::Select if self.len > 0 => MenuStep::Chosen(self.selected),
            UiEvent::Select => MenuStep::Redraw,
            UiEvent::RequestCustomInput => MenuStep::CaptureText,
            UiEvent::Interrupt => MenuStep::Interrupted,
        }
    }
}
