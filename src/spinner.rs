//! "Please wait" spinner for outstanding generator calls
//!
//! Runs on its own thread and owns its writer. `stop` raises the flag and joins,
//! so nothing else writes to the terminal until the status line is cleared.

use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub fn spinner_char(tick: usize) -> char {
    FRAMES[tick % FRAMES.len()]
}

pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning on stdout
    pub fn start(label: &str) -> Self {
        Self::start_with(io::stdout(), label)
    }

    pub fn start_with<W: Write + Send + 'static>(mut out: W, label: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let label = label.to_string();

        let handle = thread::spawn(move || {
            let mut tick = 0;
            while flag.load(Ordering::SeqCst) {
                let _ = write!(out, "\r{} {}", label, spinner_char(tick));
                let _ = out.flush();
                tick += 1;
                thread::sleep(FRAME_INTERVAL);
            }
            let _ = queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine));
            let _ = out.flush();
        });

        Self { running, handle: Some(handle) }
    }

    /// Signal the thread and wait until the line is cleared
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.halt();
    }
}
