//! talespin - terminal text adventure narrated by a language model
//!
//! The turn loop (`game`) asks the narrative client for a scene, shows it as a
//! keyboard menu, sends the player's choice back, and folds the reply into the
//! session state. Transcript, final status and error artifacts go to disk.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod game;
pub mod input;
pub mod logging;
pub mod markup;
pub mod menu;
pub mod narrative;
pub mod prompt;
pub mod recorder;
pub mod scene;
pub mod spinner;
pub mod state;
