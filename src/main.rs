//! talespin - terminal text adventure narrated by a language model
//!
//! USAGE:
//!   talespin [play] [--game-data PATH] [--model ID]
//!   talespin doctor                   # check config, key, game data, network
//!   talespin config set key <value>   # non-interactive config

use anyhow::{Context, Result};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use talespin::client::{self, OpenRouter};
use talespin::config::{self, Config, Settings};
use talespin::game::Game;
use talespin::input::{key_name, TerminalInput};
use talespin::logging;
use talespin::recorder::SessionRecorder;
use talespin::state::{GameData, SessionState};

// ═══════════════════════════════════════════════════════════════
// CLI
// ═══════════════════════════════════════════════════════════════

#[derive(Debug)]
enum Command {
    Play {
        game_data: Option<PathBuf>,
        model: Option<String>,
    },
    Doctor,
    ConfigSet {
        key: String,
        value: String,
    },
    Help,
}

fn parse_args() -> Command {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Command::Help;
    }

    if args.first().map(|s| s.as_str()) == Some("doctor") {
        return Command::Doctor;
    }

    if args.first().map(|s| s.as_str()) == Some("config") {
        if args.get(1).map(|s| s.as_str()) == Some("set") {
            return Command::ConfigSet {
                key: args.get(2).cloned().unwrap_or_default(),
                value: args.get(3).cloned().unwrap_or_default(),
            };
        }
        return Command::Help;
    }

    // Parse flags
    let mut game_data = None;
    let mut model = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--game-data" | "-g" => {
                i += 1;
                game_data = args.get(i).map(PathBuf::from);
            }
            "--model" | "-m" => {
                i += 1;
                model = args.get(i).cloned();
            }
            _ => {}
        }
        i += 1;
    }

    Command::Play { game_data, model }
}

fn print_help() {
    println!(r#"talespin - terminal text adventure narrated by a language model

USAGE:
    talespin [play] [--game-data PATH] [--model ID]
    talespin doctor                   # check config, key, game data, network
    talespin config set <key> <value> # keys: key, model, base_url

FLAGS:
    -g, --game-data <path>  Initial game data (default: game_data.json)
    -m, --model <id>        Model ID (default: openai/gpt-4o-mini)
    -h, --help              Show this help

ENVIRONMENT (.env is read too):
    OPENAI_API_KEY          API key (OPENROUTER_API_KEY also accepted)
    BASE_URL                OpenAI-compatible endpoint (default: OpenRouter)
    MODEL_NAME              Model ID
    CUSTOM_INPUT_KEY        Key code for free-text entry (default: 9, Tab)
    GAME_DATA_FILE          Initial game data path
    LOGS_DIR                Transcript/status/error directory (default: logs)
    DEBUG                   'true' logs raw model replies

CONTROLS:
    Up/Down   Move selection
    Enter     Choose option
    Tab       Type your own option
    Ctrl-C    Quit (progress is saved)
"#);
}

// ═══════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> ExitCode {
    let result = match parse_args() {
        Command::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        Command::Doctor => run_doctor().await.map(|_| ExitCode::SUCCESS),
        Command::ConfigSet { key, value } => run_config_set(&key, &value).map(|_| ExitCode::SUCCESS),
        Command::Play { game_data, model } => run_play(game_data, model).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════

async fn run_play(game_data: Option<PathBuf>, model: Option<String>) -> Result<ExitCode> {
    let mut settings = Settings::resolve()?;
    if let Some(path) = game_data {
        settings.game_data_file = path;
    }
    if let Some(model) = model {
        settings.model = model;
    }

    let log_path = logging::init(&settings.logs_dir, settings.debug)?;
    let api_key = settings.require_api_key()?.to_string();
    let data = GameData::load(&settings.game_data_file)?;
    let recorder = SessionRecorder::create(&settings.logs_dir)?;

    tracing::info!(
        model = %settings.model,
        game_data = %settings.game_data_file.display(),
        transcript = %recorder.transcript_path().display(),
        "session starting"
    );

    let generator = OpenRouter::new(&api_key, &settings.base_url, &settings.model);
    let input = TerminalInput::new(settings.custom_input_key)?;
    let mut game = Game::new(
        generator,
        input,
        io::stdout(),
        recorder,
        SessionState::new(data),
        settings.custom_input_key,
    );

    let outcome = game.run().await;
    // restores cooked mode before anything else is printed
    drop(game);

    match outcome {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("\nError: {}", e);
            eprintln!("Details were saved under {} (diagnostics: {})", settings.logs_dir.display(), log_path.display());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_doctor() -> Result<()> {
    println!("talespin doctor\n");

    let settings = Settings::resolve()?;

    let cfg_path = config::config_path()?;
    println!("[{}] Config: {}",
        if cfg_path.exists() { "✓" } else { "-" },
        cfg_path.display()
    );

    let has_key = settings.api_key.is_some();
    println!("[{}] API key: {}",
        if has_key { "✓" } else { "✗" },
        if has_key { "configured" } else { "missing" }
    );

    println!("[✓] Model: {}", settings.model);
    println!("[✓] Free-text key: {}", key_name(settings.custom_input_key));

    match GameData::load(&settings.game_data_file) {
        Ok(data) => println!("[✓] Game data: {} (starts at '{}')",
            settings.game_data_file.display(), data.current_scene),
        Err(e) => println!("[✗] Game data: {:#}", e),
    }

    print!("[?] Network: checking...");
    match client::check_connectivity(&settings.base_url).await {
        Ok(()) => println!("\r[✓] Network: {}         ", settings.base_url),
        Err(e) => println!("\r[✗] Network: {:#}", e),
    }

    Ok(())
}

fn run_config_set(key: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        anyhow::bail!("Usage: talespin config set <key|model|base_url> <value>");
    }
    let mut cfg = Config::load()?;
    cfg.set(key, value)?;
    cfg.save()?;
    let path = config::config_path().context("Config path unavailable")?;
    println!("Saved {} to {}", key, path.display());
    Ok(())
}
