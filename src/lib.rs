pub mod conversation;
pub mod engine;
pub mod heuristics;
pub mod models;
pub mod prompt;
pub mod sensing;
pub mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};

pub use engine::MomMode;
use sensing::InteractionEvent;
use settings::Settings;

const DEFAULT_SETTINGS_PATH: &str = "mom-mode.json";
/// Upper bound for `key <n>` so one line cannot stall the driver.
const MAX_KEYS_PER_COMMAND: usize = 200;

const ENABLE_LOGS: bool = true;

/// Commands the line driver understands. Stands in for the view layer.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Navigate(String),
    Interact(InteractionEvent, usize),
    Reply(String),
    Close,
    Minimize,
    Preference(Option<bool>),
    Show,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head {
        "nav" if !rest.is_empty() => Command::Navigate(rest.to_string()),
        "move" => Command::Interact(InteractionEvent::PointerMove, 1),
        "click" => Command::Interact(InteractionEvent::PointerDown, 1),
        "scroll" => Command::Interact(InteractionEvent::Scroll, 1),
        "touch" => Command::Interact(InteractionEvent::TouchStart, 1),
        "key" => Command::Interact(
            InteractionEvent::KeyPress,
            rest.parse::<usize>().unwrap_or(1).clamp(1, MAX_KEYS_PER_COMMAND),
        ),
        "reply" => Command::Reply(rest.to_string()),
        "close" => Command::Close,
        "minimize" => Command::Minimize,
        "pref" => match rest {
            "on" => Command::Preference(Some(true)),
            "off" => Command::Preference(Some(false)),
            "loading" => Command::Preference(None),
            _ => return None,
        },
        "show" => Command::Show,
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

async fn dispatch(mom: &Arc<MomMode>, command: Command) -> Result<bool> {
    match command {
        Command::Navigate(path) => mom.navigate(&path).await?,
        Command::Interact(event, times) => {
            for _ in 0..times {
                if !mom.record_interaction(event).await {
                    debug!("{event:?} dropped, monitoring is off");
                    break;
                }
            }
        }
        Command::Reply(text) => {
            let mom = Arc::clone(mom);
            tokio::spawn(async move {
                if let Err(err) = mom.submit_user_reply(&text).await {
                    debug!("reply not sent: {err}");
                }
            });
        }
        Command::Close => mom.close().await,
        Command::Minimize => {
            mom.toggle_minimize().await;
        }
        Command::Preference(enabled) => mom.set_preference(enabled).await?,
        Command::Show => println!("{}", serde_json::to_string_pretty(&mom.snapshot().await)?),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Load settings, start the engine on `/` and drive it from stdin until EOF or
/// `quit`. Every published snapshot is printed as one JSON line.
pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = Settings::load(&settings_path)?.with_env_overrides();

    let mom = Arc::new(
        MomMode::from_settings(&settings, "/").context("failed to build engine")?,
    );
    info!("Mom mode starting with '{}' scope", mom.scope().name);

    let mut snapshots = mom.subscribe();
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let line = serde_json::to_string(&*snapshots.borrow_and_update());
            match line {
                Ok(line) => println!("{line}"),
                Err(err) => log_error!("failed to serialize snapshot: {err}"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            eprintln!("unknown command: {}", line.trim());
            continue;
        };
        if !dispatch(&mom, command).await? {
            break;
        }
    }

    mom.shutdown().await?;
    printer.abort();
    info!("Mom mode stopped");
    Ok(())
}
