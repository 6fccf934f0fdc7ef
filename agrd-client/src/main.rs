//! agrd-client - Terminal front end for Achievagrad
//!
//! Every plain line typed replaces the search input, as if typed into a search
//! box. Commands start with `/`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use agrd_client::view::{game_card, render_snapshot};
use agrd_client::{Dispatcher, HttpSearchBackend, SelectionStore, StorageSlot};
use agrd_common::config::RootFolderResolver;

/// Command-line arguments for agrd-client
#[derive(Parser, Debug)]
#[command(name = "agrd-client")]
#[command(about = "Search the game catalog and keep a backlog")]
#[command(version)]
struct Args {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long, env = "AGRD_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of agrd-proxy
    #[arg(long, env = "AGRD_SERVER_URL")]
    server_url: Option<String>,

    /// Folder holding the backlog file
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Quiet window before a search is sent, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Backlog slot name
    #[arg(long)]
    slot: Option<String>,
}

const HELP: &str = "\
Type to search. Commands:
  /add N     add result N to the backlog
  /rm ID     remove game ID from the backlog
  /list      show the backlog
  /dismiss   hide the results
  /help      show this message
  /quit      exit";

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Input(String),
    Add(usize),
    Remove(u64),
    List,
    Dismiss,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let Some(rest) = line.trim().strip_prefix('/') else {
        return Command::Input(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("add"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Add(n - 1),
            _ => Command::Unknown(line.to_string()),
        },
        (Some("rm"), Some(id)) => match id.parse() {
            Ok(id) => Command::Remove(id),
            Err(_) => Command::Unknown(line.to_string()),
        },
        (Some("list"), None) => Command::List,
        (Some("dismiss"), None) => Command::Dismiss,
        (Some("help"), None) => Command::Help,
        (Some("quit"), None) | (Some("exit"), None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

fn print_backlog(store: &SelectionStore) {
    if store.is_empty() {
        println!("Backlog is empty");
        return;
    }
    println!("Backlog ({} games):", store.len());
    for game in store.all() {
        println!("{}", game_card(game));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = agrd_common::config::load_toml_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    agrd_common::logging::init(&toml_config.logging).context("Failed to initialize logging")?;

    info!("Starting Achievagrad client v{}", env!("CARGO_PKG_VERSION"));

    let client = &toml_config.client;
    let server_url = args.server_url.unwrap_or_else(|| client.server_url.clone());
    let quiet_window = Duration::from_millis(args.debounce_ms.unwrap_or(client.debounce_ms));
    let slot_name = args.slot.unwrap_or_else(|| client.slot_name.clone());
    let root_folder = RootFolderResolver::new(args.root_folder, Some(&toml_config)).resolve();

    info!("Search server: {}", server_url);
    info!("Backlog: {}", root_folder.join(format!("{}.json", slot_name)).display());

    let backend =
        HttpSearchBackend::new(&server_url).context("Failed to create search backend")?;
    let dispatcher = Dispatcher::with_quiet_window(Arc::new(backend), quiet_window);
    let mut store = SelectionStore::open(StorageSlot::new(&root_folder, &slot_name));
    let mut view_rx = dispatcher.subscribe();

    println!("{}", HELP);
    print_backlog(&store);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Command::Input(text) => dispatcher.set_input(text),
                    Command::Add(index) => match dispatcher.pick(index, &mut store) {
                        Ok(Some(game)) => println!("Added {}", game.name),
                        Ok(None) => println!("No result #{}", index + 1),
                        Err(e) => warn!("Backlog not saved: {}", e),
                    },
                    Command::Remove(id) => match store.remove(id) {
                        Ok(true) => println!("Removed {}", id),
                        Ok(false) => println!("{} is not in the backlog", id),
                        Err(e) => warn!("Backlog not saved: {}", e),
                    },
                    Command::List => print_backlog(&store),
                    Command::Dismiss => dispatcher.dismiss(),
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                    Command::Unknown(raw) => println!("Unknown command: {} (try /help)", raw.trim()),
                }
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view_rx.borrow_and_update().clone();
                for line in render_snapshot(&snapshot, &store) {
                    println!("{}", line);
                }
            }
        }
    }

    info!("Client exiting");
    Ok(())
}
