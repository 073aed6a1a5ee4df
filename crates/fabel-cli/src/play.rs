use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use fabel_engine::{Game, GameServer, World};
use fabel_features::{Collaborators, DirectoryExchange, FileStore, Session, SessionConfig};
use fabel_pipeline::{Request, ResponseListener};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::client::{JsonLines, Terminal};

pub struct Options {
    pub data_dir: PathBuf,
    pub json: bool,
    pub autosave: bool,
    pub game_id: String,
    pub world: Option<PathBuf>,
}

fn load_world(path: Option<&Path>) -> Result<World, String> {
    let Some(path) = path else {
        return Ok(World::demo());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    World::from_json(&text).map_err(|e| format!("invalid world {}: {e}", path.display()))
}

pub async fn run(options: Options) -> Result<(), String> {
    let world = load_world(options.world.as_deref())?;
    let title = world.title.clone();

    let config = SessionConfig::default()
        .with_game_id(options.game_id.as_str())
        .with_autosave(options.autosave);
    let collaborators = Collaborators::new(
        Arc::new(FileStore::new(options.data_dir.join("store.json"))),
        Arc::new(DirectoryExchange::new(&options.data_dir)),
    );
    let server = Arc::new(GameServer::new(Game::new(world)));
    info!(data_dir = %options.data_dir.display(), json = options.json, "starting");

    if options.json {
        let session = Session::assemble(config, collaborators, Arc::new(JsonLines), server);
        session.start().await.map_err(|e| e.to_string())?;
        json_loop(&session).await?;
        finish(&session).await
    } else {
        let terminal = Arc::new(Terminal::new());
        let client: Arc<dyn ResponseListener> = terminal.clone();
        println!("  {} {title}", "Playing".bold());
        println!("  End a line with '?' for suggestions, type 'quit' to exit.\n");
        let session = Session::assemble(config, collaborators, client, server);
        session.start().await.map_err(|e| e.to_string())?;
        terminal_loop(&session, &terminal).await?;
        finish(&session).await
    }
}

/// Flush anything still held back by a pause.
async fn finish(session: &Session) -> Result<(), String> {
    if session.is_paused() {
        session.unpause().await.map_err(|e| e.to_string())?;
    }
    Ok(())
}

async fn json_loop(session: &Session) -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        if line.trim().is_empty() {
            continue;
        }
        let request = Request::from_json(&line).map_err(|e| e.to_string())?;
        session.send(request).await.map_err(|e| e.to_string())?;
    }
    Ok(())
}

enum Input {
    Quit,
    Words(Request),
    Command(Request),
}

fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
        return Some(Input::Quit);
    }

    let split = |text: &str| -> Vec<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    };
    match line.strip_suffix('?') {
        Some(partial) => Some(Input::Words(Request::GetWords {
            command: split(partial),
        })),
        None => Some(Input::Command(Request::Execute {
            command: split(line),
        })),
    }
}

async fn terminal_loop(session: &Session, terminal: &Terminal) -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? else {
            break;
        };
        let request = match parse_line(&line) {
            None => continue,
            Some(Input::Quit) => break,
            Some(Input::Words(request)) => {
                terminal.expect_words();
                request
            }
            Some(Input::Command(request)) => request,
        };
        if let Err(e) = session.send(request).await {
            println!("{}\n", e.to_string().yellow());
        }
    }
    Ok(())
}
