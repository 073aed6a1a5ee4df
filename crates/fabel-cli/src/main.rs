//! Command-line front end for Fabel.

mod client;
mod logging;
mod play;

use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fabel",
    about = "Fabel: interactive fiction played through a message pipeline",
    version
)]
struct Cli {
    /// Directory holding settings, bookmarks and the autosave
    #[arg(long, default_value = ".fabel")]
    data_dir: PathBuf,

    /// Exchange JSON lines on stdin/stdout instead of text
    #[arg(long)]
    json: bool,

    /// Do not save progress after every command
    #[arg(long)]
    no_autosave: bool,

    /// Keeps this game's stored data apart from other games
    #[arg(long, default_value = "fabel")]
    game_id: String,

    /// World description in JSON (default: the built-in demo)
    #[arg(long)]
    world: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    let options = play::Options {
        data_dir: cli.data_dir,
        json: cli.json,
        autosave: !cli.no_autosave,
        game_id: cli.game_id,
        world: cli.world,
    };

    if let Err(e) = play::run(options).await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
