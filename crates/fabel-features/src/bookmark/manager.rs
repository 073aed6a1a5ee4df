use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fabel_pipeline::message::words;
use fabel_pipeline::{
    MachineOps, MachineStatus, PipelineResult, Request, Responder, SaveData, State, StateMachine,
    Transition, Turn, handle_input,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::list::{Bookmark, BookmarkList};
use crate::codec::{compress, decompress};
use crate::config::SessionConfig;
use crate::error::{FeatureError, FeatureResult};
use crate::exchange::FileExchange;
use crate::filters::StatusLine;
use crate::machines::offer;
use crate::watched::Watched;

const PROMPT: &str = "prompt";
const SELECTED: &str = "bookmark-selected";

/// Puts a snapshot back into the engine.
#[async_trait]
pub trait GameLoader: Send + Sync {
    /// Replace the running game with `data`, talking through `out`.
    async fn load(&self, data: SaveData, out: &Responder) -> PipelineResult<()>;
}

/// Resets the engine, then starts it from the snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetAndLoad;

#[async_trait]
impl GameLoader for ResetAndLoad {
    async fn load(&self, data: SaveData, out: &Responder) -> PipelineResult<()> {
        out.send(Request::Reset).await?;
        out.send(Request::Start { data: Some(data) }).await
    }
}

/// The file format of an exported bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBookmark {
    /// Game the bookmark belongs to.
    pub game_id: String,
    /// Bookmark name.
    pub name: String,
    /// Compressed snapshot.
    pub data: String,
}

/// Everything the bookmark manager works with.
pub struct BookmarkServices {
    config: SessionConfig,
    list: BookmarkList,
    snapshot: Arc<Watched<SaveData>>,
    status: Arc<Watched<StatusLine>>,
    loader: Arc<dyn GameLoader>,
    exchange: Arc<dyn FileExchange>,
}

impl BookmarkServices {
    /// Bundle the collaborators.
    ///
    /// `snapshot` and `status` must be fed by a stage between this machine
    /// and the client, such as a [`crate::filters::StatusRecorder`].
    pub fn new(
        config: SessionConfig,
        list: BookmarkList,
        snapshot: Arc<Watched<SaveData>>,
        status: Arc<Watched<StatusLine>>,
        loader: Arc<dyn GameLoader>,
        exchange: Arc<dyn FileExchange>,
    ) -> Self {
        Self {
            config,
            list,
            snapshot,
            status,
            loader,
            exchange,
        }
    }

    /// The bookmark list.
    pub fn list(&self) -> &BookmarkList {
        &self.list
    }

    /// Ask the engine for a snapshot and store it as a new bookmark.
    pub async fn capture(&self, out: &Responder) -> FeatureResult<Bookmark> {
        let seen = self.snapshot.version();
        out.send(Request::Save { compress: true }).await?;
        let data = self
            .snapshot
            .changed_since(seen, self.config.capture_timeout, self.config.capture_poll)
            .await
            .ok_or(FeatureError::Timeout("the engine snapshot"))?;

        let title = self
            .status
            .get()
            .map(|status| status.title)
            .unwrap_or_else(|| self.config.game_id.clone());
        let bookmark = Bookmark {
            name: format!("{title} - {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
            data: compress(&serde_json::to_string(&data)?)?,
        };
        self.list.add(bookmark.clone())?;
        info!(name = %bookmark.name, "bookmark captured");
        Ok(bookmark)
    }

    /// Restore the bookmark at `index` into the engine.
    pub async fn load(&self, index: usize, out: &Responder) -> FeatureResult<Bookmark> {
        let bookmark = self.list.get(index)?;
        let data: SaveData = serde_json::from_str(&decompress(&bookmark.data)?)?;
        self.loader.load(data, out).await?;
        info!(name = %bookmark.name, "bookmark loaded");
        Ok(bookmark)
    }

    /// Remove the bookmark at `index`.
    pub fn delete(&self, index: usize) -> FeatureResult<Bookmark> {
        let bookmark = self.list.remove(index)?;
        info!(name = %bookmark.name, "bookmark deleted");
        Ok(bookmark)
    }

    /// Hand the bookmark at `index` to the player as a file.
    pub fn export(&self, index: usize) -> FeatureResult<Bookmark> {
        let bookmark = self.list.get(index)?;
        let file = ExportedBookmark {
            game_id: self.config.game_id.clone(),
            name: bookmark.name.clone(),
            data: bookmark.data.clone(),
        };
        self.exchange
            .download_text_file(&bookmark.name, &serde_json::to_string_pretty(&file)?)?;
        Ok(bookmark)
    }

    /// Ask the player for an exported bookmark and add it to the list.
    pub fn import(&self) -> FeatureResult<Bookmark> {
        let text = self
            .exchange
            .prompt_for_text_file()?
            .ok_or(FeatureError::NoFile)?;
        let file: ExportedBookmark = serde_json::from_str(&text)?;
        if file.game_id != self.config.game_id {
            return Err(FeatureError::WrongGame {
                expected: self.config.game_id.clone(),
                found: file.game_id,
            });
        }
        // refuse data that would only fail later, on load
        let snapshot = decompress(&file.data)?;
        serde_json::from_str::<SaveData>(&snapshot)?;

        let bookmark = Bookmark {
            name: file.name,
            data: file.data,
        };
        self.list.add(bookmark.clone())?;
        info!(name = %bookmark.name, "bookmark imported");
        Ok(bookmark)
    }
}

/// Per-run data of the bookmark manager.
#[derive(Debug, Default)]
pub struct Selection {
    index: Option<usize>,
}

impl Selection {
    /// Index of the selected bookmark.
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

/// Print the outcome of a bookmark operation. Feature failures become
/// warnings; pipeline failures propagate.
fn report(out: &Responder, result: FeatureResult<Bookmark>, done: &str) -> PipelineResult<()> {
    match result {
        Ok(bookmark) => out.print(format!("{done}: {}.", bookmark.name)),
        Err(FeatureError::Pipeline(e)) => Err(e),
        Err(e) => {
            warn!(error = %e, "bookmark operation failed");
            out.warn(e.to_string())
        }
    }
}

fn prompt_options(count: usize) -> Vec<String> {
    let mut options = words(&["new", "import", "cancel"]);
    if count > 0 {
        options.push("select".to_string());
    }
    options
}

fn selected_options() -> Vec<String> {
    words(&["load", "delete", "export", "cancel"])
}

struct Prompt {
    services: Arc<BookmarkServices>,
}

enum PromptChoice {
    New,
    Import,
    Cancel,
    Select(String),
    Words(Vec<String>),
    Unknown(String),
    Other,
}

impl Prompt {
    fn offer_words(&self, out: &Responder, command: &[String]) -> PipelineResult<()> {
        let count = self.services.list.len().unwrap_or(0);
        match command {
            [verb] if verb == "select" => {
                out.words(command.to_vec(), (1..=count).map(|n| n.to_string()).collect())
            }
            _ => offer(out, command, &prompt_options(count)),
        }
    }

    fn select(&self, typed: &str, ctx: &mut Turn<Selection>) -> PipelineResult<Transition> {
        let count = match self.services.list.len() {
            Ok(count) => count,
            Err(e) => {
                ctx.out.warn(e.to_string())?;
                return Ok(Transition::Finish);
            }
        };
        match typed.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => {
                ctx.data.index = Some(n - 1);
                Ok(Transition::goto(SELECTED))
            }
            _ => {
                ctx.out.warn(FeatureError::InvalidBookmark.to_string())?;
                Ok(Transition::Finish)
            }
        }
    }
}

#[async_trait]
impl State<Turn<Selection>> for Prompt {
    async fn on_enter(&self, ctx: &mut Turn<Selection>, ops: &mut MachineOps) -> PipelineResult<()> {
        ctx.data = Selection::default();
        let bookmarks = match self.services.list.load() {
            Ok(bookmarks) => bookmarks,
            Err(e) => {
                warn!(error = %e, "bookmark list unreadable");
                ops.set_status(MachineStatus::Finished);
                return ctx.out.warn(e.to_string());
            }
        };

        if bookmarks.is_empty() {
            ctx.out.print("You have no bookmarks.")?;
        } else {
            let lines: Vec<String> = bookmarks
                .iter()
                .enumerate()
                .map(|(i, b)| format!("{}. {}", i + 1, b.name))
                .collect();
            ctx.out.print(format!("Bookmarks:\n{}", lines.join("\n")))?;
        }
        ctx.out.print(if bookmarks.is_empty() {
            "Choose new, import, or cancel."
        } else {
            "Choose new, import, select <number>, or cancel."
        })?;
        ctx.out.words(Vec::new(), prompt_options(bookmarks.len()))
    }

    async fn on_action(&self, input: Request, ctx: &mut Turn<Selection>) -> PipelineResult<Transition> {
        let choice = handle_input(&input)
            .on_command(&["new"], || PromptChoice::New)
            .on_command(&["import"], || PromptChoice::Import)
            .on_command(&["cancel"], || PromptChoice::Cancel)
            .on_any_command(|command| match command {
                [verb, n] if verb == "select" => PromptChoice::Select(n.clone()),
                [n] if n.parse::<usize>().is_ok() => PromptChoice::Select(n.clone()),
                _ => PromptChoice::Unknown(command.join(" ")),
            })
            .on_get_words(|command| PromptChoice::Words(command.to_vec()))
            .on_any(|_| PromptChoice::Other);

        match choice {
            PromptChoice::New => {
                let result = self.services.capture(&ctx.out).await;
                report(&ctx.out, result, "Bookmark saved")?;
                Ok(Transition::Finish)
            }
            PromptChoice::Import => {
                report(&ctx.out, self.services.import(), "Bookmark imported")?;
                Ok(Transition::Finish)
            }
            PromptChoice::Cancel => Ok(Transition::Finish),
            PromptChoice::Select(typed) => self.select(&typed, ctx),
            PromptChoice::Words(command) => {
                self.offer_words(&ctx.out, &command)?;
                Ok(Transition::Stay)
            }
            PromptChoice::Unknown(typed) => {
                ctx.out.warn(format!("Unknown option: {typed}"))?;
                self.offer_words(&ctx.out, &[])?;
                Ok(Transition::Stay)
            }
            PromptChoice::Other => Ok(Transition::Stay),
        }
    }
}

struct Selected {
    services: Arc<BookmarkServices>,
}

enum SelectedChoice {
    Load,
    Delete,
    Export,
    Cancel,
    Words(Vec<String>),
    Unknown(String),
    Other,
}

#[async_trait]
impl State<Turn<Selection>> for Selected {
    async fn on_enter(&self, ctx: &mut Turn<Selection>, ops: &mut MachineOps) -> PipelineResult<()> {
        let selected = ctx.data.index.map(|index| self.services.list.get(index));
        match selected {
            Some(Ok(bookmark)) => {
                ctx.out.print(format!(
                    "Selected \"{}\". Choose load, delete, export, or cancel.",
                    bookmark.name
                ))?;
                ctx.out.words(Vec::new(), selected_options())
            }
            _ => {
                ops.set_status(MachineStatus::Finished);
                ctx.out.warn(FeatureError::InvalidBookmark.to_string())
            }
        }
    }

    async fn on_action(&self, input: Request, ctx: &mut Turn<Selection>) -> PipelineResult<Transition> {
        let choice = handle_input(&input)
            .on_command(&["load"], || SelectedChoice::Load)
            .on_command(&["delete"], || SelectedChoice::Delete)
            .on_command(&["export"], || SelectedChoice::Export)
            .on_command(&["cancel"], || SelectedChoice::Cancel)
            .on_any_command(|command| SelectedChoice::Unknown(command.join(" ")))
            .on_get_words(|command| SelectedChoice::Words(command.to_vec()))
            .on_any(|_| SelectedChoice::Other);

        let index = ctx.data.index.unwrap_or(usize::MAX);
        match choice {
            SelectedChoice::Load => {
                let result = self.services.load(index, &ctx.out).await;
                report(&ctx.out, result, "Bookmark loaded")?;
                Ok(Transition::Finish)
            }
            SelectedChoice::Delete => {
                report(&ctx.out, self.services.delete(index), "Bookmark deleted")?;
                Ok(Transition::Finish)
            }
            SelectedChoice::Export => {
                report(&ctx.out, self.services.export(index), "Bookmark exported")?;
                Ok(Transition::Finish)
            }
            SelectedChoice::Cancel => Ok(Transition::Finish),
            SelectedChoice::Words(command) => {
                offer(&ctx.out, &command, &selected_options())?;
                Ok(Transition::Stay)
            }
            SelectedChoice::Unknown(typed) => {
                ctx.out.warn(format!("Unknown option: {typed}"))?;
                ctx.out.words(Vec::new(), selected_options())?;
                Ok(Transition::Stay)
            }
            SelectedChoice::Other => Ok(Transition::Stay),
        }
    }
}

/// The bookmark dialog: list, create, select, load, delete, export and
/// import bookmarks.
pub fn bookmark_manager(services: Arc<BookmarkServices>) -> StateMachine<Turn<Selection>> {
    StateMachine::new(PROMPT)
        .with_state(
            PROMPT,
            Prompt {
                services: Arc::clone(&services),
            },
        )
        .with_state(SELECTED, Selected { services })
}
