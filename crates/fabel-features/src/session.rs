//! A fully assembled play session.

use std::sync::Arc;

use fabel_pipeline::{
    ControlDirective, DuplexProxy, PauseFilter, PipelineResult, Request, RequestListener, Response,
    ResponseListener, SaveData, StateMachineFilter,
};
use tracing::{info, warn};

use crate::bookmark::{BookmarkList, BookmarkServices, GameLoader, ResetAndLoad, bookmark_manager};
use crate::config::SessionConfig;
use crate::exchange::FileExchange;
use crate::filters::{
    AutoSave, LogGate, StatusLine, StatusRecorder, UndoRedoFilter, WordInjector, restore_autosave,
};
use crate::machines::{
    ResetAndStart, RestartAction, colour_picker, dev_mode_toggle, restart_machine, ui_picker,
};
use crate::settings::{Settings, SettingsStore};
use crate::store::KeyValueStore;
use crate::watched::Watched;

/// Commands that open a feature dialog.
pub const TRIGGERS: [&str; 5] = ["restart", "colours", "ui", "devmode", "bookmarks"];

/// The outside world a session talks to.
pub struct Collaborators {
    /// Persistent storage for settings, bookmarks and the autosave.
    pub store: Arc<dyn KeyValueStore>,
    /// Where bookmarks are exported to and imported from.
    pub exchange: Arc<dyn FileExchange>,
    /// What a confirmed restart does.
    pub restart: Arc<dyn RestartAction>,
    /// How a bookmark is put back into the engine.
    pub loader: Arc<dyn GameLoader>,
}

impl Collaborators {
    /// Use the default restart and load behaviour.
    pub fn new(store: Arc<dyn KeyValueStore>, exchange: Arc<dyn FileExchange>) -> Self {
        Self {
            store,
            exchange,
            restart: Arc::new(ResetAndStart),
            loader: Arc::new(ResetAndLoad),
        }
    }

    /// Replace the restart behaviour.
    pub fn with_restart(mut self, restart: Arc<dyn RestartAction>) -> Self {
        self.restart = restart;
        self
    }

    /// Replace the bookmark loading behaviour.
    pub fn with_loader(mut self, loader: Arc<dyn GameLoader>) -> Self {
        self.loader = loader;
        self
    }
}

/// A client, an engine and every feature stage between them.
///
/// From the client side the stages are, in order: log gate, pause, status
/// recorder, feature machines, undo/redo, word injection and, when enabled,
/// autosave.
pub struct Session {
    config: SessionConfig,
    proxy: DuplexProxy,
    pause: PauseFilter,
    machines: Arc<StateMachineFilter>,
    settings: Arc<SettingsStore>,
    status: Arc<Watched<StatusLine>>,
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    /// Wire `client` to `server` through the feature stages.
    pub fn assemble(
        config: SessionConfig,
        collaborators: Collaborators,
        client: Arc<dyn ResponseListener>,
        server: Arc<dyn RequestListener>,
    ) -> Self {
        let Collaborators {
            store,
            exchange,
            restart,
            loader,
        } = collaborators;

        let settings = Arc::new(SettingsStore::new(Arc::clone(&store), config.settings_key()));
        let status = Arc::new(Watched::new());
        let snapshot: Arc<Watched<SaveData>> = Arc::new(Watched::new());

        let mut recorder = StatusRecorder::new(Arc::clone(&status), Arc::clone(&snapshot));
        if config.autosave {
            recorder = recorder.with_autosave(Arc::clone(&store), config.autosave_key());
        }

        let services = BookmarkServices::new(
            config.clone(),
            BookmarkList::new(Arc::clone(&store), config.bookmarks_key()),
            snapshot,
            Arc::clone(&status),
            loader,
            exchange,
        );
        let machines = Arc::new(
            StateMachineFilter::new()
                .with_machine("restart", restart_machine(restart))
                .with_machine("colours", colour_picker(Arc::clone(&settings)))
                .with_machine("ui", ui_picker(Arc::clone(&settings)))
                .with_machine("devmode", dev_mode_toggle(Arc::clone(&settings)))
                .with_machine("bookmarks", bookmark_manager(Arc::new(services))),
        );

        let mut injected = machines.triggers().to_vec();
        injected.push("inventory".to_string());

        let pause = PauseFilter::new();
        let mut proxy = DuplexProxy::new(client, server)
            .insert_proxy("log-gate", Arc::new(LogGate::new(Arc::clone(&settings))))
            .insert_proxy("pause", Arc::new(pause.clone()))
            .insert_proxy("status", Arc::new(recorder))
            .insert_proxy("machines", machines.clone())
            .insert_proxy("undo-redo", Arc::new(UndoRedoFilter::new()))
            .insert_proxy("words", Arc::new(WordInjector::new(injected)));
        if config.autosave {
            proxy = proxy.insert_proxy("autosave", Arc::new(AutoSave));
        }

        Self {
            config,
            proxy,
            pause,
            machines,
            settings,
            status,
            store,
        }
    }

    /// The configuration the session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The assembled chain.
    pub fn proxy(&self) -> &DuplexProxy {
        &self.proxy
    }

    /// Begin play.
    ///
    /// Applies the stored settings, resumes from the autosave when there is
    /// one (falling back to a fresh game if the engine rejects it), then asks
    /// for the first word list.
    pub async fn start(&self) -> PipelineResult<()> {
        self.proxy.respond(Response::Control {
            directive: ControlDirective::ApplySettings {
                settings: self.settings.load().to_value(),
            },
        })?;

        let saved = if self.config.autosave {
            restore_autosave(self.store.as_ref(), &self.config.autosave_key())
        } else {
            None
        };
        let resuming = saved.is_some();
        let before = self.status.version();

        info!(game = %self.config.game_id, resuming, "starting session");
        self.proxy.send(Request::Start { data: saved }).await?;
        if resuming && self.status.version() == before {
            warn!("autosave rejected, starting a new game");
            self.proxy.send(Request::Start { data: None }).await?;
        }

        self.proxy.send(Request::get_words(&[])).await
    }

    /// Send a request from the client edge.
    pub async fn send(&self, request: Request) -> PipelineResult<()> {
        self.proxy.send(request).await
    }

    /// Release output withheld by a pause.
    pub async fn unpause(&self) -> PipelineResult<()> {
        self.pause.unpause().await
    }

    /// Whether output is being withheld.
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Current settings.
    pub fn settings(&self) -> Settings {
        self.settings.load()
    }

    /// The last status line reported by the engine.
    pub fn status(&self) -> Option<StatusLine> {
        self.status.get()
    }

    /// Trigger of the dialog currently holding the conversation.
    pub async fn active_dialog(&self) -> Option<String> {
        self.machines.active_trigger().await
    }
}
