use std::sync::Arc;

use async_trait::async_trait;
use fabel_pipeline::{
    ControlDirective, MachineOps, PipelineResult, Request, State, StateMachine, Transition, Turn,
    handle_input,
};
use tracing::{info, warn};

use super::offer;
use crate::settings::{COLOUR_SCHEMES, Settings, SettingsStore, UI_SCHEMES};

/// A setting chosen from a fixed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// [`Settings::colour_scheme`].
    ColourScheme,
    /// [`Settings::ui_scheme`].
    UiScheme,
}

impl SettingKind {
    fn label(self) -> &'static str {
        match self {
            Self::ColourScheme => "colour scheme",
            Self::UiScheme => "UI scheme",
        }
    }

    /// The values the setting can take.
    pub fn choices(self) -> &'static [&'static str] {
        match self {
            Self::ColourScheme => &COLOUR_SCHEMES,
            Self::UiScheme => &UI_SCHEMES,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::ColourScheme => "Colour scheme",
            Self::UiScheme => "UI scheme",
        }
    }

    fn current(self, settings: &Settings) -> &str {
        match self {
            Self::ColourScheme => &settings.colour_scheme,
            Self::UiScheme => &settings.ui_scheme,
        }
    }

    fn set(self, settings: &mut Settings, value: String) {
        match self {
            Self::ColourScheme => settings.colour_scheme = value,
            Self::UiScheme => settings.ui_scheme = value,
        }
    }

    fn options(self) -> Vec<String> {
        self.choices()
            .iter()
            .chain(&["cancel"])
            .map(|choice| (*choice).to_string())
            .collect()
    }
}

struct Choose {
    kind: SettingKind,
    settings: Arc<SettingsStore>,
}

enum Choice {
    Pick(String),
    Cancel,
    Unknown(String),
    Words(Vec<String>),
    Other,
}

#[async_trait]
impl State<Turn<()>> for Choose {
    async fn on_enter(&self, ctx: &mut Turn<()>, _ops: &mut MachineOps) -> PipelineResult<()> {
        let settings = self.settings.load();
        ctx.out.print(format!(
            "Choose a {} (current: {}).",
            self.kind.label(),
            self.kind.current(&settings)
        ))?;
        ctx.out.words(Vec::new(), self.kind.options())
    }

    async fn on_action(&self, input: Request, ctx: &mut Turn<()>) -> PipelineResult<Transition> {
        let choices = self.kind.choices();
        let choice = handle_input(&input)
            .on_command(&["cancel"], || Choice::Cancel)
            .on_any_command(|command| match command {
                [word] if choices.contains(&word.as_str()) => Choice::Pick(word.clone()),
                _ => Choice::Unknown(command.join(" ")),
            })
            .on_get_words(|command| Choice::Words(command.to_vec()))
            .on_any(|_| Choice::Other);

        match choice {
            Choice::Pick(value) => {
                let kind = self.kind;
                match self.settings.update(|s| kind.set(s, value.clone())) {
                    Ok(settings) => {
                        info!(setting = kind.label(), value = %value, "setting changed");
                        ctx.out.control(ControlDirective::ApplySettings {
                            settings: settings.to_value(),
                        })?;
                        ctx.out.print(format!("{} set to {value}.", kind.title()))?;
                    }
                    Err(e) => {
                        warn!(error = %e, "could not save settings");
                        ctx.out.warn(format!("Could not save settings: {e}"))?;
                    }
                }
                Ok(Transition::Finish)
            }
            Choice::Cancel => Ok(Transition::Finish),
            Choice::Unknown(typed) => {
                ctx.out.warn(format!("Unknown {}: {typed}", self.kind.label()))?;
                ctx.out.words(Vec::new(), self.kind.options())?;
                Ok(Transition::Stay)
            }
            Choice::Words(command) => {
                offer(&ctx.out, &command, &self.kind.options())?;
                Ok(Transition::Stay)
            }
            Choice::Other => Ok(Transition::Stay),
        }
    }
}

fn picker(kind: SettingKind, settings: Arc<SettingsStore>) -> StateMachine<Turn<()>> {
    StateMachine::new("choose").with_state("choose", Choose { kind, settings })
}

/// Lets the player pick a colour scheme.
pub fn colour_picker(settings: Arc<SettingsStore>) -> StateMachine<Turn<()>> {
    picker(SettingKind::ColourScheme, settings)
}

/// Lets the player pick a UI scheme.
pub fn ui_picker(settings: Arc<SettingsStore>) -> StateMachine<Turn<()>> {
    picker(SettingKind::UiScheme, settings)
}

#[cfg(test)]
mod tests {
    use fabel_pipeline::message::words;
    use fabel_pipeline::{LogLevel, Response};

    use super::*;
    use crate::machines::testing::host;
    use crate::store::MemoryStore;

    fn settings() -> Arc<SettingsStore> {
        Arc::new(SettingsStore::new(Arc::new(MemoryStore::new()), "settings"))
    }

    #[tokio::test]
    async fn picking_a_colour_applies_and_persists() {
        let settings = settings();
        let (proxy, _, log) = host("colours", colour_picker(Arc::clone(&settings)));

        proxy.send(Request::execute(&["colours"])).await.unwrap();
        assert_eq!(log.printed(), vec!["Choose a colour scheme (current: default)."]);
        assert_eq!(
            log.last_words(),
            Some(words(&["default", "dark", "light", "sepia", "cancel"]))
        );
        log.take();

        proxy.send(Request::execute(&["sepia"])).await.unwrap();
        assert_eq!(settings.load().colour_scheme, "sepia");

        let responses = log.take();
        assert!(matches!(
            &responses[0],
            Response::Control {
                directive: ControlDirective::ApplySettings { settings }
            } if settings["colourScheme"] == "sepia"
        ));
        assert_eq!(responses[1], Response::print("Colour scheme set to sepia."));
    }

    #[tokio::test]
    async fn unknown_choice_warns_and_stays() {
        let settings = settings();
        let (proxy, engine, log) = host("ui", ui_picker(Arc::clone(&settings)));

        proxy.send(Request::execute(&["ui"])).await.unwrap();
        log.take();
        proxy.send(Request::execute(&["fancy"])).await.unwrap();
        assert!(matches!(
            &log.take()[0],
            Response::Log { level: LogLevel::Warn, message } if message == "Unknown UI scheme: fancy"
        ));

        proxy.send(Request::execute(&["cancel"])).await.unwrap();
        assert_eq!(settings.load().ui_scheme, "classic");
        assert!(engine.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deeper_word_requests_get_nothing() {
        let (proxy, _, log) = host("ui", ui_picker(settings()));
        proxy.send(Request::execute(&["ui"])).await.unwrap();
        proxy.send(Request::get_words(&["compact"])).await.unwrap();
        assert_eq!(log.last_words(), Some(Vec::new()));
    }
}
