//! Client edges: coloured text for people, JSON lines for programs.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use colored::{ColoredString, Colorize};
use fabel_features::Settings;
use fabel_pipeline::{
    ControlDirective, LogLevel, PipelineError, PipelineResult, Response, ResponseListener,
};
use tracing::warn;

fn client_error(e: io::Error) -> PipelineError {
    PipelineError::Client(e.to_string())
}

#[derive(Debug, Default)]
struct Look {
    colour_scheme: String,
    compact: bool,
    title: Option<String>,
}

impl Look {
    fn paint(&self, text: &str) -> ColoredString {
        match self.colour_scheme.as_str() {
            "dark" => text.bright_white(),
            "light" => text.black(),
            "sepia" => text.yellow(),
            _ => text.normal(),
        }
    }
}

/// Renders responses as text on stdout.
///
/// Word lists are shown only when the player asked for them; everything
/// else is printed as it arrives.
#[derive(Debug, Default)]
pub struct Terminal {
    look: Mutex<Look>,
    wants_words: AtomicBool,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the next word list that arrives.
    pub fn expect_words(&self) {
        self.wants_words.store(true, Ordering::SeqCst);
    }

    fn render(&self, out: &mut impl Write, response: Response) -> io::Result<()> {
        let mut look = self.look.lock().unwrap_or_else(PoisonError::into_inner);
        match response {
            Response::Print { text } => {
                writeln!(out, "{}", look.paint(&text))?;
                if !look.compact {
                    writeln!(out)?;
                }
            }
            Response::Words { command, words } => {
                if self.wants_words.swap(false, Ordering::SeqCst) {
                    let shown = if words.is_empty() {
                        format!("nothing follows \"{}\"", command.join(" "))
                    } else {
                        words.join(", ")
                    };
                    writeln!(out, "{}", shown.dimmed())?;
                }
            }
            Response::Status { title, .. } => {
                if !look.compact && look.title.as_deref() != Some(title.as_str()) {
                    writeln!(out, "{}", format!("[{title}]").bold())?;
                }
                look.title = Some(title);
            }
            Response::SaveState { data } => writeln!(out, "{data}")?,
            Response::Log { level, message } => {
                let line = match level {
                    LogLevel::Debug => format!("[debug] {message}").dimmed(),
                    LogLevel::Info => format!("[info] {message}").dimmed(),
                    LogLevel::Warn => message.yellow(),
                    LogLevel::Error => message.red().bold(),
                };
                writeln!(out, "{line}")?;
            }
            Response::Control { directive } => match directive {
                ControlDirective::Pause { .. } => writeln!(out, "{}", "...".dimmed())?,
                ControlDirective::Alert { text } => writeln!(out, "{}", text.bold())?,
                ControlDirective::ApplySettings { settings } => {
                    match serde_json::from_value::<Settings>(settings) {
                        Ok(settings) => {
                            look.colour_scheme = settings.colour_scheme;
                            look.compact = settings.ui_scheme == "compact";
                        }
                        Err(e) => warn!(error = %e, "ignoring malformed settings"),
                    }
                }
            },
        }
        out.flush()
    }
}

impl ResponseListener for Terminal {
    fn on_response(&self, response: Response) -> PipelineResult<()> {
        self.render(&mut io::stdout().lock(), response)
            .map_err(client_error)
    }
}

/// Writes every response as one line of JSON on stdout.
#[derive(Debug, Default)]
pub struct JsonLines;

impl ResponseListener for JsonLines {
    fn on_response(&self, response: Response) -> PipelineResult<()> {
        let line = response.to_json()?;
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(client_error)
    }
}
