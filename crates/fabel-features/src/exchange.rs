//! Moving text files in and out of a session.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::FeatureResult;

/// Hands files to the player and asks the player for files.
pub trait FileExchange: Send + Sync {
    /// Offer `text` to the player as a file called `name`.
    fn download_text_file(&self, name: &str, text: &str) -> FeatureResult<()>;

    /// Ask the player for a text file. `None` if nothing was provided.
    fn prompt_for_text_file(&self) -> FeatureResult<Option<String>>;
}

/// File exchange through two directories.
///
/// Downloads are written to `<root>/exports`; the newest `.json` file in
/// `<root>/imports` is what an import picks up.
#[derive(Debug, Clone)]
pub struct DirectoryExchange {
    exports: PathBuf,
    imports: PathBuf,
}

impl DirectoryExchange {
    /// Exchange files below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            exports: root.join("exports"),
            imports: root.join("imports"),
        }
    }

    /// Where downloads land.
    pub fn exports(&self) -> &Path {
        &self.exports
    }

    /// Where imports are read from.
    pub fn imports(&self) -> &Path {
        &self.imports
    }
}

/// Turn a display name into something safe to use as a file stem.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "bookmark".to_string()
    } else {
        stem.to_string()
    }
}

impl FileExchange for DirectoryExchange {
    fn download_text_file(&self, name: &str, text: &str) -> FeatureResult<()> {
        fs::create_dir_all(&self.exports)?;
        let path = self.exports.join(format!("{}.json", file_stem(name)));
        fs::write(&path, text)?;
        info!(path = %path.display(), "exported file");
        Ok(())
    }

    fn prompt_for_text_file(&self) -> FeatureResult<Option<String>> {
        if !self.imports.is_dir() {
            return Ok(None);
        }
        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&self.imports)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let modified = fs::metadata(&path)?.modified()?;
            if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
                newest = Some((modified, path));
            }
        }

        match newest {
            Some((_, path)) => {
                debug!(path = %path.display(), "importing file");
                Ok(Some(fs::read_to_string(path)?))
            }
            None => Ok(None),
        }
    }
}

/// In-memory exchange for tests and headless clients.
#[derive(Debug, Default)]
pub struct MemoryExchange {
    downloads: Mutex<Vec<(String, String)>>,
    offered: Mutex<VecDeque<String>>,
}

impl MemoryExchange {
    /// Create an exchange with nothing offered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a file for the next import.
    pub fn offer(&self, text: impl Into<String>) {
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(text.into());
    }

    /// Every `(name, text)` downloaded so far.
    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FileExchange for MemoryExchange {
    fn download_text_file(&self, name: &str, text: &str) -> FeatureResult<()> {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), text.to_string()));
        Ok(())
    }

    fn prompt_for_text_file(&self) -> FeatureResult<Option<String>> {
        Ok(self
            .offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_safe() {
        assert_eq!(file_stem("Cave - 2024-01-01 10:00"), "Cave---2024-01-01-10-00");
        assert_eq!(file_stem("../../etc"), "etc");
        assert_eq!(file_stem("///"), "bookmark");
    }

    #[test]
    fn directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let exchange = DirectoryExchange::new(dir.path());
        assert_eq!(exchange.prompt_for_text_file().unwrap(), None);

        exchange.download_text_file("Cave", "{}").unwrap();
        let exported = exchange.exports().join("Cave.json");
        assert_eq!(fs::read_to_string(&exported).unwrap(), "{}");

        fs::create_dir_all(exchange.imports()).unwrap();
        fs::write(exchange.imports().join("notes.txt"), "ignored").unwrap();
        fs::write(exchange.imports().join("saved.json"), "[1]").unwrap();
        assert_eq!(exchange.prompt_for_text_file().unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn memory_exchange() {
        let exchange = MemoryExchange::new();
        exchange.offer("a");
        exchange.download_text_file("x", "y").unwrap();

        assert_eq!(exchange.prompt_for_text_file().unwrap().as_deref(), Some("a"));
        assert_eq!(exchange.prompt_for_text_file().unwrap(), None);
        assert_eq!(exchange.downloads(), vec![("x".to_string(), "y".to_string())]);
    }
}
