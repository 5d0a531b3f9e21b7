use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persistence for the all-time high score: one non-negative integer in a
/// JSON file, loaded once at startup and rewritten whenever a game ends
/// with a new record.
///
/// Callers treat both loading and saving as best-effort (a missing or
/// unwritable file must never stop a game), so every error here ends up
/// swallowed at the call site; the types exist so that call sites can say
/// so explicitly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct HighScoreStore {
    /// Path override from the configuration file
    path: Option<PathBuf>,

    /// Whether to touch the disk at all
    enabled: bool,
}

impl HighScoreStore {
    pub(crate) fn new(path: Option<PathBuf>, enabled: bool) -> HighScoreStore {
        HighScoreStore { path, enabled }
    }

    /// Return the default high score file path
    fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("viperine").join("highscore.json"))
    }

    fn path(&self) -> Option<Cow<'_, Path>> {
        self.path
            .as_deref()
            .map(Cow::from)
            .or_else(|| HighScoreStore::default_path().map(Cow::from))
    }

    /// Read the stored high score.  A missing file (or a disabled store)
    /// reads as zero.
    pub(crate) fn load(&self) -> Result<u32, LoadError> {
        if !self.enabled {
            return Ok(0);
        }
        let path = self.path().ok_or_else(LoadError::no_path)?;
        let src = match fs_err::read(&path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(LoadError::read(e)),
        };
        serde_json::from_slice::<HighScoreFile>(&src)
            .map(|hsf| hsf.best)
            .map_err(LoadError::deserialize)
    }

    /// Write a new high score.  The caller is responsible for only calling
    /// this when `best` strictly exceeds the stored value; the store itself
    /// writes whatever it is given.
    pub(crate) fn save(&self, best: u32) -> Result<(), SaveError> {
        if !self.enabled {
            return Ok(());
        }
        let path = self.path().ok_or_else(SaveError::no_path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(SaveError::mkdir)?;
        }
        let mut src =
            serde_json::to_string(&HighScoreFile { best }).map_err(SaveError::serialize)?;
        src.push('\n');
        fs_err::write(&path, &src).map_err(SaveError::write)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct HighScoreFile {
    best: u32,
}

#[derive(Debug, Error)]
#[error("Failed to save high score to disk")]
pub(crate) struct SaveError(#[source] SaveErrorSource);

impl SaveError {
    fn no_path() -> Self {
        SaveError(SaveErrorSource::NoPath)
    }

    fn mkdir(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Mkdir(e))
    }

    fn serialize(e: serde_json::Error) -> Self {
        SaveError(SaveErrorSource::Serialize(e))
    }

    fn write(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Write(e))
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to create parent directories")]
    Mkdir(#[source] std::io::Error),
    #[error("failed to serialize high score")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write high score to disk")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Failed to read high score from disk")]
pub(crate) struct LoadError(#[source] LoadErrorSource);

impl LoadError {
    fn no_path() -> Self {
        LoadError(LoadErrorSource::NoPath)
    }

    fn read(e: std::io::Error) -> Self {
        LoadError(LoadErrorSource::Read(e))
    }

    fn deserialize(e: serde_json::Error) -> Self {
        LoadError(LoadErrorSource::Deserialize(e))
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to read high score file")]
    Read(#[source] std::io::Error),
    #[error("failed to deserialize high score")]
    Deserialize(#[source] serde_json::Error),
}
