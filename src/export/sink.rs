use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{StardreamError, StardreamResult};

pub const DEFAULT_EXPORT_FILENAME: &str = "stardream-poster.png";

/// Where exported PNGs are delivered.
pub trait ExportSink: Send {
    /// Store `png` under `filename`, returning a human-readable location.
    fn deliver(&mut self, filename: &str, png: &[u8]) -> StardreamResult<String>;
}

/// Outcome of a delivered export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub filename: String,
    pub location: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Keep only the final path component; an empty name falls back to the default.
pub fn sanitize_filename(filename: &str) -> StardreamResult<String> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_EXPORT_FILENAME.to_owned());
    }
    let name = Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "..")
        .ok_or_else(|| StardreamError::validation(format!("invalid export filename '{filename}'")))?;
    Ok(name.to_owned())
}

/// Writes exports into a directory, creating it on demand.
#[derive(Clone, Debug)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirSink {
    fn deliver(&mut self, filename: &str, png: &[u8]) -> StardreamResult<String> {
        let path = self.dir.join(sanitize_filename(filename)?);
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create export dir '{}'", self.dir.display()))
            .and_then(|()| {
                std::fs::write(&path, png).with_context(|| format!("write '{}'", path.display()))
            })
            .map_err(|e| StardreamError::export(format!("{e:#}")))?;
        Ok(path.display().to_string())
    }
}

/// Collects exports in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    files: Vec<(String, Vec<u8>)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }
}

impl ExportSink for InMemorySink {
    fn deliver(&mut self, filename: &str, png: &[u8]) -> StardreamResult<String> {
        let name = sanitize_filename(filename)?;
        self.files.push((name.clone(), png.to_vec()));
        Ok(format!("memory:{name}"))
    }
}
