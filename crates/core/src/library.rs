//! Local save/state files kept by the emulator.
//!
//! Files live under `<emulator>/<saves|states>/<core>/<file>`; each one is
//! surfaced as a [`FileItem`].

use std::{
    fmt, fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{models::FileItem, paths, timestamp};

/// Which emulator directory a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveKind {
    /// In-game save data.
    Save,
    /// Emulator snapshot.
    State,
}

impl SaveKind {
    /// Directory name below the emulator root.
    pub fn dir_name(self) -> &'static str {
        match self {
            SaveKind::Save => "saves",
            SaveKind::State => "states",
        }
    }
}

impl fmt::Display for SaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveKind::Save => f.pad("save"),
            SaveKind::State => f.pad("state"),
        }
    }
}

/// Run `op`, handing any failure to `report` before returning it.
pub fn with_reporter<T, F, R>(op: F, report: R) -> Result<T>
where
    F: FnOnce() -> Result<T>,
    R: FnOnce(&anyhow::Error),
{
    op().inspect_err(|err| report(err))
}

/// Scans and writes save/state files under an emulator root.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the emulator install directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Emulator root this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding files of `kind`.
    pub fn kind_dir(&self, kind: SaveKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Return all files of `kind`, most recently modified first.
    pub fn entries(&self, kind: SaveKind) -> Result<Vec<FileItem>> {
        let base = self.kind_dir(kind);
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut found: Vec<(DateTime<Utc>, FileItem)> = Vec::new();
        for entry in WalkDir::new(&base).min_depth(2).max_depth(2) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable {kind} entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let core = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let modified = entry
                .metadata()
                .map_err(anyhow::Error::from)
                .and_then(|meta| meta.modified().map_err(anyhow::Error::from));
            let modified: DateTime<Utc> = match modified {
                Ok(time) => time.into(),
                Err(err) => {
                    warn!("Failed to stat {:?}: {err}", entry.path());
                    continue;
                }
            };

            found.push((
                modified,
                FileItem {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    core,
                    modified: timestamp::format(&modified),
                },
            ));
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        debug!("found {} local {kind} files", found.len());
        Ok(found.into_iter().map(|(_, item)| item).collect())
    }

    /// Files of `kind` sharing their stem with `rom_file`.
    ///
    /// Emulators name saves after the ROM (`Game.gba` → `Game.srm`,
    /// `Game.state1`), so this is how they are matched to a game.
    pub fn entries_for_rom(&self, kind: SaveKind, rom_file: &str) -> Result<Vec<FileItem>> {
        let stem = Path::new(rom_file)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .entries(kind)?
            .into_iter()
            .filter(|item| {
                Path::new(&item.name)
                    .file_stem()
                    .map(|candidate| candidate.to_string_lossy() == stem)
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Path a file of `kind` for `core` named `file_name` maps to.
    ///
    /// Both parts are sanitised and must each reduce to exactly one path
    /// component, so the result sits at `<kind>/<core>/<file>` and is found
    /// again by [`LocalStore::entries`].
    pub fn path_for(&self, kind: SaveKind, core: &str, file_name: &str) -> Result<PathBuf> {
        let core = single_component(core, "core")?;
        let file_name = single_component(file_name, "file name")?;
        Ok(self.kind_dir(kind).join(core).join(file_name))
    }

    /// Store downloaded bytes, returning the written path.
    pub fn write(
        &self,
        kind: SaveKind,
        core: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self.path_for(kind, core, file_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Delete the file backing `item`.
    pub fn remove(&self, kind: SaveKind, item: &FileItem) -> Result<()> {
        with_reporter(
            || {
                let path = self.path_for(kind, &item.core, &item.name)?;
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))
            },
            |err| warn!("{err:#}"),
        )
    }
}

fn single_component(value: &str, what: &str) -> Result<String> {
    let sanitized = paths::sanitize(value);
    let mut components = Path::new(&sanitized).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(name.to_string_lossy().into_owned()),
        _ => bail!("invalid {what} {value:?}: expected a single path component"),
    }
}
