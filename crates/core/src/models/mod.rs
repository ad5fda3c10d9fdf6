//! Shared domain models.
//!
//! These are transfer objects between the remote library API and local
//! consumers. Identifiers are assigned by the server and never computed on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    paths,
    timestamp::{self, ParseError, Timestamp},
};

/// A ROM entry as reported by the remote library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Server-assigned identifier.
    pub id: u64,
    /// Human-readable game title.
    #[serde(alias = "name")]
    pub title: String,
    /// Remote ROM identifier (the file name on the server).
    #[serde(default, alias = "fs_name")]
    pub rom_id: String,
    /// URL of the cover art, if any.
    #[serde(default, alias = "url_cover")]
    pub cover_url: Option<String>,
    /// Path of the ROM on the server, relative to its library root.
    #[serde(default)]
    pub full_path: String,
    /// Short description.
    #[serde(default)]
    pub summary: Option<String>,
    /// Genre names.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Whether the server holds save files for this game.
    #[serde(default)]
    pub has_saves: bool,
    /// ROM size in bytes.
    #[serde(default, alias = "fs_size_bytes")]
    pub file_size_bytes: u64,
}

impl Game {
    /// Returns the title, falling back to the ROM identifier when blank.
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.rom_id
        } else {
            &self.title
        }
    }

    /// Where this ROM lives once mirrored below `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        paths::resolve_under(root, &self.full_path)
    }

    /// Final component of the sanitised remote path, if it has one.
    pub fn file_name(&self) -> Option<String> {
        let relative = paths::sanitize(&self.full_path);
        Path::new(&relative)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// A platform (console/system) grouping games on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Server-assigned identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Short machine-friendly name (e.g. `gba`).
    pub slug: String,
    /// URL of the platform icon, if any.
    #[serde(default, alias = "url_logo")]
    pub icon_url: Option<String>,
    /// Number of ROMs the server holds for this platform.
    #[serde(default)]
    pub rom_count: u64,
}

impl Platform {
    /// Returns a user-facing label combining name and ROM count.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.rom_count)
    }
}

/// A save or state file found on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// File name, including extension.
    pub name: String,
    /// Emulator core that owns the file.
    pub core: String,
    /// Last modification time, ISO-8601.
    pub modified: String,
}

impl FileItem {
    /// Parsed [`FileItem::modified`].
    pub fn modified_at(&self) -> Result<Timestamp, ParseError> {
        timestamp::parse(&self.modified)
    }
}

/// Accessors shared by remote saves and states.
pub trait RemoteFile {
    /// File name on the server.
    fn file_name(&self) -> &str;
    /// Emulator core that produced the file.
    fn core(&self) -> &str;
    /// Raw `updated_at` string as returned by the API.
    fn updated_at_raw(&self) -> &str;
    /// Size in bytes.
    fn size(&self) -> u64;

    /// Parsed last-update time.
    fn updated_at(&self) -> Result<Timestamp, ParseError> {
        timestamp::parse(self.updated_at_raw())
    }
}

macro_rules! remote_file {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Server-assigned identifier.
            pub id: u64,
            /// File name on the server.
            pub file_name: String,
            /// Path on the server, relative to its library root.
            #[serde(default)]
            pub full_path: String,
            /// Emulator core that produced the file.
            #[serde(default)]
            pub emulator: String,
            /// Last-update time as returned by the API.
            pub updated_at: String,
            /// Size in bytes.
            #[serde(default)]
            pub file_size_bytes: u64,
        }

        impl RemoteFile for $name {
            fn file_name(&self) -> &str {
                &self.file_name
            }

            fn core(&self) -> &str {
                &self.emulator
            }

            fn updated_at_raw(&self) -> &str {
                &self.updated_at
            }

            fn size(&self) -> u64 {
                self.file_size_bytes
            }
        }
    };
}

remote_file!(
    /// In-game save stored on the server.
    ServerSave
);

remote_file!(
    /// Emulator snapshot stored on the server.
    ServerState
);
