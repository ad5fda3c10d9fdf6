//! Newer-vs-older status of local files against their remote counterparts.
//!
//! This only reports; nothing here moves files in either direction.

use std::{cmp::Ordering, fmt};

use serde::Serialize;

use crate::{
    models::{FileItem, RemoteFile},
    timestamp::ParseError,
};

/// Relationship between a local file and its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Both sides carry the same instant.
    InSync,
    /// The local copy was modified after the remote one.
    LocalNewer,
    /// The remote copy was updated after the local one.
    RemoteNewer,
    /// Only present on disk.
    LocalOnly,
    /// Only present on the server.
    RemoteOnly,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::InSync => "in sync",
            SyncStatus::LocalNewer => "local newer",
            SyncStatus::RemoteNewer => "remote newer",
            SyncStatus::LocalOnly => "local only",
            SyncStatus::RemoteOnly => "remote only",
        };
        f.pad(label)
    }
}

/// Compare one local file with one remote file.
///
/// Returns `None` when neither side exists.
pub fn compare<R: RemoteFile>(
    local: Option<&FileItem>,
    remote: Option<&R>,
) -> Result<Option<SyncStatus>, ParseError> {
    let status = match (local, remote) {
        (None, None) => return Ok(None),
        (Some(_), None) => SyncStatus::LocalOnly,
        (None, Some(_)) => SyncStatus::RemoteOnly,
        (Some(local), Some(remote)) => {
            match local.modified_at()?.cmp(&remote.updated_at()?) {
                Ordering::Equal => SyncStatus::InSync,
                Ordering::Greater => SyncStatus::LocalNewer,
                Ordering::Less => SyncStatus::RemoteNewer,
            }
        }
    };
    Ok(Some(status))
}

/// Outcome for one (core, file name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    /// Emulator core.
    pub core: String,
    /// File name.
    pub name: String,
    /// Status, or the reason it could not be determined.
    pub status: Result<SyncStatus, String>,
}

/// Pair local and remote files by core and name and compare each pair.
///
/// Local files come first in their given order, followed by remote-only
/// files in theirs. A timestamp that fails to parse marks only its own
/// pair as undetermined.
pub fn reconcile<R: RemoteFile>(locals: &[FileItem], remotes: &[R]) -> Vec<Comparison> {
    let mut results = Vec::with_capacity(locals.len() + remotes.len());
    let mut matched = vec![false; remotes.len()];

    for local in locals {
        let position = remotes
            .iter()
            .position(|remote| remote.core() == local.core && remote.file_name() == local.name);
        if let Some(index) = position {
            matched[index] = true;
        }
        if results
            .iter()
            .any(|seen: &Comparison| seen.core == local.core && seen.name == local.name)
        {
            continue;
        }
        let remote = position.map(|index| &remotes[index]);
        results.push(Comparison {
            core: local.core.clone(),
            name: local.name.clone(),
            status: outcome(compare(Some(local), remote)),
        });
    }

    for (remote, _) in remotes.iter().zip(&matched).filter(|(_, seen)| !**seen) {
        if results
            .iter()
            .any(|seen| seen.core == remote.core() && seen.name == remote.file_name())
        {
            continue;
        }
        results.push(Comparison {
            core: remote.core().to_string(),
            name: remote.file_name().to_string(),
            status: outcome(compare(None, Some(remote))),
        });
    }

    results
}

fn outcome(result: Result<Option<SyncStatus>, ParseError>) -> Result<SyncStatus, String> {
    match result {
        Ok(Some(status)) => Ok(status),
        Ok(None) => Err("no file on either side".to_string()),
        Err(err) => Err(err.to_string()),
    }
}
