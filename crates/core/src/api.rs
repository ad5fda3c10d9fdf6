//! Thin async client for the remote library API.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    models::{Game, Platform, ServerSave, ServerState},
    paths,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures talking to the remote library.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code returned.
        status: StatusCode,
    },
    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The server-reported location does not name a file.
    #[error("game {id} has no usable file path: {path:?}")]
    InvalidPath {
        /// Game identifier.
        id: u64,
        /// Path as reported by the server.
        path: String,
    },
}

/// List responses arrive either bare or wrapped in a pagination envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paged { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paged { items } => items,
            Listing::Bare(items) => items,
        }
    }
}

/// Client bound to one configured server.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base: String,
    username: String,
    password: String,
}

impl RemoteClient {
    /// Build a client from settings.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base: config.api_base(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Absolute URL for an API path such as `/api/platforms`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// All platforms on the server.
    pub async fn platforms(&self) -> Result<Vec<Platform>, ApiError> {
        self.list("/api/platforms", &[]).await
    }

    /// Games belonging to one platform.
    pub async fn games(&self, platform_id: u64) -> Result<Vec<Game>, ApiError> {
        self.list("/api/roms", &[("platform_id", platform_id.to_string())])
            .await
    }

    /// One game by identifier.
    pub async fn game(&self, game_id: u64) -> Result<Game, ApiError> {
        let url = self.url(&format!("/api/roms/{game_id}"));
        self.get_json(self.authed(self.http.get(&url)), &url).await
    }

    /// Saves stored for a game.
    pub async fn saves(&self, game_id: u64) -> Result<Vec<ServerSave>, ApiError> {
        self.list("/api/saves", &[("rom_id", game_id.to_string())])
            .await
    }

    /// States stored for a game.
    pub async fn states(&self, game_id: u64) -> Result<Vec<ServerState>, ApiError> {
        self.list("/api/states", &[("rom_id", game_id.to_string())])
            .await
    }

    /// Download a game's ROM below `roms_root`, returning the written path.
    ///
    /// The destination comes from the server-reported `full_path`, sanitised
    /// so the write stays inside `roms_root`.
    pub async fn download_rom(&self, game: &Game, roms_root: &Path) -> Result<PathBuf, ApiError> {
        let destination = rom_destination(game, roms_root)?;
        let file_name = game.file_name().unwrap_or_else(|| game.rom_id.clone());
        let url = self.url(&format!("/api/roms/{}/content/{}", game.id, file_name));
        let response = self.send(self.authed(self.http.get(&url)), &url).await?;
        let bytes = response.bytes().await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, &bytes).await?;
        info!(
            "downloaded {} ({} bytes) to {}",
            game.display_name(),
            bytes.len(),
            destination.display()
        );
        Ok(destination)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(path);
        let request = self.authed(self.http.get(&url).query(query));
        let listing: Listing<T> = self.get_json(request, &url).await?;
        let items = listing.into_items();
        debug!("{url} listed {} items", items.len());
        Ok(items)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        Ok(self.send(request, url).await?.json().await?)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        if self.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, Some(&self.password))
        }
    }
}

/// Where a game's ROM lands below `roms_root`.
///
/// Rejects a `full_path` that sanitises to nothing, which would otherwise
/// resolve to `roms_root` itself.
fn rom_destination(game: &Game, roms_root: &Path) -> Result<PathBuf, ApiError> {
    if paths::sanitize(&game.full_path) == paths::CURRENT_DIR {
        return Err(ApiError::InvalidPath {
            id: game.id,
            path: game.full_path.clone(),
        });
    }
    Ok(game.local_path(roms_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_join_cleanly() -> Result<(), ApiError> {
        let config = AppConfig {
            host: "https://romm.example.com/".to_string(),
            ..AppConfig::default()
        };
        let client = RemoteClient::new(&config)?;
        assert_eq!(
            client.url("/api/platforms"),
            "https://romm.example.com/api/platforms"
        );
        assert_eq!(client.url("api/roms/1"), "https://romm.example.com/api/roms/1");
        Ok(())
    }

    #[test]
    fn listings_accept_bare_and_paged_payloads() -> anyhow::Result<()> {
        let bare: Listing<Platform> = serde_json::from_value(json!([
            { "id": 1, "name": "SNES", "slug": "snes", "rom_count": 3 }
        ]))?;
        assert_eq!(bare.into_items().len(), 1);

        let paged: Listing<Game> = serde_json::from_value(json!({
            "items": [
                { "id": 5, "name": "Mario", "full_path": "snes/Mario.sfc" },
                { "id": 6, "name": "Zelda", "full_path": "snes/Zelda.sfc" }
            ],
            "total": 2,
            "limit": 50,
            "offset": 0
        }))?;
        let games = paged.into_items();
        assert_eq!(games.len(), 2);
        assert_eq!(games[1].title, "Zelda");
        Ok(())
    }

    #[test]
    fn rom_destination_requires_a_file_path() -> anyhow::Result<()> {
        let root = Path::new("/library/roms");
        for path in ["", "..", "/", "../..", "C:\\"] {
            let game: Game =
                serde_json::from_value(json!({ "id": 9, "name": "Bad", "full_path": path }))?;
            assert!(
                matches!(
                    rom_destination(&game, root),
                    Err(ApiError::InvalidPath { id: 9, .. })
                ),
                "{path:?} should be rejected"
            );
        }

        let game: Game = serde_json::from_value(json!({
            "id": 5,
            "name": "Mario",
            "full_path": "../snes/Mario.sfc"
        }))?;
        assert_eq!(
            rom_destination(&game, root)?,
            root.join("snes").join("Mario.sfc")
        );
        Ok(())
    }
}
