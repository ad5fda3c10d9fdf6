use std::path::Path;

use anyhow::{Context, Result};
use romlink_core::{
    compare::{self, Comparison},
    config::{self, AppConfig},
    paths, timestamp, LocalStore, RemoteClient, SaveKind,
};
use tracing::info;

use crate::cli::{Cli, Command, ConfigAction};

pub async fn run(cli: &Cli) -> Result<()> {
    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(config::default_config_path);

    match &cli.command {
        Command::Config { action } => handle_config(action, &config_path, cli.json),
        Command::Sanitize { path } => {
            println!("{}", paths::sanitize(path));
            Ok(())
        }
        Command::ParseTime { text } => {
            let parsed = timestamp::parse(text)?;
            println!("{}", timestamp::format(&parsed));
            Ok(())
        }
        Command::Platforms => {
            let client = connect(&config_path)?.1;
            let platforms = client.platforms().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&platforms)?);
            } else {
                for platform in platforms {
                    println!(
                        "{:>6}  {:<10}  {}",
                        platform.id,
                        platform.slug,
                        platform.display_name()
                    );
                }
            }
            Ok(())
        }
        Command::Games { platform_id } => {
            let client = connect(&config_path)?.1;
            let games = client.games(*platform_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&games)?);
            } else {
                for game in games {
                    let saves = if game.has_saves { "saves" } else { "" };
                    println!("{:>6}  {:<5}  {}", game.id, saves, game.display_name());
                }
            }
            Ok(())
        }
        Command::Pull { game_id } => {
            let (config, client) = connect(&config_path)?;
            let game = client.game(*game_id).await?;
            let path = client.download_rom(&game, &config.roms_dir()).await?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Saves { game_id } => {
            let (config, client) = connect(&config_path)?;
            let game = client.game(*game_id).await?;
            let rom_file = game.file_name().unwrap_or_else(|| game.rom_id.clone());
            let store = LocalStore::new(&config.emulator_path);

            let saves = compare::reconcile(
                &store.entries_for_rom(SaveKind::Save, &rom_file)?,
                &client.saves(game.id).await?,
            );
            let states = compare::reconcile(
                &store.entries_for_rom(SaveKind::State, &rom_file)?,
                &client.states(game.id).await?,
            );

            if cli.json {
                let report = serde_json::json!({ "saves": saves, "states": states });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", game.display_name());
                print_comparisons(SaveKind::Save, &saves);
                print_comparisons(SaveKind::State, &states);
            }
            Ok(())
        }
    }
}

fn handle_config(action: &ConfigAction, path: &Path, json: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            if config::ensure_config_at(path)? {
                println!("created {}", path.display());
            } else {
                println!("{} already exists", path.display());
            }
        }
        ConfigAction::Show => {
            let mut settings = AppConfig::load_from(path)?;
            mask(&mut settings.password);
            mask(&mut settings.achievements_password);
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                println!("host:              {}", settings.host);
                println!("username:          {}", settings.username);
                println!("password:          {}", settings.password);
                println!("library path:      {}", settings.library_path.display());
                println!("emulator path:     {}", settings.emulator_path.display());
                println!(
                    "emulator:          {}",
                    settings.emulator_executable_path().display()
                );
                println!("achievements user: {}", settings.achievements_username);
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn connect(path: &Path) -> Result<(AppConfig, RemoteClient)> {
    let settings = AppConfig::load_from(path)?;
    settings
        .validate()
        .with_context(|| format!("incomplete settings in {}", path.display()))?;
    info!("using server {}", settings.api_base());
    let client = RemoteClient::new(&settings)?;
    Ok((settings, client))
}

fn mask(secret: &mut String) {
    if !secret.is_empty() {
        *secret = "********".to_string();
    }
}

fn print_comparisons(kind: SaveKind, comparisons: &[Comparison]) {
    if comparisons.is_empty() {
        println!("  no {kind} files");
        return;
    }
    for comparison in comparisons {
        let status = match &comparison.status {
            Ok(status) => status.to_string(),
            Err(reason) => format!("unknown ({reason})"),
        };
        println!(
            "  {kind:<5}  {:<12}  {:<40}  {status}",
            comparison.core, comparison.name
        );
    }
}
