//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the board store.
//! - Print version and schema information for quick local sanity checks.
//!
//! Usage: `kaban_cli [config.toml]`

use kaban_core::db::migrations::current_user_version;
use kaban_core::{FsAssetStore, KabanConfig};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("kaban_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = KabanConfig::load(config_path.as_deref()).map_err(|err| err.to_string())?;
    let file_logging =
        kaban_core::init_from_settings(&config.logging).map_err(|err| err.to_string())?;

    let conn = kaban_core::open_db(&config.database.path).map_err(|err| err.to_string())?;
    let schema_version = current_user_version(&conn).map_err(|err| err.to_string())?;
    let assets = FsAssetStore::open(&config.assets.root).map_err(|err| err.to_string())?;

    info!(
        "event=cli_start module=cli status=ok schema_version={} file_logging={}",
        schema_version, file_logging
    );
    println!("kaban_core ping={}", kaban_core::ping());
    println!("kaban_core version={}", kaban_core::core_version());
    println!("kaban_core schema_version={schema_version}");
    println!("kaban_core database={}", config.database.path.display());
    println!("kaban_core assets={}", assets.root().display());
    Ok(())
}
