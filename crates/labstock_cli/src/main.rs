//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the inventory database.
//! - Print version and schema information for quick local sanity checks.

use labstock_core::{init_logging, open_db, schema_version, EngineConfig};
use log::warn;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("failed to load .env: {err}");
        }
    }

    let config = EngineConfig::from_env();
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }
    for message in &config.warnings {
        warn!("event=config_fallback module=cli status=warn message={message}");
        eprintln!("config: {message}");
    }

    println!("labstock_core ping={}", labstock_core::ping());
    println!("labstock_core version={}", labstock_core::core_version());

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open `{}`: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };
    match schema_version(&conn) {
        Ok(version) => {
            println!("db_path={}", config.db_path.display());
            println!("schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to read schema version: {err}");
            ExitCode::FAILURE
        }
    }
}
