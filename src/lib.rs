pub mod bits;         // Bit and nibble field helpers
pub mod capture;      // Captured table payloads
pub mod catalog;      // Dependency-ordered table decoding
pub mod codec;        // Byte cursor, strings, BCD and time fields
pub mod config;       // Configuration management
pub mod error;        // Error handling and types
pub mod options;      // Command line options parsing
pub mod prelude;      // Common imports and types
pub mod records;      // Record value types
pub mod schema;       // Field layouts shared by size and decode
pub mod table;        // Table traits and lifecycle
pub mod tables;       // Standard and manufacturer table definitions
pub mod transport;    // PSEM transport boundary
pub mod version;      // Firmware/hardware version gates

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::capture::Capture;
use crate::catalog::{DecodedTable, Session, SessionOptions, KNOWN_TABLES};
use crate::config::Config;
use crate::options::Options;
use crate::prelude::*;

use anyhow::bail;
use std::io::Write;

fn init_logging(level: &str) -> std::result::Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
}

/// Main application entry point
///
/// Loads the configuration, reads the capture and prints every requested
/// table as JSON on stdout.
pub fn app() -> anyhow::Result<()> {
    let options = Options::new();

    // config is read before logging is set up, so its level can apply
    let config = match &options.config_file {
        Some(file) => Config::new(file.clone())?,
        None => Config::default(),
    };

    if let Err(e) = init_logging(config.loglevel()) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    info!("c1219-decode {} starting", CARGO_PKG_VERSION);
    if let Some(file) = &options.config_file {
        info!("Using config file: {}", file);
        config.log();
    }

    run(config, options)
}

pub fn run(config: Config, options: Options) -> anyhow::Result<()> {
    let capture_file = match options.capture.as_deref().or(config.capture_file()) {
        Some(file) => file.to_string(),
        None => bail!("no capture file given (--capture or capture_file)"),
    };

    let mut transport = Capture::load(&capture_file)?.into_transport();

    let tables: Vec<TableId> = if !options.tables.is_empty() {
        options.tables.iter().copied().map(TableId).collect()
    } else if !config.tables.is_empty() {
        config.tables()
    } else {
        KNOWN_TABLES.to_vec()
    };

    let session_options = SessionOptions {
        firmware: config.firmware,
        hardware: config.hardware,
        ge_meter: config.ge_meter,
        timeout: Some(config.timeout()),
    };
    let mut session = Session::new(&mut transport, session_options);

    let mut output = serde_json::Map::new();
    for (id, decoded) in session.decode_all(&tables) {
        match decoded {
            Ok(table) => {
                info!("table {}: {}", id, table.name());
                output.insert(id.0.to_string(), table.to_json()?);
            }
            Err(Error::NotSupported { .. }) => info!("table {}: not supported by this meter", id),
            Err(e) => warn!("table {}: {}", id, e),
        }
    }

    let output = serde_json::Value::Object(output);
    let json = if options.pretty || config.pretty() {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);

    Ok(())
}
