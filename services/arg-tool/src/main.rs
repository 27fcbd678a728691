//! ARG dataset tool.
//!
//! Inspects, dumps, copies and deletes ARG rasters and writes the standard
//! conformance fixtures.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use arg_format::ArgConfig;

#[derive(Parser, Debug)]
#[command(name = "arg-tool")]
#[command(about = "Inspect and convert ARG raster datasets")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Rows buffered per write during copies (overrides ARG_COPY_CHUNK_ROWS)
    #[arg(long, global = true)]
    copy_chunk_rows: Option<usize>,

    /// Refuse to replace existing datasets
    #[arg(long, global = true)]
    no_overwrite: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print size, data type, geotransform, nodata and layer name
    Info {
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print every cell, one grid row per line
    Dump { path: PathBuf },

    /// Copy an ARG dataset to a new one
    Copy {
        src: PathBuf,
        dst: PathBuf,

        /// Layer name for the copy (default: the source's)
        #[arg(long)]
        layer: Option<String>,
    },

    /// Remove the .arg and .json files of a dataset
    Delete { path: PathBuf },

    /// Write the arg-<type> conformance fixtures into a directory
    Fixtures { dir: PathBuf },
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level))
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ArgConfig> {
    let mut config = ArgConfig::from_env();

    if let Some(rows) = args.copy_chunk_rows {
        config.copy_chunk_rows = rows;
    }
    if args.no_overwrite {
        config.overwrite = false;
    }

    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let config = load_config(&args)?;
    debug!(?config, "Loaded configuration");

    match args.command {
        Command::Info { path, json } => commands::info(&path, json),
        Command::Dump { path } => commands::dump(&path),
        Command::Copy { src, dst, layer } => commands::copy(&src, &dst, layer, &config),
        Command::Delete { path } => commands::delete(&path),
        Command::Fixtures { dir } => commands::fixtures(&dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_parse_copy_args() {
        let args = Args::try_parse_from([
            "arg-tool",
            "copy",
            "a.arg",
            "b.arg",
            "--layer",
            "ARG FTW",
            "--copy-chunk-rows",
            "8",
        ])
        .unwrap();

        assert_eq!(args.copy_chunk_rows, Some(8));
        match args.command {
            Command::Copy { src, dst, layer } => {
                assert_eq!(src, PathBuf::from("a.arg"));
                assert_eq!(dst, PathBuf::from("b.arg"));
                assert_eq!(layer.as_deref(), Some("ARG FTW"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_zero_chunk_rows_rejected() {
        let args = Args::try_parse_from(["arg-tool", "--copy-chunk-rows", "0", "dump", "a.arg"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
