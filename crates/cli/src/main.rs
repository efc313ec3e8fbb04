use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jsonmap_engine::{MappingRequest, MappingService};
use jsonmap_registry::MappingConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jsonmap", version, about = "Resolve facility data paths through JSON mapping files")]
struct Cli {
    /// Mapping root directory (overrides config and JSON_MAPPING_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Data-dictionary version selecting the facility manifest
    #[arg(long, global = true, value_name = "VERSION")]
    dd_version: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve one path and print the value as JSON
    Resolve {
        facility: String,
        path: String,
        /// Index bound to a `#` placeholder; repeat for several
        #[arg(short = 'i', long = "index", value_name = "N", allow_negative_numbers = true)]
        indices: Vec<i64>,
        #[arg(long)]
        shot: Option<i64>,
        #[arg(long)]
        run: Option<i64>,
        #[arg(long)]
        experiment: Option<String>,
    },
    /// List the keys mapped for a schema
    List { facility: String, schema: String },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = MappingConfig::load().context("failed to load mapping configuration")?;
    if let Some(root) = cli.root {
        config = config.with_root_directory(root);
    }
    if let Some(dd_version) = cli.dd_version {
        config.dd_version = dd_version;
    }
    debug!(root = ?config.root_directory, dd_version = %config.dd_version, "mapping configuration");
    let mut service = MappingService::from_config(config);

    match cli.command {
        Command::Resolve {
            facility,
            path,
            indices,
            shot,
            run,
            experiment,
        } => {
            let request = MappingRequest {
                facility,
                path,
                indices,
                dd_version: None,
                experiment,
                shot,
                run,
            };
            let value = service
                .resolve(&request)
                .with_context(|| format!("failed to resolve '{}'", request.path))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::List { facility, schema } => {
            let entries = service
                .list(&facility, &schema)
                .with_context(|| format!("failed to list {facility}/{schema}"))?;
            for (key, kind) in entries {
                println!("{:<8} {key}", kind.as_str());
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// `RUST_LOG` when set and valid, `info` otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn rust_log_controls_the_filter() {
        temp_env::with_var("RUST_LOG", Some("debug"), || {
            assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::DEBUG));
        });
        temp_env::with_var("RUST_LOG", Some("error"), || {
            assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::ERROR));
        });
    }

    #[test]
    fn filter_defaults_to_info() {
        temp_env::with_var_unset("RUST_LOG", || {
            assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::INFO));
        });
    }
}
