mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands};
use fieldops::config::Config;
use fieldops::datasources::{DataFrequency, ExportCollaborator, ImportOptions, JsonPlugin, StandardRegistry};
use fieldops::logic::setup::reference_dataset;
use fieldops::logic::FieldOperationReport;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match cli.command {
        Commands::Init => None,
        _ => Some(Config::load(cli.config.clone()).context("Failed to load configuration")?),
    };

    let default_level = match cli.verbose {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "warn".into()),
        1 => "debug".into(),
        _ => "trace".into(),
    };
    let filter = if cli.verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match (cli.command, config) {
        (Commands::Init, _) => {
            Config::setup_interactive().context("Interactive setup failed")?;
        }
        (
            Commands::Import {
                path,
                five_hz,
                one_hz,
                all,
                pretty,
            },
            Some(config),
        ) => {
            let mut options = config.import.to_options()?;
            if five_hz {
                options.data_frequency = DataFrequency::FiveHz;
            } else if one_hz {
                options.data_frequency = DataFrequency::OneHz;
            }
            if all {
                options = options.with_all_categories();
            }
            import(&path, &options, config.hierarchy.max_depth, pretty)?;
        }
        (Commands::Export { path }, Some(_)) => {
            let dataset = reference_dataset(&StandardRegistry::standard())
                .context("Failed to build reference dataset")?;
            JsonPlugin::new()
                .write(&dataset, &path)
                .with_context(|| format!("Failed to write dataset to {}", path.display()))?;
            println!("Wrote reference dataset to {}", path.display());
        }
        (_, None) => bail!("Configuration was not loaded"),
    }

    Ok(())
}

fn import(path: &Path, options: &ImportOptions, max_depth: usize, pretty: bool) -> anyhow::Result<()> {
    let (dataset, source) = JsonPlugin::new()
        .open(path, options)
        .with_context(|| format!("Failed to load dataset from {}", path.display()))?;

    let Some(logged) = dataset.documents.logged_data.first() else {
        bail!("Dataset at {} has no logged data", path.display());
    };

    let report = FieldOperationReport::build(&dataset, logged, &source, max_depth)
        .context("Failed to build field operation report")?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
