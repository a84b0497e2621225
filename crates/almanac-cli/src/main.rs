mod cli;

use almanac_core::{AppError, ConfigError};
use almanac_weather::WeatherCoordinator;
use anyhow::Result;
use clap::Parser;

use crate::cli::{render_history, render_outcome, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    almanac_core::init()?;

    let mut app = match almanac_core::App::new() {
        Ok(app) => app,
        Err(e) => {
            if let Some(config_err) = e.downcast_ref::<ConfigError>() {
                eprintln!("{}", config_err.user_message());
            }
            return Err(e);
        }
    };
    app.initialize()?;

    tracing::info!("Almanac started");

    let coordinator = match WeatherCoordinator::from_config(app.config()) {
        Ok(c) => c,
        Err(e) => {
            let err = AppError::from(e);
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };
    let history_years = coordinator.settings().history_years;

    match cli.command {
        Commands::Fetch(q) => {
            let outcome = coordinator.fetch(q.date, q.lat, q.lon).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", render_outcome(&outcome, history_years));
            }
        }
        Commands::Cached(q) => {
            let outcome = coordinator.read_cached(q.date, q.lat, q.lon).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", render_outcome(&outcome, history_years));
            }
        }
        Commands::History => {
            let records = match coordinator.cached_records().await {
                Ok(r) => r,
                Err(e) => {
                    let err = AppError::from(e);
                    eprintln!("{}", err.user_message());
                    return Err(err.into());
                }
            };
            tracing::debug!("Listing {} cached records", records.len());
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{}", render_history(&records));
            }
        }
    }

    app.shutdown()?;

    Ok(())
}
