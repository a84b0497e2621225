//! Command line interface and outcome rendering.

use almanac_core::WeatherError;
use almanac_weather::{FetchOutcome, FetchStatus, WeatherRecord, DATE_FORMAT};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Daily temperatures for any date and place", long_about = None)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query the weather archive (caches exact-date results)
    Fetch(Query),
    /// Read a previously cached record without going online
    Cached(Query),
    /// List every cached record
    History,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct Query {
    /// Calendar date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Human-readable rendering of an outcome.
pub fn render_outcome(outcome: &FetchOutcome, history_years: u32) -> String {
    let mut lines = vec![
        format!("Date: {}", outcome.date.format(DATE_FORMAT)),
        format!("Location: {}, {}", outcome.latitude, outcome.longitude),
    ];

    match (outcome.status, outcome.temperature) {
        (FetchStatus::Ok, Some(t)) => {
            lines.push(format!("Max temperature: {:.1} °C", t.max));
            lines.push(format!("Min temperature: {:.1} °C", t.min));
            if outcome.is_future {
                lines.push(format!(
                    "Note: this date is not in the archive yet; showing the {}-year average for this day.",
                    history_years
                ));
            }
        }
        _ => {
            let err = no_data_error(outcome);
            tracing::debug!("{}", err);
            lines.push(err.user_message().to_string());
        }
    }

    lines.join("\n")
}

/// Error describing an outcome that carries no temperatures, keyed by the
/// requested date and coordinates.
fn no_data_error(outcome: &FetchOutcome) -> WeatherError {
    let key = format!(
        "{} ({}, {})",
        outcome.date.format(DATE_FORMAT),
        outcome.latitude,
        outcome.longitude
    );
    match outcome.status {
        FetchStatus::NoDataFromDb => WeatherError::NotCached(key),
        FetchStatus::Ok | FetchStatus::NoDataFromApi => WeatherError::NoApiData(key),
    }
}

/// One line per cached record.
pub fn render_history(records: &[WeatherRecord]) -> String {
    if records.is_empty() {
        return "No cached records.".to_string();
    }

    records
        .iter()
        .map(|r| {
            format!(
                "{}  {:>9}, {:>9}  min {:>5.1} °C  max {:>5.1} °C",
                r.date.format(DATE_FORMAT),
                r.latitude,
                r.longitude,
                r.min_temperature,
                r.max_temperature
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use almanac_weather::{FetchMode, TemperatureRange};

    fn outcome(status: FetchStatus, mode: FetchMode, is_future: bool) -> FetchOutcome {
        let temperature = (status == FetchStatus::Ok).then_some(TemperatureRange {
            min: 15.04,
            max: 25.0,
        });
        FetchOutcome {
            mode,
            status,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            latitude: 28.55,
            longitude: 77.27,
            temperature,
            is_future,
            cached: false,
        }
    }

    #[test]
    fn test_parse_fetch_command() {
        let cli = Cli::try_parse_from([
            "almanac", "fetch", "--date", "2024-06-01", "--lat", "28.55", "--lon", "-77.27",
        ])
        .unwrap();

        match cli.command {
            Commands::Fetch(q) => {
                assert_eq!(q.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
                assert_eq!(q.lat, 28.55);
                assert_eq!(q.lon, -77.27);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "almanac", "cached", "--date", "06/01/2024", "--lat", "1", "--lon", "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_ok_rounds_to_one_decimal() {
        let text = render_outcome(&outcome(FetchStatus::Ok, FetchMode::Direct, false), 10);
        assert!(text.contains("Max temperature: 25.0 °C"));
        assert!(text.contains("Min temperature: 15.0 °C"));
        assert!(!text.contains("Note:"));
    }

    #[test]
    fn test_render_future_note() {
        let text = render_outcome(
            &outcome(FetchStatus::Ok, FetchMode::HistoricalAverage, true),
            10,
        );
        assert!(text.contains("10-year average"));
    }

    #[test]
    fn test_render_no_data_messages() {
        let api = render_outcome(&outcome(FetchStatus::NoDataFromApi, FetchMode::Direct, false), 10);
        assert!(api.contains("No weather data is available"));

        let db = render_outcome(&outcome(FetchStatus::NoDataFromDb, FetchMode::Cached, false), 10);
        assert!(db.contains("No saved weather record"));
    }

    #[test]
    fn test_no_data_errors_name_the_requested_key() {
        let api = outcome(FetchStatus::NoDataFromApi, FetchMode::HistoricalAverage, true);
        assert_eq!(
            no_data_error(&api).to_string(),
            "No data from weather API: 2024-06-01 (28.55, 77.27)"
        );

        let db = outcome(FetchStatus::NoDataFromDb, FetchMode::Cached, false);
        assert_eq!(
            no_data_error(&db).to_string(),
            "No cached record for 2024-06-01 (28.55, 77.27)"
        );
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), "No cached records.");
    }
}
