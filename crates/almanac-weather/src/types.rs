use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::MisalignedSeries;

/// Date format used on the wire and in the record store
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily minimum and maximum temperature in °C
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

/// One cached day of weather for a location.
///
/// Keyed by `(date, latitude, longitude)`; the store keeps at most one per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl WeatherRecord {
    pub fn new(date: NaiveDate, latitude: f64, longitude: f64, range: TemperatureRange) -> Self {
        Self {
            date,
            latitude,
            longitude,
            min_temperature: range.min,
            max_temperature: range.max,
        }
    }

    pub fn temperature(&self) -> TemperatureRange {
        TemperatureRange {
            min: self.min_temperature,
            max: self.max_temperature,
        }
    }
}

/// A single day taken from a [`DailySeries`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySample {
    pub date: NaiveDate,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl DailySample {
    /// Both values, if the archive had them
    pub fn range(&self) -> Option<TemperatureRange> {
        Some(TemperatureRange {
            min: self.min?,
            max: self.max?,
        })
    }

    /// Same month and day, any year
    pub fn matches_month_day(&self, target: NaiveDate) -> bool {
        self.date.month() == target.month() && self.date.day() == target.day()
    }
}

/// Daily max/min temperatures as returned by the archive.
///
/// The three columns always have the same length; index `i` of each
/// describes the same calendar day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    time: Vec<NaiveDate>,
    temperature_max: Vec<Option<f64>>,
    temperature_min: Vec<Option<f64>>,
}

impl DailySeries {
    pub fn new(
        time: Vec<NaiveDate>,
        temperature_max: Vec<Option<f64>>,
        temperature_min: Vec<Option<f64>>,
    ) -> Result<Self, MisalignedSeries> {
        if time.len() != temperature_max.len() || time.len() != temperature_min.len() {
            return Err(MisalignedSeries {
                time: time.len(),
                max: temperature_max.len(),
                min: temperature_min.len(),
            });
        }

        Ok(Self {
            time,
            temperature_max,
            temperature_min,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = DailySample> + '_ {
        self.time
            .iter()
            .zip(&self.temperature_max)
            .zip(&self.temperature_min)
            .map(|((date, max), min)| DailySample {
                date: *date,
                max: *max,
                min: *min,
            })
    }

    /// The sample for an exact date
    pub fn day(&self, date: NaiveDate) -> Option<DailySample> {
        self.samples().find(|s| s.date == date)
    }
}

/// Which path produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Single-day archive lookup
    Direct,
    /// Same month/day averaged over past years
    HistoricalAverage,
    /// Local record store only
    Cached,
}

/// Terminal status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStatus {
    Ok,
    NoDataFromApi,
    NoDataFromDb,
}

/// Result of one coordinator request, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub mode: FetchMode,
    pub status: FetchStatus,
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    /// Present only when `status` is `Ok`
    pub temperature: Option<TemperatureRange>,
    /// The date lies past the archive's coverage; `temperature` is a multi-year mean
    pub is_future: bool,
    /// A record for this key was already in the store before this request
    pub cached: bool,
}

impl FetchOutcome {
    pub(crate) fn resolved(
        mode: FetchMode,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
        temperature: TemperatureRange,
    ) -> Self {
        Self {
            mode,
            status: FetchStatus::Ok,
            date,
            latitude,
            longitude,
            temperature: Some(temperature),
            is_future: mode == FetchMode::HistoricalAverage,
            cached: false,
        }
    }

    pub(crate) fn no_data(
        mode: FetchMode,
        status: FetchStatus,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            mode,
            status,
            date,
            latitude,
            longitude,
            temperature: None,
            is_future: mode == FetchMode::HistoricalAverage,
            cached: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }

    pub fn min_temperature(&self) -> Option<f64> {
        self.temperature.map(|t| t.min)
    }

    pub fn max_temperature(&self) -> Option<f64> {
        self.temperature.map(|t| t.max)
    }
}
