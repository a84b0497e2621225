//! Request orchestration: pick the archive path for a date, average or cache,
//! and fold every failure into a [`FetchOutcome`].

use almanac_core::{Config, WeatherConfig};
use chrono::{Days, Local, Months, NaiveDate};
use std::time::Duration;
use tracing::instrument;

use crate::averager::average_for_date;
use crate::client::ArchiveClient;
use crate::error::{CoordinatorError, StoreError};
use crate::store::{RecordStore, UpsertOutcome};
use crate::types::{FetchMode, FetchOutcome, FetchStatus, WeatherRecord};

/// Archive path chosen for a requested date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The archive covers the date; look it up exactly
    Direct,
    /// Past the archive's reach; average the same day over past years
    HistoricalAverage,
}

/// Tunables for date classification and the history window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Days the archive trails today
    pub availability_lag_days: u32,
    /// Years of history sampled for the mean
    pub history_years: u32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            availability_lag_days: 5,
            history_years: 10,
        }
    }
}

impl From<&WeatherConfig> for CoordinatorSettings {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            availability_lag_days: config.availability_lag_days,
            history_years: config.history_years,
        }
    }
}

/// Answers "what was (or will be) the weather here on this date".
///
/// Dates the archive already covers are fetched directly and written through
/// to the record store. Later dates get the same month/day averaged over past
/// years and are never cached.
#[derive(Debug, Clone)]
pub struct WeatherCoordinator {
    client: ArchiveClient,
    store: RecordStore,
    settings: CoordinatorSettings,
}

impl WeatherCoordinator {
    pub fn new(client: ArchiveClient, store: RecordStore, settings: CoordinatorSettings) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    /// Build the client and open the record store described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, CoordinatorError> {
        let client = ArchiveClient::with_base_url(
            &config.weather.archive_url,
            Duration::from_secs(config.weather.request_timeout_secs),
        )?;
        let store = RecordStore::open(config.database_path())?;
        Ok(Self::new(client, store, (&config.weather).into()))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.settings
    }

    /// Last date the archive is expected to cover
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.settings.availability_lag_days)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// `HistoricalAverage` when `cutoff < target`, `Direct` otherwise.
    pub fn classify(&self, target: NaiveDate, today: NaiveDate) -> Route {
        if self.cutoff(today) < target {
            Route::HistoricalAverage
        } else {
            Route::Direct
        }
    }

    /// Inclusive `(start, end)` range sampled for historical means
    pub fn history_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.cutoff(today);
        let start = end
            .checked_sub_months(Months::new(self.settings.history_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        (start, end)
    }

    /// Fetch weather for `date` relative to the local calendar date.
    pub async fn fetch(&self, date: NaiveDate, latitude: f64, longitude: f64) -> FetchOutcome {
        self.fetch_as_of(Local::now().date_naive(), date, latitude, longitude)
            .await
    }

    /// Fetch weather for `date` as if today were `today`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_as_of(
        &self,
        today: NaiveDate,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> FetchOutcome {
        match self.classify(date, today) {
            Route::Direct => self.fetch_direct(date, latitude, longitude).await,
            Route::HistoricalAverage => {
                self.fetch_historical(today, date, latitude, longitude).await
            }
        }
    }

    async fn fetch_direct(&self, date: NaiveDate, latitude: f64, longitude: f64) -> FetchOutcome {
        let no_data = || {
            FetchOutcome::no_data(
                FetchMode::Direct,
                FetchStatus::NoDataFromApi,
                date,
                latitude,
                longitude,
            )
        };

        let series = match self.client.fetch_range(latitude, longitude, date, date).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Error fetching weather for {}: {}", date, e);
                return no_data();
            }
        };

        let Some(range) = series.day(date).and_then(|day| day.range()) else {
            tracing::warn!(
                "Archive had no temperatures for {} ({}, {})",
                date,
                latitude,
                longitude
            );
            return no_data();
        };

        let mut outcome =
            FetchOutcome::resolved(FetchMode::Direct, date, latitude, longitude, range);

        let record = WeatherRecord::new(date, latitude, longitude, range);
        match self.with_store(move |store| store.upsert(&record)).await {
            Ok(UpsertOutcome::Inserted) => {
                tracing::info!("Weather data inserted for {} ({}, {})", date, latitude, longitude);
            }
            Ok(UpsertOutcome::AlreadyPresent) => {
                tracing::debug!(
                    "Duplicate entry detected for {} ({}, {})",
                    date,
                    latitude,
                    longitude
                );
                outcome.cached = true;
            }
            Err(e) => {
                tracing::error!("Failed to cache weather for {}: {}", date, e);
            }
        }

        outcome
    }

    async fn fetch_historical(
        &self,
        today: NaiveDate,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> FetchOutcome {
        let no_data = || {
            FetchOutcome::no_data(
                FetchMode::HistoricalAverage,
                FetchStatus::NoDataFromApi,
                date,
                latitude,
                longitude,
            )
        };

        let (start, end) = self.history_window(today);
        tracing::debug!("Date {} is past {}; averaging {}..={}", date, end, start, end);

        let series = match self.client.fetch_range(latitude, longitude, start, end).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Error fetching historical weather for {}: {}", date, e);
                return no_data();
            }
        };

        match average_for_date(&series, date) {
            Ok(range) => FetchOutcome::resolved(
                FetchMode::HistoricalAverage,
                date,
                latitude,
                longitude,
                range,
            ),
            Err(e) => {
                tracing::warn!("Could not average history for {}: {}", date, e);
                no_data()
            }
        }
    }

    /// Look up a previously fetched record without touching the network.
    #[instrument(skip(self), level = "info")]
    pub async fn read_cached(&self, date: NaiveDate, latitude: f64, longitude: f64) -> FetchOutcome {
        match self.with_store(move |store| store.get(date, latitude, longitude)).await {
            Ok(Some(record)) => {
                let mut outcome = FetchOutcome::resolved(
                    FetchMode::Cached,
                    record.date,
                    record.latitude,
                    record.longitude,
                    record.temperature(),
                );
                outcome.cached = true;
                outcome
            }
            Ok(None) => {
                tracing::info!("No cached record for {} ({}, {})", date, latitude, longitude);
                FetchOutcome::no_data(
                    FetchMode::Cached,
                    FetchStatus::NoDataFromDb,
                    date,
                    latitude,
                    longitude,
                )
            }
            Err(e) => {
                tracing::error!("Record store lookup failed: {}", e);
                FetchOutcome::no_data(
                    FetchMode::Cached,
                    FetchStatus::NoDataFromDb,
                    date,
                    latitude,
                    longitude,
                )
            }
        }
    }

    /// Every cached record.
    pub async fn cached_records(&self) -> Result<Vec<WeatherRecord>, StoreError> {
        self.with_store(|store| store.all()).await
    }

    /// Run a store operation on the blocking pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&RecordStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
