//! Historical weather lookup for Almanac.
//!
//! Fetches daily temperatures from the Open-Meteo ERA5 archive, averages
//! past years for dates the archive does not cover yet, and caches exact
//! lookups in a local SQLite store.

pub mod averager;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod store;
pub mod types;

pub use averager::average_for_date;
pub use client::ArchiveClient;
pub use coordinator::{CoordinatorSettings, Route, WeatherCoordinator};
pub use error::{AverageError, CoordinatorError, MisalignedSeries, StoreError, TransportError};
pub use store::{RecordStore, UpsertOutcome};
pub use types::*;
