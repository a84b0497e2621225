//! SQLite-backed cache of one weather record per (date, latitude, longitude).

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::StoreError;
use crate::types::{WeatherRecord, DATE_FORMAT};

/// What `upsert` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A record with the same key already existed and was left untouched
    AlreadyPresent,
}

/// Local record cache.
///
/// Cloning shares the underlying connection. Writes are insert-if-absent:
/// the first record stored for a key is never replaced.
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for tests and throwaway sessions).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                min_temperature REAL NOT NULL,
                max_temperature REAL NOT NULL,
                UNIQUE (date, latitude, longitude)
            );
            "#,
        )?;
        Ok(())
    }

    /// Exact-match lookup on the key triple. A miss is `Ok(None)`.
    pub fn get(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<WeatherRecord>, StoreError> {
        let conn = self.conn.lock();
        Self::find(&conn, date, latitude, longitude)
    }

    /// Store `record` unless its key is already present.
    ///
    /// The lookup and the insert run under one lock and one transaction, so
    /// concurrent callers cannot both insert the same key.
    pub fn upsert(&self, record: &WeatherRecord) -> Result<UpsertOutcome, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        if Self::find(&tx, record.date, record.latitude, record.longitude)?.is_some() {
            return Ok(UpsertOutcome::AlreadyPresent);
        }

        tx.execute(
            r#"
            INSERT INTO weather_data (date, latitude, longitude, min_temperature, max_temperature)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.date.format(DATE_FORMAT).to_string(),
                record.latitude,
                record.longitude,
                record.min_temperature,
                record.max_temperature,
            ],
        )?;
        tx.commit()?;

        Ok(UpsertOutcome::Inserted)
    }

    /// Every cached record, ordered by date then location.
    pub fn all(&self) -> Result<Vec<WeatherRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT date, latitude, longitude, min_temperature, max_temperature
             FROM weather_data ORDER BY date, latitude, longitude",
        )?;

        let rows = stmt.query_map([], Self::row_to_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn find(
        conn: &Connection,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<WeatherRecord>, StoreError> {
        let record = conn
            .query_row(
                "SELECT date, latitude, longitude, min_temperature, max_temperature
                 FROM weather_data WHERE date = ?1 AND latitude = ?2 AND longitude = ?3",
                params![date.format(DATE_FORMAT).to_string(), latitude, longitude],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<WeatherRecord> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

        Ok(WeatherRecord {
            date,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            min_temperature: row.get(3)?,
            max_temperature: row.get(4)?,
        })
    }
}
