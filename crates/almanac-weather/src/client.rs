//! Open-Meteo ERA5 archive client.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::TransportError;
use crate::types::{DailySeries, DATE_FORMAT};

pub const ARCHIVE_API_BASE: &str = "https://archive-api.open-meteo.com";
const ERA5_PATH: &str = "/v1/era5";
const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min";
const USER_AGENT: &str = "Almanac/0.1.0";

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[allow(dead_code)]
    latitude: f64,
    #[allow(dead_code)]
    longitude: f64,
    daily: ArchiveDaily,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
}

/// Thin HTTP client for daily temperature aggregates. Never retries.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Arc<Client>,
    base_url: String,
}

impl ArchiveClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_base_url(ARCHIVE_API_BASE, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Daily max/min temperatures for every day in `[start, end]`.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_range(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailySeries, TransportError> {
        if start > end {
            return Err(TransportError::InvalidRange { start, end });
        }

        let url = format!("{}{}", self.base_url, ERA5_PATH);
        let start_date = start.format(DATE_FORMAT).to_string();
        let end_date = end.format(DATE_FORMAT).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", start_date),
                ("end_date", end_date),
                ("daily", DAILY_VARIABLES.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Archive returned status {}", status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ArchiveResponse = serde_json::from_str(&body)?;
        let daily = parsed.daily;
        let series = DailySeries::new(
            daily.time,
            daily.temperature_2m_max,
            daily.temperature_2m_min,
        )?;

        tracing::debug!("Archive returned {} days", series.len());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::types::TemperatureRange;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn client(server: &MockServer) -> ArchiveClient {
        ArchiveClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_range_sends_query_and_parses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .and(query_param("latitude", "28.55"))
            .and(query_param("longitude", "77.27"))
            .and(query_param("start_date", "2024-06-01"))
            .and(query_param("end_date", "2024-06-02"))
            .and(query_param("daily", "temperature_2m_max,temperature_2m_min"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 28.55,
                "longitude": 77.27,
                "daily": {
                    "time": ["2024-06-01", "2024-06-02"],
                    "temperature_2m_max": [25.0, 26.5],
                    "temperature_2m_min": [15.0, null]
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let series = client(&mock_server)
            .fetch_range(28.55, 77.27, date("2024-06-01"), date("2024-06-02"))
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.day(date("2024-06-01")).unwrap().range(),
            Some(TemperatureRange { min: 15.0, max: 25.0 })
        );
        assert_eq!(series.day(date("2024-06-02")).unwrap().min, None);
    }

    #[tokio::test]
    async fn test_server_error_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad range"))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server)
            .fetch_range(0.0, 0.0, date("2024-06-01"), date("2024-06-01"))
            .await;

        match result {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad range");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"daily\": 3}"))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server)
            .fetch_range(0.0, 0.0, date("2024-06-01"), date("2024-06-01"))
            .await;

        assert!(matches!(result, Err(TransportError::Parse(_))));
    }

    #[tokio::test]
    async fn test_misaligned_arrays_are_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 0.0,
                "longitude": 0.0,
                "daily": {
                    "time": ["2024-06-01", "2024-06-02"],
                    "temperature_2m_max": [25.0],
                    "temperature_2m_min": [15.0, 16.0]
                }
            })))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server)
            .fetch_range(0.0, 0.0, date("2024-06-01"), date("2024-06-02"))
            .await;

        assert!(matches!(result, Err(TransportError::Misaligned(_))));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/era5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_string("{}"),
            )
            .mount(&mock_server)
            .await;

        let client =
            ArchiveClient::with_base_url(&mock_server.uri(), Duration::from_millis(50)).unwrap();
        let result = client
            .fetch_range(0.0, 0.0, date("2024-06-01"), date("2024-06-01"))
            .await;

        assert!(matches!(result, Err(TransportError::Timeout)));
    }

    #[tokio::test]
    async fn test_reversed_range_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = client(&mock_server)
            .fetch_range(0.0, 0.0, date("2024-06-02"), date("2024-06-01"))
            .await;

        assert!(matches!(result, Err(TransportError::InvalidRange { .. })));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            ArchiveClient::with_base_url("http://localhost:1234/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
