//! Alpha Vantage daily quote adapter.
//!
//! Fetches `TIME_SERIES_DAILY` closes over HTTPS. Full history is requested
//! first; when the service reports full output as a premium feature the
//! request is repeated with compact output (about 100 days).

use crate::domain::error::BiastraderError;
use crate::domain::price::{PriceSeries, RawRow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

impl DailyResponse {
    fn notice(&self) -> Option<&str> {
        self.information.as_deref().or(self.note.as_deref())
    }

    fn full_output_refused(&self) -> bool {
        self.time_series.is_none()
            && self
                .notice()
                .is_some_and(|n| n.to_lowercase().contains("outputsize=full"))
    }

    fn into_series(self) -> Result<PriceSeries, BiastraderError> {
        let Some(time_series) = self.time_series else {
            let reason = if let Some(notice) = self.notice() {
                notice.to_string()
            } else if let Some(message) = &self.error_message {
                format!("API error: {}", message)
            } else {
                "missing 'Time Series (Daily)' object".to_string()
            };
            return Err(BiastraderError::UnexpectedSchema { reason });
        };

        let rows: Vec<RawRow> = time_series
            .into_iter()
            .enumerate()
            .map(|(i, (date, bar))| RawRow {
                line: i + 1,
                date,
                price: bar.close,
            })
            .collect();
        PriceSeries::from_raw_rows(&rows, DATE_FORMAT)
    }
}

fn decode(json: &str) -> Result<DailyResponse, BiastraderError> {
    serde_json::from_str(json).map_err(|e| BiastraderError::UnexpectedSchema {
        reason: format!("invalid JSON: {}", e),
    })
}

/// Parse a `TIME_SERIES_DAILY` response body into a price series.
pub fn parse_daily_series(json: &str) -> Result<PriceSeries, BiastraderError> {
    decode(json)?.into_series()
}

pub struct AlphaVantageClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, BiastraderError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, BiastraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BiastraderError::DataSourceUnavailable {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn fetch_daily(&self, symbol: &str) -> Result<PriceSeries, BiastraderError> {
        let mut response = decode(&self.request(symbol, "full")?)?;
        if response.full_output_refused() {
            tracing::warn!(symbol, "outputsize=full is premium; retrying with compact");
            response = decode(&self.request(symbol, "compact")?)?;
        }
        let series = response.into_series()?;
        tracing::info!(
            symbol,
            points = series.len(),
            first = %series.first().date,
            last = %series.last().date,
            "fetched daily closes"
        );
        Ok(series)
    }

    fn request(&self, symbol: &str, output_size: &str) -> Result<String, BiastraderError> {
        tracing::debug!(symbol, output_size, "requesting daily series");
        self.client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", output_size),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| BiastraderError::DataSourceUnavailable {
                reason: format!("request for {} failed: {}", symbol, e.without_url()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{
        "Meta Data": {"2. Symbol": "IBM"},
        "Time Series (Daily)": {
            "2024-03-05": {"1. open": "190.0", "4. close": "191.95", "5. volume": "100"},
            "2024-03-04": {"1. open": "187.0", "4. close": "193.06", "5. volume": "100"},
            "2024-03-01": {"1. open": "185.5", "4. close": "187.50", "5. volume": "100"}
        }
    }"#;

    #[test]
    fn parses_and_sorts_closes() {
        let series = parse_daily_series(SAMPLE).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.first().date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(series.first().close, 187.5);
        assert_eq!(series.last().close, 191.95);
    }

    #[test]
    fn rate_limit_note_is_surfaced() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        match parse_daily_series(body).unwrap_err() {
            BiastraderError::UnexpectedSchema { reason } => {
                assert!(reason.contains("call frequency"))
            }
            other => panic!("expected UnexpectedSchema, got {other:?}"),
        }
    }

    #[test]
    fn error_message_is_surfaced() {
        let body = r#"{"Error Message": "Invalid API call."}"#;
        match parse_daily_series(body).unwrap_err() {
            BiastraderError::UnexpectedSchema { reason } => {
                assert_eq!(reason, "API error: Invalid API call.")
            }
            other => panic!("expected UnexpectedSchema, got {other:?}"),
        }
    }

    #[test]
    fn missing_series_and_bad_json_are_schema_errors() {
        assert!(matches!(
            parse_daily_series("{}"),
            Err(BiastraderError::UnexpectedSchema { .. })
        ));
        assert!(matches!(
            parse_daily_series("<html>"),
            Err(BiastraderError::UnexpectedSchema { .. })
        ));
    }

    #[test]
    fn empty_series_and_bad_close() {
        assert!(matches!(
            parse_daily_series(r#"{"Time Series (Daily)": {}}"#),
            Err(BiastraderError::EmptySeries)
        ));
        let body = r#"{"Time Series (Daily)": {"2024-03-01": {"4. close": "n/a"}}}"#;
        assert!(matches!(
            parse_daily_series(body),
            Err(BiastraderError::MalformedRow { line: 1, .. })
        ));
    }

    #[test]
    fn premium_notice_requests_compact() {
        let refused = decode(
            r#"{"Information": "The outputsize=full parameter value is a premium feature."}"#,
        )
        .unwrap();
        assert!(refused.full_output_refused());

        let limited = decode(r#"{"Information": "API rate limit reached."}"#).unwrap();
        assert!(!limited.full_output_refused());

        assert!(!decode(SAMPLE).unwrap().full_output_refused());
    }

    #[test]
    fn unreachable_host_is_unavailable() {
        let client = AlphaVantageClient::with_base_url("demo", "http://127.0.0.1:9/query").unwrap();
        assert!(matches!(
            client.fetch_daily("IBM"),
            Err(BiastraderError::DataSourceUnavailable { .. })
        ));
    }
}
