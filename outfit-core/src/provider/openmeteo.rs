use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::{ForecastConfig, LocationConfig},
    error::{PipelineError, describe_transport_error, truncate_body},
    model::ForecastPoint,
};

use super::ForecastProvider;

const HOURLY_FIELDS: &str =
    "temperature_2m,precipitation_probability,wind_speed_10m,apparent_temperature";

/// Hourly forecast from the Open-Meteo `/v1/forecast` endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    location: LocationConfig,
    forecast: ForecastConfig,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(location: LocationConfig, forecast: ForecastConfig) -> Result<Self, PipelineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(forecast.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { location, forecast, http })
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch_series(&self) -> Result<Vec<ForecastPoint>, PipelineError> {
        let url = format!("{}/v1/forecast", self.forecast.base_url.trim_end_matches('/'));
        tracing::debug!(%url, latitude = self.location.latitude, longitude = self.location.longitude, "requesting forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", self.location.latitude.to_string()),
                ("longitude", self.location.longitude.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("forecast_days", self.forecast.forecast_days.to_string()),
                ("timezone", self.location.timezone.clone()),
                ("wind_speed_unit", "kmh".to_string()),
                ("timeformat", "unixtime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::ProviderUnavailable(describe_transport_error(&e)))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            PipelineError::ProviderUnavailable(format!(
                "Failed to read Open-Meteo response body: {}",
                describe_transport_error(&e)
            ))
        })?;

        if !status.is_success() {
            return Err(PipelineError::ProviderUnavailable(format!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        decode_series(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    utc_offset_seconds: Option<i32>,
    hourly: OmHourly,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<OmTime>,
    temperature_2m: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Option<Vec<Option<f64>>>,
}

/// Either epoch seconds (`timeformat=unixtime`) or ISO 8601 text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OmTime {
    Unix(i64),
    Text(String),
}

impl OmTime {
    fn label(&self) -> String {
        match self {
            Self::Unix(secs) => secs.to_string(),
            Self::Text(raw) => raw.clone(),
        }
    }
}

/// Decode an Open-Meteo forecast body into an ordered series.
///
/// A missing rain array, or a missing entry in it, leaves the point's rain
/// chance empty. Every other array must line up with `time`.
pub fn decode_series(body: &str) -> Result<Vec<ForecastPoint>, PipelineError> {
    let parsed: OmResponse = serde_json::from_str(body).map_err(|e| {
        PipelineError::ProviderUnavailable(format!("Invalid Open-Meteo response: {e}"))
    })?;

    let offset = parsed
        .utc_offset_seconds
        .map(|secs| {
            FixedOffset::east_opt(secs).ok_or_else(|| {
                PipelineError::ClockFrameMismatch(format!("utc_offset_seconds {secs} is out of range"))
            })
        })
        .transpose()?;

    let hourly = parsed.hourly;
    let len = hourly.time.len();
    for (name, values) in [
        ("temperature_2m", hourly.temperature_2m.len()),
        ("wind_speed_10m", hourly.wind_speed_10m.len()),
        ("apparent_temperature", hourly.apparent_temperature.len()),
    ] {
        if values != len {
            return Err(invalid(format!("{name} has {values} entries but time has {len}")));
        }
    }

    let rain = hourly.precipitation_probability.unwrap_or_default();
    let mut series: Vec<ForecastPoint> = Vec::with_capacity(len);

    for (i, time) in hourly.time.iter().enumerate() {
        let label = time.label();
        let raw_time = label.as_str();
        let timestamp = match time {
            OmTime::Unix(secs) => from_unix(*secs, offset)?,
            OmTime::Text(raw) => parse_timestamp(raw, offset)?,
        };

        if let Some(prev) = series.last() {
            if prev.timestamp() >= timestamp {
                return Err(invalid(format!("time entries are not increasing at {raw_time}")));
            }
        }

        let temperature_c = required(hourly.temperature_2m[i], "temperature_2m", raw_time)?;
        let feels_like_c = required(hourly.apparent_temperature[i], "apparent_temperature", raw_time)?;
        let wind_speed_kmh = required(hourly.wind_speed_10m[i], "wind_speed_10m", raw_time)?;
        if wind_speed_kmh < 0.0 {
            return Err(invalid(format!("negative wind speed {wind_speed_kmh} at {raw_time}")));
        }

        let rain_chance_pct = match rain.get(i).copied().flatten() {
            Some(pct) if (0.0..=100.0).contains(&pct) => Some(pct.round() as u8),
            Some(pct) => {
                return Err(invalid(format!("rain chance {pct} out of range at {raw_time}")));
            }
            None => None,
        };

        series.push(ForecastPoint::new(
            timestamp,
            temperature_c,
            feels_like_c,
            wind_speed_kmh,
            rain_chance_pct,
        ));
    }

    Ok(series)
}

/// Epoch seconds are absolute, so they hold across clock changes; the declared
/// offset only sets how the instant is displayed.
fn from_unix(
    secs: i64,
    offset: Option<FixedOffset>,
) -> Result<DateTime<FixedOffset>, PipelineError> {
    let utc = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| invalid(format!("epoch timestamp {secs} is out of range")))?;
    let display = offset.unwrap_or_else(|| Utc.fix());

    Ok(utc.with_timezone(&display))
}

/// Place a textual provider timestamp in a zone-aware frame.
///
/// Naive local times need the response's declared offset. Times that carry
/// their own offset must agree with it.
fn parse_timestamp(
    raw: &str,
    offset: Option<FixedOffset>,
) -> Result<DateTime<FixedOffset>, PipelineError> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return match offset {
            Some(declared) if *aware.offset() != declared => {
                Err(PipelineError::ClockFrameMismatch(format!(
                    "timestamp {raw} has offset {} but the response declares {declared}",
                    aware.offset()
                )))
            }
            _ => Ok(aware),
        };
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| invalid(format!("unparseable timestamp {raw}: {e}")))?;

    let offset = offset.ok_or_else(|| {
        PipelineError::ClockFrameMismatch(format!(
            "timestamp {raw} has no offset and the response declares none"
        ))
    })?;

    naive.and_local_timezone(offset).single().ok_or_else(|| {
        PipelineError::ClockFrameMismatch(format!("timestamp {raw} is ambiguous at offset {offset}"))
    })
}

fn required(value: Option<f64>, field: &str, at: &str) -> Result<f64, PipelineError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(format!("{field} is missing at {at}"))),
    }
}

fn invalid(reason: String) -> PipelineError {
    PipelineError::ProviderUnavailable(format!("Invalid Open-Meteo response: {reason}"))
}
