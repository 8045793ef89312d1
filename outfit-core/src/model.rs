use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One hourly forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    #[serde(rename = "time")]
    timestamp: DateTime<FixedOffset>,
    temperature_c: f64,
    feels_like_c: f64,
    wind_speed_kmh: f64,
    rain_chance_pct: Option<u8>,
}

impl ForecastPoint {
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        temperature_c: f64,
        feels_like_c: f64,
        wind_speed_kmh: f64,
        rain_chance_pct: Option<u8>,
    ) -> Self {
        Self { timestamp, temperature_c, feels_like_c, wind_speed_kmh, rain_chance_pct }
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn feels_like_c(&self) -> f64 {
        self.feels_like_c
    }

    pub fn wind_speed_kmh(&self) -> f64 {
        self.wind_speed_kmh
    }

    pub fn rain_chance_pct(&self) -> Option<u8> {
        self.rain_chance_pct
    }
}

/// Contiguous run of forecast points starting at (or after) the selection instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForecastWindow {
    points: Vec<ForecastPoint>,
}

impl ForecastWindow {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ForecastPoint> {
        self.points.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Umbrella {
    Yes,
    No,
}

impl Umbrella {
    pub fn as_str(&self) -> &'static str {
        match self {
            Umbrella::Yes => "yes",
            Umbrella::No => "no",
        }
    }

    pub fn is_needed(&self) -> bool {
        matches!(self, Umbrella::Yes)
    }
}

impl From<bool> for Umbrella {
    fn from(needed: bool) -> Self {
        if needed { Umbrella::Yes } else { Umbrella::No }
    }
}

impl std::fmt::Display for Umbrella {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured clothing recommendation derived from a forecast window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub summary: String,
    pub clothing: String,
    pub umbrella: Umbrella,
    pub accessories: Vec<String>,
    /// Digest of the window the advisory was built from, e.g.
    /// `"8–11°C, feels like 5–9°C, wind 12–20 km/h, rain chance 60%"`.
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
    pub sound: String,
    pub priority: i8,
}

/// Acknowledgment returned by the notification endpoint on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub status: Option<i64>,
    pub request: Option<String>,
    pub raw: String,
}
