//! Interpretation contract mapping a forecast window to clothing constraints.
//!
//! The generator's free text is checked against (and corrected by) these rules,
//! so the umbrella verdict, wind protection and layering advice never depend
//! on how the backend phrased its reply.

use crate::model::{ForecastWindow, Umbrella};

/// Rain chance above this (strictly) requires an umbrella.
pub const RAIN_THRESHOLD_PCT: u8 = 40;
/// Wind above this (strictly) requires wind protection.
pub const WIND_THRESHOLD_KMH: f64 = 15.0;
/// Temperature spread above this (strictly) requires layering.
pub const LAYERING_SPREAD_C: f64 = 5.0;

/// Accessory names that count as wind protection.
pub const WIND_PROTECTION_ITEMS: &[&str] =
    &["windbreaker", "windproof", "wind-resistant", "wind resistant"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    /// Below 12 °C.
    Cold,
    /// 12 °C up to (excluding) 18 °C.
    Cool,
    /// 18 °C up to and including 24 °C.
    Mild,
    /// Above 24 °C.
    Hot,
}

impl TemperatureBand {
    pub fn from_celsius(t: f64) -> Self {
        if t < 12.0 {
            Self::Cold
        } else if t < 18.0 {
            Self::Cool
        } else if t <= 24.0 {
            Self::Mild
        } else {
            Self::Hot
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Cool => "cool",
            Self::Mild => "mild",
            Self::Hot => "hot",
        }
    }

    /// Phrase that always leads the clothing advice for this band.
    pub fn canonical_clothing(&self) -> &'static str {
        match self {
            Self::Cold => "Heavy jacket with warm layers",
            Self::Cool => "Light jacket or sweater",
            Self::Mild => "Light clothing",
            Self::Hot => "Shorts and breathable clothing",
        }
    }
}

/// What the contract demands of an advisory for a given window.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub band: TemperatureBand,
    pub umbrella: Umbrella,
    pub wind_protection: bool,
    pub layering: bool,
    pub conditions: String,
}

/// Evaluate the contract over a non-empty window. Returns `None` for an empty one.
///
/// The coldest feels-like value picks the band. Missing rain chances count as
/// no rain.
pub fn assess(window: &ForecastWindow) -> Option<Assessment> {
    let points = window.points();
    if points.is_empty() {
        return None;
    }

    let temp = Range::over(points.iter().map(|p| p.temperature_c()));
    let feels = Range::over(points.iter().map(|p| p.feels_like_c()));
    let wind = Range::over(points.iter().map(|p| p.wind_speed_kmh()));
    let max_rain = points.iter().filter_map(|p| p.rain_chance_pct()).max();

    let spread = temp.max.max(feels.max) - temp.min.min(feels.min);

    let conditions = format!(
        "{}°C, feels like {}°C, wind {} km/h, rain chance {}",
        temp.render(),
        feels.render(),
        wind.render(),
        max_rain.map_or_else(|| "n/a".to_string(), |r| format!("{r}%")),
    );

    Some(Assessment {
        band: TemperatureBand::from_celsius(feels.min),
        umbrella: Umbrella::from(max_rain.is_some_and(|r| r > RAIN_THRESHOLD_PCT)),
        wind_protection: wind.max > WIND_THRESHOLD_KMH,
        layering: spread > LAYERING_SPREAD_C,
        conditions,
    })
}

/// Case-insensitive check for any keyword in `text`.
pub fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn over(values: impl Iterator<Item = f64>) -> Self {
        values.fold(Range { min: f64::INFINITY, max: f64::NEG_INFINITY }, |acc, v| Range {
            min: acc.min.min(v),
            max: acc.max.max(v),
        })
    }

    fn render(&self) -> String {
        // `+ 0.0` turns -0 into 0
        let (lo, hi) = (self.min.round() + 0.0, self.max.round() + 0.0);
        if lo == hi { format!("{lo}") } else { format!("{lo}–{hi}") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastPoint;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn window(samples: &[(f64, f64, f64, Option<u8>)]) -> ForecastWindow {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 10, 7, 0, 0)
            .unwrap();
        ForecastWindow::new(
            samples
                .iter()
                .enumerate()
                .map(|(i, &(temp, feels, wind, rain))| {
                    ForecastPoint::new(start + Duration::hours(i as i64), temp, feels, wind, rain)
                })
                .collect(),
        )
    }

    #[test]
    fn empty_window_has_no_assessment() {
        assert!(assess(&ForecastWindow::default()).is_none());
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(TemperatureBand::from_celsius(11.9), TemperatureBand::Cold);
        assert_eq!(TemperatureBand::from_celsius(12.0), TemperatureBand::Cool);
        assert_eq!(TemperatureBand::from_celsius(17.9), TemperatureBand::Cool);
        assert_eq!(TemperatureBand::from_celsius(18.0), TemperatureBand::Mild);
        assert_eq!(TemperatureBand::from_celsius(24.0), TemperatureBand::Mild);
        assert_eq!(TemperatureBand::from_celsius(24.1), TemperatureBand::Hot);
    }

    #[test]
    fn feels_like_drives_the_band() {
        let a = assess(&window(&[(14.0, 10.0, 5.0, None)])).unwrap();
        assert_eq!(a.band, TemperatureBand::Cold);
    }

    #[test]
    fn coldest_point_drives_the_band() {
        let a = assess(&window(&[(20.0, 20.0, 5.0, None), (17.0, 16.5, 5.0, None)])).unwrap();
        assert_eq!(a.band, TemperatureBand::Cool);
    }

    #[test]
    fn rain_at_threshold_needs_no_umbrella() {
        let a = assess(&window(&[(15.0, 15.0, 5.0, Some(40)), (15.0, 15.0, 5.0, Some(10))])).unwrap();
        assert_eq!(a.umbrella, Umbrella::No);
    }

    #[test]
    fn rain_above_threshold_anywhere_needs_umbrella() {
        let a = assess(&window(&[(15.0, 15.0, 5.0, Some(0)), (15.0, 15.0, 5.0, Some(41))])).unwrap();
        assert_eq!(a.umbrella, Umbrella::Yes);
    }

    #[test]
    fn missing_rain_counts_as_dry() {
        let a = assess(&window(&[(15.0, 15.0, 5.0, None)])).unwrap();
        assert_eq!(a.umbrella, Umbrella::No);
        assert!(a.conditions.ends_with("rain chance n/a"));
    }

    #[test]
    fn wind_threshold_is_strict() {
        let calm = assess(&window(&[(15.0, 15.0, 15.0, None)])).unwrap();
        assert!(!calm.wind_protection);

        let windy = assess(&window(&[(15.0, 15.0, 5.0, None), (15.0, 15.0, 15.1, None)])).unwrap();
        assert!(windy.wind_protection);
    }

    #[test]
    fn layering_follows_spread() {
        let steady = assess(&window(&[(15.0, 14.0, 5.0, None), (17.0, 16.0, 5.0, None)])).unwrap();
        assert!(!steady.layering);

        let varied = assess(&window(&[(10.0, 8.0, 5.0, None), (16.0, 15.0, 5.0, None)])).unwrap();
        assert!(varied.layering);
    }

    #[test]
    fn conditions_summarise_ranges() {
        let a = assess(&window(&[(8.0, 5.0, 20.0, Some(60)), (11.0, 9.0, 12.0, Some(30))])).unwrap();
        assert_eq!(a.conditions, "8–11°C, feels like 5–9°C, wind 12–20 km/h, rain chance 60%");
    }

    #[test]
    fn mentions_any_ignores_case() {
        assert!(mentions_any("Bring a WINDBREAKER", WIND_PROTECTION_ITEMS));
        assert!(!mentions_any("Sunglasses", WIND_PROTECTION_ITEMS));
    }

    #[test]
    fn plain_wind_talk_is_not_protection() {
        assert!(!mentions_any("the wind is calm", WIND_PROTECTION_ITEMS));
        assert!(!mentions_any("rain shell", WIND_PROTECTION_ITEMS));
    }
}
