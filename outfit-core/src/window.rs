use chrono::{DateTime, Utc};

use crate::model::{ForecastPoint, ForecastWindow};

/// Select the forecast window for `now`.
///
/// The window starts at the first point whose timestamp is at or after `now`
/// and holds at most `hours_ahead` points. When every point is in the past the
/// window starts at the beginning of the series instead. An empty series gives
/// an empty window.
pub fn select(series: &[ForecastPoint], now: DateTime<Utc>, hours_ahead: usize) -> ForecastWindow {
    let hours_ahead = hours_ahead.max(1);

    let start = series
        .iter()
        .position(|p| p.timestamp().with_timezone(&Utc) >= now)
        .unwrap_or(0);

    let end = start.saturating_add(hours_ahead).min(series.len());

    ForecastWindow::new(series[start..end].to_vec())
}
