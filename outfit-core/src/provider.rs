use crate::{Config, error::PipelineError, model::ForecastPoint, provider::openmeteo::OpenMeteoProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openmeteo;

/// Source of the hourly forecast series for the configured location.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Fetch the full hourly series, ordered by time.
    async fn fetch_series(&self) -> Result<Vec<ForecastPoint>, PipelineError>;
}

/// Construct the forecast provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let location = config.location()?.clone();
    location.validate()?;

    let provider = OpenMeteoProvider::new(location, config.forecast.clone())?;
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_location_missing() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();

        assert!(err.to_string().contains("No location configured"));
    }

    #[test]
    fn provider_from_config_rejects_invalid_coordinates() {
        let mut cfg = Config::default();
        cfg.location = Some(crate::config::LocationConfig {
            latitude: 99.406,
            longitude: 0.015,
            timezone: "Europe/London".into(),
        });

        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn provider_from_config_works_with_location() {
        let mut cfg = Config::default();
        cfg.set_location(51.406, 0.015).expect("valid coordinates");

        assert!(provider_from_config(&cfg).is_ok());
    }
}
