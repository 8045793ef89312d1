use chrono::{DateTime, Utc};

use crate::{
    Config,
    advisory::{AdvisoryGenerator, backend::OllamaGenerator},
    error::PipelineError,
    model::{Advisory, ForecastWindow, NotificationReceipt},
    notify::{NotificationDispatcher, dispatcher_from_config},
    provider::{ForecastProvider, provider_from_config},
    window,
};

/// Delivery settings applied to every run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub hours_ahead: usize,
    pub title: String,
    pub sound: String,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hours_ahead: config.forecast.hours_ahead,
            title: config.notification.title.clone(),
            sound: config.notification.sound.clone(),
        }
    }
}

/// Fetch → select → generate → dispatch, stopping at the first failure.
#[derive(Debug)]
pub struct PipelineRunner {
    provider: Box<dyn ForecastProvider>,
    generator: AdvisoryGenerator,
    dispatcher: NotificationDispatcher,
    settings: RunSettings,
}

impl PipelineRunner {
    pub fn new(
        provider: Box<dyn ForecastProvider>,
        generator: AdvisoryGenerator,
        dispatcher: NotificationDispatcher,
        settings: RunSettings,
    ) -> Self {
        Self { provider, generator, dispatcher, settings }
    }

    /// Build every stage from a validated config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let provider = provider_from_config(config)?;
        let backend = OllamaGenerator::new(config.generator_hostname()?, &config.generator)?;
        let dispatcher = dispatcher_from_config(config)?;

        Ok(Self::new(
            provider,
            AdvisoryGenerator::new(Box::new(backend)),
            dispatcher,
            RunSettings::from_config(config),
        ))
    }

    /// Run all three stages for `now` and return the delivery receipt.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<NotificationReceipt, PipelineError> {
        let advisory = self.preview(now).await?;

        tracing::info!(stage = "delivery", "dispatching notification");
        let receipt = self
            .dispatcher
            .dispatch(&advisory, &self.settings.title, &self.settings.sound)
            .await?;

        tracing::info!(stage = "delivery", request = ?receipt.request, "notification delivered");
        Ok(receipt)
    }

    /// Run the forecast and generation stages without sending anything.
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<Advisory, PipelineError> {
        let window = self.select_window(now).await?;

        tracing::info!(stage = "generation", points = window.len(), "generating advisory");
        let advisory = self.generator.generate(&window).await?;
        tracing::info!(stage = "generation", umbrella = %advisory.umbrella, "advisory ready");

        Ok(advisory)
    }

    async fn select_window(&self, now: DateTime<Utc>) -> Result<ForecastWindow, PipelineError> {
        tracing::info!(stage = "forecast", %now, "fetching forecast series");
        let series = self.provider.fetch_series().await?;

        let window = window::select(&series, now, self.settings.hours_ahead);
        match window.first() {
            Some(first) => tracing::info!(
                stage = "window",
                series = series.len(),
                points = window.len(),
                starts_at = %first.timestamp(),
                "forecast window selected"
            ),
            None => tracing::warn!(stage = "window", "forecast series is empty"),
        }

        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_rejects_incomplete_config() {
        let err = PipelineRunner::from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No location configured"));
    }

    #[test]
    fn from_config_builds_with_complete_config() {
        let mut cfg = Config::default();
        cfg.set_location(51.406, 0.015).expect("valid coordinates");
        cfg.generator.hostname = Some("localhost:11434".into());
        cfg.notification.api_token = Some("TOKEN".into());
        cfg.notification.user_key = Some("USER".into());

        assert!(PipelineRunner::from_config(&cfg).is_ok());
    }

    #[test]
    fn run_settings_come_from_config() {
        let mut cfg = Config::default();
        cfg.forecast.hours_ahead = 3;
        cfg.notification.sound = "siren".into();

        let settings = RunSettings::from_config(&cfg);
        assert_eq!(settings.hours_ahead, 3);
        assert_eq!(settings.title, "Clothing Suggestion");
        assert_eq!(settings.sound, "siren");
    }
}
