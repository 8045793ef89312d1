use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, Text};
use outfit_core::{Config, PipelineError, PipelineRunner, notify::render_message};
use std::path::PathBuf;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "outfit", version, about = "Twice-daily clothing advice from the weather forecast")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the forecast, generate the advisory and send the notification.
    Run {
        /// Reference instant (RFC 3339); defaults to the current time.
        #[arg(long)]
        now: Option<String>,
    },

    /// Generate and print the advisory without sending it.
    Preview {
        /// Reference instant (RFC 3339); defaults to the current time.
        #[arg(long)]
        now: Option<String>,
    },

    /// Interactively set location, generation host and notification credentials.
    Configure,

    /// Print the path of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Run { now } => {
                let now = parse_now(now.as_deref())?;
                let runner = PipelineRunner::from_config(&load_config(self.config.as_ref())?)?;

                let receipt = runner.run(now).await.inspect_err(report_failure)?;
                println!("{}", receipt_output(&receipt.raw));
            }
            Command::Preview { now } => {
                let now = parse_now(now.as_deref())?;
                let runner = PipelineRunner::from_config(&load_config(self.config.as_ref())?)?;

                let advisory = runner.preview(now).await.inspect_err(report_failure)?;
                println!("{}", render_message(&advisory));
            }
            Command::Configure => configure(self.config.as_ref())?,
            Command::ConfigPath => println!("{}", config_path(self.config.as_ref())?.display()),
        }

        Ok(())
    }
}

fn report_failure(err: &PipelineError) {
    tracing::error!(stage = %err.stage(), error = %err, "pipeline run failed");
}

fn receipt_output(raw: &str) -> String {
    if raw.trim().is_empty() { "{}".to_string() } else { raw.trim().to_string() }
}

fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(Utc::now()),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| {
                format!("Invalid --now value '{s}'. Expected RFC 3339, e.g. 2024-01-15T07:00:00+00:00")
            }),
    }
}

fn config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.clone()),
        None => Config::config_file_path(),
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let cfg = match explicit {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    Ok(cfg.with_env_overrides(|key| std::env::var(key).ok()))
}

fn configure(explicit: Option<&PathBuf>) -> Result<()> {
    let path = config_path(explicit)?;
    let mut cfg = if path.exists() { Config::load_from(&path)? } else { Config::default() };
    let current = cfg.location.clone();

    let mut latitude = CustomType::<f64>::new("Latitude:")
        .with_help_message("Decimal degrees, -90 to 90");
    let mut longitude = CustomType::<f64>::new("Longitude:")
        .with_help_message("Decimal degrees, -180 to 180");
    if let Some(location) = &current {
        latitude = latitude.with_default(location.latitude);
        longitude = longitude.with_default(location.longitude);
    }
    cfg.set_location(latitude.prompt()?, longitude.prompt()?)?;

    let default_timezone = cfg.location()?.timezone.clone();
    let timezone = Text::new("Timezone:").with_default(&default_timezone).prompt()?;
    if let Some(location) = cfg.location.as_mut() {
        location.timezone = timezone;
    }

    cfg.forecast.hours_ahead = CustomType::<usize>::new("Hours ahead to consider:")
        .with_default(cfg.forecast.hours_ahead)
        .prompt()?;

    let current_host = cfg.generator.hostname.clone().unwrap_or_default();
    let mut host_prompt =
        Text::new("Text generation host:").with_help_message("e.g. http://localhost:11434");
    if !current_host.is_empty() {
        host_prompt = host_prompt.with_default(&current_host);
    }
    let hostname = host_prompt.prompt()?;
    cfg.generator.hostname = Some(hostname).filter(|h| !h.trim().is_empty());

    let default_model = cfg.generator.model.clone();
    cfg.generator.model = Text::new("Model:").with_default(&default_model).prompt()?;

    let token = Password::new("Pushover API token (leave empty to keep):")
        .without_confirmation()
        .prompt()?;
    if !token.is_empty() {
        cfg.notification.api_token = Some(token);
    }

    let user = Password::new("Pushover user key (leave empty to keep):")
        .without_confirmation()
        .prompt()?;
    if !user.is_empty() {
        cfg.notification.user_key = Some(user);
    }

    cfg.save_to(&path)?;
    println!("Saved configuration to {}", path.display());

    if let Err(err) = cfg.validate() {
        println!("Note: configuration is not complete yet: {err}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_now_accepts_rfc3339() {
        let now = parse_now(Some("2024-01-15T07:00:00+01:00")).expect("parse");
        assert_eq!(now.to_rfc3339(), "2024-01-15T06:00:00+00:00");
    }

    #[test]
    fn parse_now_rejects_naive_time() {
        let err = parse_now(Some("2024-01-15T07:00:00")).unwrap_err();
        assert!(err.to_string().contains("Invalid --now value"));
    }

    #[test]
    fn run_accepts_now_and_global_config() {
        let cli = Cli::try_parse_from([
            "outfit",
            "run",
            "--now",
            "2024-01-15T07:00:00Z",
            "--config",
            "/tmp/outfit.toml",
        ])
        .expect("parse");

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/outfit.toml")));
        assert!(matches!(cli.command, Command::Run { now: Some(_) }));
    }
}
