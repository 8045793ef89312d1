//! Failure taxonomy for a pipeline run.

use thiserror::Error;

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Forecast,
    Window,
    Generation,
    Delivery,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Forecast => "forecast",
            Stage::Window => "window",
            Stage::Generation => "generation",
            Stage::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Forecast provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Forecast timestamps are not in a single time frame: {0}")]
    ClockFrameMismatch(String),

    #[error("No forecast data available for the requested window")]
    WindowEmpty,

    #[error("Text generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Text generation request rejected with status {status}: {body}")]
    GenerationRejected { status: u16, body: String },

    #[error("Text generation reply is malformed: {reason}")]
    GenerationMalformed { reason: String, raw: String },

    #[error("Notification rejected with status {status}: {body}")]
    DeliveryRejected { status: u16, body: String },

    #[error("Notification endpoint unreachable: {0}")]
    DeliveryUnreachable(String),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Config,
            Self::ProviderUnavailable(_) | Self::ClockFrameMismatch(_) => Stage::Forecast,
            Self::WindowEmpty => Stage::Window,
            Self::GenerationUnavailable(_)
            | Self::GenerationRejected { .. }
            | Self::GenerationMalformed { .. } => Stage::Generation,
            Self::DeliveryRejected { .. } | Self::DeliveryUnreachable(_) => Stage::Delivery,
        }
    }

    /// Only an unreachable generation backend gets a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationUnavailable(_))
    }
}

/// Describe a transport failure, calling out timeouts explicitly.
pub(crate) fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
