//! Core library for the `outfit` clothing advisory.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast provider abstraction and the Open-Meteo client
//! - Forecast window selection
//! - Rule-constrained advisory generation on top of a text generation backend
//! - Notification dispatch
//! - The pipeline that sequences the stages for a single run
//!
//! It is used by `outfit-cli`, but can also be driven by other schedulers.

pub mod advisory;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod provider;
pub mod window;

pub use advisory::{AdvisoryGenerator, backend::TextGenerator};
pub use config::{Config, ForecastConfig, GeneratorConfig, LocationConfig, NotificationConfig};
pub use error::{PipelineError, Stage};
pub use model::{
    Advisory, ForecastPoint, ForecastWindow, NotificationReceipt, NotificationRequest, Umbrella,
};
pub use notify::{NotificationDispatcher, Notifier};
pub use pipeline::{PipelineRunner, RunSettings};
pub use provider::ForecastProvider;
