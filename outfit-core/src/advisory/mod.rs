//! Turns a forecast window into a structured [`Advisory`].
//!
//! The text generation backend supplies the wording; [`rules`] decides the
//! facts. After parsing, the reply is corrected so that the umbrella verdict,
//! wind protection, layering and temperature band always match the window.

pub mod backend;
pub mod parse;
pub mod prompt;
pub mod rules;

use crate::{
    error::PipelineError,
    model::{Advisory, ForecastWindow},
};

use backend::TextGenerator;
use parse::{ParsedReply, parse_reply};
use rules::{Assessment, WIND_PROTECTION_ITEMS, assess, mentions_any};

const WIND_ACCESSORY: &str = "windbreaker";
const UMBRELLA_ACCESSORY: &str = "umbrella";
const LAYERING_CLAUSE: &str = "wear layers you can take off as the temperature changes";

#[derive(Debug)]
pub struct AdvisoryGenerator {
    backend: Box<dyn TextGenerator>,
}

impl AdvisoryGenerator {
    pub fn new(backend: Box<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Generate an advisory for `window`.
    ///
    /// An empty window fails with [`PipelineError::WindowEmpty`] without
    /// calling the backend. An unreachable backend is retried once.
    pub async fn generate(&self, window: &ForecastWindow) -> Result<Advisory, PipelineError> {
        let assessment = assess(window).ok_or(PipelineError::WindowEmpty)?;

        let prompt = prompt::build_prompt(window, &assessment).map_err(|e| {
            PipelineError::GenerationMalformed {
                reason: format!("failed to encode forecast window: {e}"),
                raw: String::new(),
            }
        })?;

        let raw = self.complete_with_retry(&prompt).await?;
        tracing::debug!(reply = %raw, "generation reply");

        let reply = parse_reply(&raw)?;
        Ok(enforce(reply, assessment))
    }

    async fn complete_with_retry(&self, prompt: &str) -> Result<String, PipelineError> {
        match self.backend.complete(prompt).await {
            Err(err) if err.is_retryable() => {
                tracing::warn!(error = %err, "generation backend unavailable, retrying once");
                self.backend.complete(prompt).await
            }
            other => other,
        }
    }
}

/// Correct a parsed reply so it satisfies the contract for `assessment`.
///
/// Free text is never taken as evidence of compliance: the band phrase leads
/// the clothing advice, the layering clause and wind protection are added
/// verbatim unless already present, and umbrella accessories follow the
/// verdict in both directions.
pub fn enforce(reply: ParsedReply, assessment: Assessment) -> Advisory {
    let ParsedReply { summary, mut clothing, umbrella, mut accessories } = reply;

    if umbrella != assessment.umbrella {
        tracing::info!(
            generated = %umbrella,
            required = %assessment.umbrella,
            "overriding umbrella verdict"
        );
    }

    let canonical = assessment.band.canonical_clothing();
    if !clothing.to_lowercase().starts_with(&canonical.to_lowercase()) {
        clothing = format!("{canonical}. {clothing}");
    }

    if assessment.layering && !clothing.to_lowercase().contains(LAYERING_CLAUSE) {
        clothing.push_str("; ");
        clothing.push_str(LAYERING_CLAUSE);
    }

    if assessment.wind_protection
        && !accessories.iter().any(|a| mentions_any(a, WIND_PROTECTION_ITEMS))
    {
        accessories.push(WIND_ACCESSORY.to_string());
    }

    let is_umbrella = |a: &String| mentions_any(a, &[UMBRELLA_ACCESSORY]);
    if assessment.umbrella.is_needed() {
        if !accessories.iter().any(is_umbrella) {
            accessories.insert(0, UMBRELLA_ACCESSORY.to_string());
        }
    } else {
        accessories.retain(|a| !is_umbrella(a));
    }

    Advisory {
        summary,
        clothing,
        umbrella: assessment.umbrella,
        accessories,
        conditions: assessment.conditions,
    }
}
