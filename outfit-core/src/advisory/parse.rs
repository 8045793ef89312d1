use crate::{error::PipelineError, model::Umbrella};

/// The four sections of a generator reply, before contract enforcement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub summary: String,
    pub clothing: String,
    pub umbrella: Umbrella,
    pub accessories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Clothing,
    Umbrella,
    Accessories,
}

impl Section {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "summary" => Some(Self::Summary),
            "clothing" => Some(Self::Clothing),
            "umbrella" => Some(Self::Umbrella),
            "accessories" | "accessory" => Some(Self::Accessories),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Clothing => "Clothing",
            Self::Umbrella => "Umbrella",
            Self::Accessories => "Accessories",
        }
    }
}

/// Parse a `Label: value` reply into its four sections.
///
/// Labels are matched case-insensitively and may be wrapped in quotes, list
/// markers or markdown emphasis. Lines without a known label are ignored and
/// the first occurrence of each section wins.
pub fn parse_reply(raw: &str) -> Result<ParsedReply, PipelineError> {
    let mut summary = None;
    let mut clothing = None;
    let mut umbrella = None;
    let mut accessories = None;

    for line in raw.lines() {
        let Some((section, value)) = split_line(line) else {
            continue;
        };

        let slot = match section {
            Section::Summary => &mut summary,
            Section::Clothing => &mut clothing,
            Section::Umbrella => &mut umbrella,
            Section::Accessories => &mut accessories,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    let summary = require_text(summary, Section::Summary, raw)?;
    let clothing = require_text(clothing, Section::Clothing, raw)?;
    let umbrella_raw = umbrella.ok_or_else(|| malformed(Section::Umbrella, "missing", raw))?;
    let umbrella = parse_umbrella(&umbrella_raw)
        .ok_or_else(|| malformed(Section::Umbrella, &format!("unrecognised value {umbrella_raw:?}"), raw))?;
    let accessories = accessories.ok_or_else(|| malformed(Section::Accessories, "missing", raw))?;

    Ok(ParsedReply { summary, clothing, umbrella, accessories: split_accessories(&accessories) })
}

fn split_line(line: &str) -> Option<(Section, String)> {
    let line = line.trim().trim_start_matches(['-', '*', '>', '"', '\'', '`', ' ']);
    let (label, value) = line.split_once(':')?;
    let section = Section::from_label(label.trim().trim_matches(['*', '_', ' ']))?;
    Some((section, clean_value(value)))
}

fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(['*', '_', '"', '\'', '`'])
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string()
}

fn require_text(value: Option<String>, section: Section, raw: &str) -> Result<String, PipelineError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        Some(_) => Err(malformed(section, "empty", raw)),
        None => Err(malformed(section, "missing", raw)),
    }
}

fn parse_umbrella(value: &str) -> Option<Umbrella> {
    let word: String = value
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();

    match word.as_str() {
        "yes" | "true" => Some(Umbrella::Yes),
        "no" | "false" => Some(Umbrella::No),
        _ => None,
    }
}

fn split_accessories(value: &str) -> Vec<String> {
    let items: Vec<String> = value
        .split([',', ';'])
        .map(|item| item.trim().trim_end_matches('.').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    match items.as_slice() {
        [only] if matches!(only.to_ascii_lowercase().as_str(), "none" | "n/a" | "nothing" | "-") => {
            Vec::new()
        }
        _ => items,
    }
}

fn malformed(section: Section, problem: &str, raw: &str) -> PipelineError {
    PipelineError::GenerationMalformed {
        reason: format!("{} section is {problem}", section.name()),
        raw: raw.to_string(),
    }
}
