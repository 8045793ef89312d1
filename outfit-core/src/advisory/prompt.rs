use crate::model::ForecastWindow;

use super::rules::{Assessment, LAYERING_SPREAD_C, RAIN_THRESHOLD_PCT, WIND_THRESHOLD_KMH};

/// Build the instruction prompt for a window and its contract assessment.
pub fn build_prompt(
    window: &ForecastWindow,
    assessment: &Assessment,
) -> Result<String, serde_json::Error> {
    let forecast_json = serde_json::to_string_pretty(window)?;

    Ok(format!(
        "You are a clothing suggestion assistant.\n\
         \n\
         Analyze the forecast JSON and give a short, human-friendly recommendation.\n\
         \n\
         Rules:\n\
         - Always reply in exactly this fixed style, one section per line, nothing else:\n\
         Summary: <short summary>\n\
         Clothing: <what to wear>\n\
         Umbrella: <yes/no>\n\
         Accessories: <comma-separated list, or none>\n\
         \n\
         Guidelines:\n\
         - Temperature (°C), judged on feels_like_c before temperature_c:\n\
         - Cold < 12 → heavy jacket, layers\n\
         - Cool 12–18 → light jacket or sweater\n\
         - Mild 18–24 → light clothing\n\
         - Hot > 24 → shorts, breathable clothing\n\
         - Rain chance > {rain}% → Umbrella: yes, otherwise Umbrella: no\n\
         - Wind > {wind} km/h → mention a jacket or windbreaker for wind protection\n\
         - If temperatures vary by more than {spread}°C → suggest layers\n\
         \n\
         Facts already derived from the forecast (your reply must agree):\n\
         - Temperature band: {band}\n\
         - Umbrella: {umbrella}\n\
         - Wind protection needed: {wind_needed}\n\
         - Layering needed: {layers_needed}\n\
         - Conditions: {conditions}\n\
         \n\
         Input forecast (JSON list):\n\
         ```json\n\
         {forecast_json}\n\
         ```",
        rain = RAIN_THRESHOLD_PCT,
        wind = WIND_THRESHOLD_KMH,
        spread = LAYERING_SPREAD_C,
        band = assessment.band.label(),
        umbrella = assessment.umbrella,
        wind_needed = yes_no(assessment.wind_protection),
        layers_needed = yes_no(assessment.layering),
        conditions = assessment.conditions,
    ))
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::rules::assess;
    use crate::model::ForecastPoint;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn prompt_carries_rules_facts_and_forecast() {
        let ts = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 5, 7, 0, 0).unwrap();
        let window = ForecastWindow::new(vec![ForecastPoint::new(ts, 8.0, 5.0, 20.0, Some(60))]);
        let assessment = assess(&window).unwrap();

        let prompt = build_prompt(&window, &assessment).expect("prompt");

        assert!(prompt.contains("Summary: <short summary>"));
        assert!(prompt.contains("Rain chance > 40%"));
        assert!(prompt.contains("Wind > 15 km/h"));
        assert!(prompt.contains("Temperature band: cold"));
        assert!(prompt.contains("Umbrella: yes\n"));
        assert!(prompt.contains("Wind protection needed: yes"));
        assert!(prompt.contains("\"time\": \"2024-01-05T07:00:00"));
        assert!(prompt.contains("\"rain_chance_pct\": 60"));
    }
}
