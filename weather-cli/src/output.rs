use chrono::Local;
use weather_core::{ConditionCategory, CurrentWeather};

fn glyph(category: ConditionCategory) -> &'static str {
    match category {
        ConditionCategory::Thunderstorm => "⛈",
        ConditionCategory::Drizzle => "🌦",
        ConditionCategory::Rain => "🌧",
        ConditionCategory::Snow => "🌨",
        ConditionCategory::Fog => "🌫",
        ConditionCategory::Clear => "☀",
        ConditionCategory::Cloudy => "☁",
        ConditionCategory::Unknown => "?",
    }
}

pub fn render_text(weather: &CurrentWeather) -> String {
    let category = weather.category();
    let mut out = format!(
        "{}, {}\n  {}  {}\n  {}°C  (feels like {}°C)\n  MIN {}°C   MAX {}°C",
        weather.city_name,
        weather.country,
        glyph(category),
        category.description(),
        weather.temperature_string(),
        weather.feels_like_temperature_string(),
        weather.minimum_temperature_string(),
        weather.maximum_temperature_string(),
    );

    if let Some(observed) = weather.observed_at {
        let local = observed.with_timezone(&Local);
        out.push_str(&format!("\n  observed {}", local.format("%Y-%m-%d %H:%M")));
    }

    out
}

pub fn render_json(weather: &CurrentWeather) -> serde_json::Result<String> {
    let value = serde_json::json!({
        "weather": weather,
        "category": weather.category(),
        "icon": weather.category().icon_name(),
        "display": {
            "temperature": weather.temperature_string(),
            "feels_like": weather.feels_like_temperature_string(),
            "min": weather.minimum_temperature_string(),
            "max": weather.maximum_temperature_string(),
        },
    });
    serde_json::to_string_pretty(&value)
}
