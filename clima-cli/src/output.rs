use anyhow::{Context, Result};
use chrono::Local;
use clima_core::{View, WeatherRecord};

/// Multi-line rendering for `clima show`.
pub fn format_view(view: &View, record: Option<&WeatherRecord>) -> String {
    let glyph = view.icon.map(|i| i.glyph()).unwrap_or(" ");
    let mut out = format!("{glyph}  {}", display_city(view));

    if let Some(temperature) = &view.temperature {
        let condition = view
            .icon
            .map(|i| format!("  ({})", i.description()))
            .unwrap_or_default();
        out.push_str(&format!("\n   {temperature}{condition}"));
    }

    if let Some(record) = record {
        let updated = record.fetched_at.with_timezone(&Local).format("%H:%M");
        out.push_str(&format!("\n   updated {updated}"));
    }

    out
}

/// Single-line rendering for the interactive loop.
pub fn format_view_line(view: &View) -> String {
    match (&view.temperature, view.icon) {
        (Some(temperature), Some(icon)) => {
            format!("{}  {}  {temperature}", icon.glyph(), display_city(view))
        }
        _ => display_city(view).to_string(),
    }
}

pub fn print_view(view: &View, record: Option<&WeatherRecord>, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(view)
            .context("Failed to serialize view to JSON")?;
        println!("{json}");
    } else {
        println!("{}", format_view(view, record));
    }
    Ok(())
}

pub fn print_view_line(view: &View) {
    println!("{}", format_view_line(view));
}

/// Providers occasionally omit the city name.
fn display_city(view: &View) -> &str {
    if view.city.is_empty() {
        "Unknown location"
    } else {
        &view.city
    }
}
