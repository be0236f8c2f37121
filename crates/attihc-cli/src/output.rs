//! Plain-text rendering for terminal output.

use chrono::{DateTime, Local};

use attihc_core::date::HeatCell;
use attihc_core::insights::WEEKDAY_NAMES;
use attihc_core::{Appearance, DayEntry, DayField, Feature, Insights, Settings};

fn created(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Join lines with a trailing newline, ready for `print!`.
fn block(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One day, filled fields only.
pub fn entry(entry: &DayEntry) -> String {
    let star = if entry.favorite { " *" } else { "" };
    let mut lines = vec![format!(
        "{}{}  (created {})",
        entry.date(),
        star,
        created(entry.created_at())
    )];

    for field in DayField::ALL {
        let text = entry.field(field).trim();
        let label = format!("{}:", field.label());
        for (i, line) in text.lines().enumerate() {
            let prefix = if i == 0 { label.as_str() } else { "" };
            lines.push(format!("  {:<14} {}", prefix, line));
        }
    }
    block(lines)
}

pub fn streak(days: u32) -> String {
    match days {
        0 => "no streak yet".to_string(),
        1 => "1 day".to_string(),
        n => format!("{} days", n),
    }
}

/// Activity strip, oldest day on the left.
pub fn heat(cells: &[HeatCell]) -> String {
    cells
        .iter()
        .map(|c| if c.active { '#' } else { '.' })
        .collect()
}

pub fn insights(stats: &Insights) -> String {
    let mut lines = vec![
        format!("Entries:        {}", stats.total_entries),
        format!("Words:          {}", stats.total_words),
        format!("Avg words/day:  {}", stats.avg_words),
    ];

    if let Some(day) = stats.busiest_weekday() {
        lines.push(format!("Busiest day:    {}", WEEKDAY_NAMES[day]));
    }
    if let Some(hour) = stats.busiest_hour() {
        lines.push(format!("Busiest hour:   {:02}:00", hour));
    }

    let peak = stats.day_of_week_counts.iter().copied().max().unwrap_or(0);
    if peak > 0 {
        lines.push(String::new());
        for (name, count) in WEEKDAY_NAMES.iter().zip(stats.day_of_week_counts) {
            let width = (count as usize * 20).div_ceil(peak as usize);
            lines.push(format!("  {} {:<20} {}", name, "#".repeat(width), count));
        }
    }
    block(lines)
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

pub fn settings(settings: &Settings, appearance: Appearance) -> String {
    let mut lines = vec![
        format!("Reset hour:  {:02}:00", settings.reset_hour),
        format!(
            "Theme:       {} ({})",
            settings.theme,
            if appearance.is_dark() { "dark" } else { "light" }
        ),
        format!("Quiet:       {}", on_off(settings.quiet)),
        format!("Shortcuts:   {}", on_off(settings.shortcuts)),
        format!(
            "Passcode:    {}",
            if settings.passcode.is_some() { "set" } else { "not set" }
        ),
        "Features:".to_string(),
    ];
    lines.extend(Feature::ALL.iter().map(|feature| {
        format!(
            "  {:<18} {}",
            feature.key(),
            on_off(settings.features.get(*feature))
        )
    }));
    block(lines)
}
