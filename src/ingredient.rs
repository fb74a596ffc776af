//! Parsing of free-text ingredient lines and schema.org durations.

use crate::model::Ingredient;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUANTITY: Regex =
        Regex::new(r"(?i)^([\d\s\.\-/]+(?:\s*to\s*[\d\.\-/]+)?)\s*").unwrap();
    static ref UNIT: Regex = Regex::new(
        r"(?i)^(cup|cups|tablespoon|tablespoons|tbsp|teaspoon|teaspoons|tsp|pound|pounds|lb|lbs|ounce|ounces|oz|gram|grams|g|kg|ml|liter|liters|l|piece|pieces|clove|cloves|can|cans|package|packages|bunch|bunches|pinch|dash|handful|stick|sticks)s?\s+"
    )
    .unwrap();
    static ref TRAILING_PARENS: Regex = Regex::new(r"\s*\(([^)]*)\)\s*$").unwrap();
    static ref ISO_DURATION: Regex =
        Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap();
    static ref FIRST_INTEGER: Regex = Regex::new(r"(\d+)").unwrap();
}

/// Split a line like `"2 cups all-purpose flour (sifted)"` into quantity,
/// unit, name and notes. Lines without a leading quantity keep their full
/// text as the name.
pub fn parse_ingredient(line: &str) -> Ingredient {
    let line = line.trim();
    let mut quantity = None;
    let mut unit = None;
    let mut name = line;

    if let Some(caps) = QUANTITY.captures(line) {
        let amount = caps[1].trim();
        if amount.chars().any(|c| c.is_ascii_digit()) {
            quantity = Some(amount.to_string());
            let remaining = line[caps[0].len()..].trim();
            name = remaining;
            if let Some(unit_caps) = UNIT.captures(remaining) {
                unit = Some(unit_caps[0].trim().to_string());
                name = remaining[unit_caps[0].len()..].trim();
            }
        }
    }

    let mut notes = None;
    let mut clean = name.to_string();
    if let Some(caps) = TRAILING_PARENS.captures(name) {
        let inner = caps[1].trim();
        if !inner.is_empty() {
            notes = Some(inner.to_string());
        }
        clean = name[..caps.get(0).map_or(name.len(), |m| m.start())].to_string();
    }
    let clean = clean.trim_end_matches(',').trim();

    Ingredient {
        quantity,
        unit,
        name: if clean.is_empty() {
            line.to_string()
        } else {
            clean.to_string()
        },
        notes,
        estimated_cost: None,
    }
}

/// Render an ISO-8601 duration (`PT1H30M`) as `"1 hour 30 min"`.
///
/// Values that are not ISO durations are returned unchanged.
pub fn parse_iso_duration(duration: &str) -> String {
    let duration = duration.trim();
    if !duration.starts_with('P') {
        return duration.to_string();
    }
    let Some(caps) = ISO_DURATION.captures(duration) else {
        return duration.to_string();
    };

    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    let mut parts = Vec::new();
    if let Some(days) = number(1) {
        parts.push(format!("{} day{}", days, if days > 1 { "s" } else { "" }));
    }
    if let Some(hours) = number(2) {
        parts.push(format!("{} hour{}", hours, if hours > 1 { "s" } else { "" }));
    }
    let minutes = number(3);
    if let Some(minutes) = minutes {
        parts.push(format!("{} min", minutes));
    }
    if let (Some(seconds), None) = (number(4), minutes) {
        parts.push(format!("{} sec", seconds));
    }

    if parts.is_empty() {
        duration.to_string()
    } else {
        parts.join(" ")
    }
}

/// First run of digits in `text`, e.g. `"4 servings"` -> 4.
pub fn first_integer(text: &str) -> Option<i64> {
    FIRST_INTEGER
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}
