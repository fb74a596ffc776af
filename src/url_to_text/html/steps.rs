use lazy_static::lazy_static;
use regex::Regex;

/// Below this many entries, a block is checked for inline numbering.
pub const MIN_STEP_ENTRIES: usize = 3;

lazy_static! {
    static ref STEP_NUMBER: Regex = Regex::new(r"(?:^|\s)(?:[Ss]tep\s*)?(\d{1,2})[.):]\s+").unwrap();
}

/// Split blocks like `"1. Boil water. 2. Add pasta. 3. Drain."` into
/// separate steps when fewer than [`MIN_STEP_ENTRIES`] entries were found.
///
/// Numbers must run 1, 2, 3, ... so temperatures and times are left alone.
pub fn split_inline_steps(steps: Vec<String>) -> Vec<String> {
    if steps.len() >= MIN_STEP_ENTRIES {
        return steps;
    }
    steps
        .into_iter()
        .flat_map(|step| split_numbered(&step).unwrap_or_else(|| vec![step]))
        .collect()
}

fn split_numbered(text: &str) -> Option<Vec<String>> {
    let markers: Vec<(usize, usize, u32)> = STEP_NUMBER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps[1].parse().ok()?;
            Some((whole.start(), whole.end(), number))
        })
        .collect();

    if markers.len() < 2 {
        return None;
    }
    let sequential = markers
        .iter()
        .enumerate()
        .all(|(i, &(_, _, number))| number as usize == i + 1);
    if !sequential {
        return None;
    }

    let mut steps = Vec::with_capacity(markers.len() + 1);
    let lead = text[..markers[0].0].trim();
    if !lead.is_empty() {
        steps.push(lead.to_string());
    }
    for (i, &(_, body_start, _)) in markers.iter().enumerate() {
        let body_end = markers.get(i + 1).map_or(text.len(), |next| next.0);
        let body = text[body_start..body_end].trim();
        if !body.is_empty() {
            steps.push(body.to_string());
        }
    }
    Some(steps)
}
