use serde_json::Value;

/// Parse JSON out of a model response.
///
/// Tries, in order: the whole text, a ```json fenced block, any fenced
/// block, and the span from the first `{` to the last `}`.
pub fn parse_json_response(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw.trim()) {
        return Some(value);
    }

    if let Some(block) = fenced_block(raw, "```json") {
        if let Ok(value) = serde_json::from_str(block.trim()) {
            return Some(value);
        }
    }

    if let Some(block) = fenced_block(raw, "```") {
        if let Ok(value) = serde_json::from_str(block.trim()) {
            return Some(value);
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        serde_json::from_str(&raw[start..=end]).ok()
    } else {
        None
    }
}

/// Text between the first `opener` and the next closing fence.
fn fenced_block<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let after = &raw[raw.find(opener)? + opener.len()..];
    let end = after.find("```").unwrap_or(after.len());
    Some(&after[..end])
}
