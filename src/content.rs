//! Labelled raw text handed to the text engine and kept as `raw_text`.

use crate::model::VideoMetadata;

pub const TITLE_LABEL: &str = "VIDEO TITLE: ";
pub const DESCRIPTION_LABEL: &str = "VIDEO DESCRIPTION: ";
pub const SPOKEN_LABEL: &str = "SPOKEN CONTENT (from audio):\n";
pub const NOTES_LABEL: &str = "ADDITIONAL NOTES FROM USER:\n";

/// Join title, description and transcript with their labels.
pub fn assemble(metadata: &VideoMetadata, transcript: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(title) = metadata.title.as_deref().filter(|t| !t.trim().is_empty()) {
        parts.push(format!("{}{}", TITLE_LABEL, title));
    }
    if let Some(description) = metadata
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        parts.push(format!("{}{}", DESCRIPTION_LABEL, description));
    }
    if let Some(transcript) = transcript {
        parts.push(format!("{}{}", SPOKEN_LABEL, transcript));
    }
    parts.join("\n\n")
}

pub fn append_notes(content: String, notes: &str) -> String {
    if notes.trim().is_empty() {
        content
    } else {
        format!("{}\n\n{}{}", content, NOTES_LABEL, notes.trim())
    }
}

/// Split raw text into its metadata part and its spoken part.
///
/// The spoken part runs from the transcript label to the user notes (or the
/// end); everything before the label is metadata.
pub fn split_segments(raw_text: &str) -> (&str, Option<&str>) {
    let spoken_marker = SPOKEN_LABEL.trim_end();
    match raw_text.find(spoken_marker) {
        Some(start) => {
            let metadata = &raw_text[..start];
            let spoken = &raw_text[start + spoken_marker.len()..];
            let end = spoken.find(NOTES_LABEL.trim_end()).unwrap_or(spoken.len());
            (metadata, Some(&spoken[..end]))
        }
        None => (raw_text, None),
    }
}

/// Words in `raw_text`, not counting the section labels.
pub fn word_count(raw_text: &str) -> usize {
    let mut text = raw_text.to_string();
    for label in [TITLE_LABEL, DESCRIPTION_LABEL, SPOKEN_LABEL, NOTES_LABEL] {
        text = text.replace(label.trim_end(), " ");
    }
    text.split_whitespace().count()
}
