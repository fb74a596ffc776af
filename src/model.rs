use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};

/// Lightweight video metadata from oEmbed or the media tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub uploader: Option<String>,
}

impl VideoMetadata {
    /// Combine two metadata sources, keeping whichever populated a field first.
    pub fn merge(self, other: VideoMetadata) -> VideoMetadata {
        VideoMetadata {
            title: first_populated(self.title, other.title),
            description: first_populated(self.description, other.description),
            thumbnail: first_populated(self.thumbnail, other.thumbnail),
            duration: self.duration.or(other.duration),
            uploader: first_populated(self.uploader, other.uploader),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.thumbnail.is_none()
    }
}

fn first_populated(a: Option<String>, b: Option<String>) -> Option<String> {
    match a {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => b.filter(|value| !value.trim().is_empty()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub name: String,
    pub notes: Option<String>,
    pub estimated_cost: Option<f64>,
}

impl Ingredient {
    pub fn named(name: impl Into<String>) -> Self {
        Ingredient {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Times {
    pub prep: Option<String>,
    pub cook: Option<String>,
    pub total: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionValues {
    pub calories: Option<i64>,
    pub protein: Option<i64>,
    pub carbs: Option<i64>,
    pub fat: Option<i64>,
    pub fiber: Option<i64>,
    pub sugar: Option<i64>,
    pub sodium: Option<i64>,
}

impl NutritionValues {
    pub const FIELDS: [&'static str; 7] =
        ["calories", "protein", "carbs", "fat", "fiber", "sugar", "sodium"];

    pub fn set(&mut self, field: &str, value: Option<i64>) {
        match field {
            "calories" => self.calories = value,
            "protein" => self.protein = value,
            "carbs" => self.carbs = value,
            "fat" => self.fat = value,
            "fiber" => self.fiber = value,
            "sugar" => self.sugar = value,
            "sodium" => self.sodium = value,
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == NutritionValues::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub per_serving: NutritionValues,
    pub total: NutritionValues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub thumbnail: Option<String>,
}

/// The canonical recipe document produced by every extraction path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<u32>,
    pub times: Times,
    pub components: Vec<Component>,
    /// Flattened across components, kept for older consumers
    pub ingredients: Vec<Ingredient>,
    /// Flattened across components, kept for older consumers
    pub steps: Vec<String>,
    pub equipment: Vec<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub nutrition: Nutrition,
    pub media: Media,
    pub cost_location: String,
    pub total_estimated_cost: Option<f64>,
    pub source_url: String,
}

impl RecipeDraft {
    pub fn ingredient_count(&self) -> usize {
        self.components.iter().map(|c| c.ingredients.len()).sum()
    }

    pub fn step_count(&self) -> usize {
        self.components.iter().map(|c| c.steps.len()).sum()
    }

    pub fn all_ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.components.iter().flat_map(|c| c.ingredients.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    #[serde(rename = "whisper")]
    Whisper,
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "oembed")]
    OEmbed,
    #[serde(rename = "website-jsonld")]
    WebsiteJsonLd,
    #[serde(rename = "website-ai")]
    WebsiteAi,
    #[serde(rename = "tiktok_photo_vision")]
    TiktokPhotoVision,
    #[serde(rename = "ocr")]
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Whisper => "whisper",
            ExtractionMethod::Basic => "basic",
            ExtractionMethod::OEmbed => "oembed",
            ExtractionMethod::WebsiteJsonLd => "website-jsonld",
            ExtractionMethod::WebsiteAi => "website-ai",
            ExtractionMethod::TiktokPhotoVision => "tiktok_photo_vision",
            ExtractionMethod::Ocr => "ocr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionQuality {
    High,
    Medium,
    Low,
    Good,
}

/// Outcome of one extraction call.
///
/// Failures are values too: `success == false` with `error_code` and a
/// `friendly_error` sentence that is safe to show to end users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub recipe: Option<RecipeDraft>,
    pub raw_text: Option<String>,
    pub thumbnail_url: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub extraction_quality: ExtractionQuality,
    pub has_audio_transcript: bool,
    pub low_confidence: bool,
    pub confidence_warning: Option<String>,
    pub error: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub friendly_error: Option<String>,
}

impl ExtractionResult {
    pub fn succeeded(
        recipe: RecipeDraft,
        method: ExtractionMethod,
        quality: ExtractionQuality,
    ) -> Self {
        ExtractionResult {
            success: true,
            thumbnail_url: recipe.media.thumbnail.clone(),
            recipe: Some(recipe),
            raw_text: None,
            extraction_method: method,
            extraction_quality: quality,
            has_audio_transcript: false,
            low_confidence: false,
            confidence_warning: None,
            error: None,
            error_code: None,
            friendly_error: None,
        }
    }

    /// A failed result with the code's default friendly sentence.
    pub fn failed(code: ErrorCode, error: impl Into<String>) -> Self {
        Self::failed_with_message(code, error, code.default_message())
    }

    pub fn failed_with_message(
        code: ErrorCode,
        error: impl Into<String>,
        friendly: impl Into<String>,
    ) -> Self {
        ExtractionResult {
            success: false,
            recipe: None,
            raw_text: None,
            thumbnail_url: None,
            extraction_method: ExtractionMethod::OEmbed,
            extraction_quality: ExtractionQuality::Low,
            has_audio_transcript: false,
            low_confidence: false,
            confidence_warning: None,
            error: Some(error.into()),
            error_code: Some(code),
            friendly_error: Some(friendly.into()),
        }
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = Some(raw_text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_merge_prefers_first_source() {
        let oembed = VideoMetadata {
            title: Some("Garlic Noodles".to_string()),
            thumbnail: Some("https://cdn.example.com/a.jpg".to_string()),
            ..Default::default()
        };
        let rich = VideoMetadata {
            title: Some("garlic noodles #fyp".to_string()),
            description: Some("1 lb noodles, 6 cloves garlic".to_string()),
            thumbnail: Some("https://cdn.example.com/b.jpg".to_string()),
            duration: Some(42.0),
            uploader: None,
        };

        let merged = oembed.merge(rich);
        assert_eq!(merged.title.as_deref(), Some("Garlic Noodles"));
        assert_eq!(
            merged.description.as_deref(),
            Some("1 lb noodles, 6 cloves garlic")
        );
        assert_eq!(merged.thumbnail.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(merged.duration, Some(42.0));
    }

    #[test]
    fn test_blank_fields_do_not_win_merge() {
        let first = VideoMetadata {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let second = VideoMetadata {
            title: Some("Real title".to_string()),
            ..Default::default()
        };
        assert_eq!(first.merge(second).title.as_deref(), Some("Real title"));
    }

    #[test]
    fn test_nutrition_always_serialized() {
        let recipe = RecipeDraft::default();
        let value = serde_json::to_value(&recipe).unwrap();
        assert!(value["nutrition"]["perServing"].is_object());
        assert!(value["nutrition"]["total"].is_object());
        assert!(value["nutrition"]["total"]["sodium"].is_null());
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&ExtractionMethod::WebsiteJsonLd).unwrap();
        assert_eq!(json, "\"website-jsonld\"");
        let json = serde_json::to_string(&ExtractionQuality::Good).unwrap();
        assert_eq!(json, "\"good\"");
    }
}
