//! Heuristic flagging of recipes that likely need human review.

use crate::content::{split_segments, word_count};
use crate::model::{ExtractionQuality, Ingredient, RecipeDraft};
use lazy_static::lazy_static;
use regex::Regex;

const MIN_WORDS: usize = 50;
const MIN_INGREDIENTS: usize = 3;
const MUSIC_THRESHOLD: usize = 3;
const MIN_RECIPE_KEYWORDS: usize = 3;
const MIN_UNIT_KEYWORDS: usize = 2;

const MUSIC_GLYPHS: [&str; 4] = ["♪", "♫", "🎵", "🎶"];

const GENERIC_TITLES: &[&str] = &[
    "recipe",
    "untitled",
    "untitled recipe",
    "my recipe",
    "new recipe",
    "delicious recipe",
    "easy recipe",
    "recipe name",
    "recipe title",
    "tiktok recipe",
    "recipe from tiktok",
    "instagram recipe",
    "recipe from instagram",
    "youtube recipe",
    "recipe from youtube",
    "video recipe",
    "food",
    "dish",
    "unknown",
    "n/a",
];

lazy_static! {
    static ref RECIPE_KEYWORDS: Regex = Regex::new(
        r"(?i)\b(add|bake|boil|fry|fried|stir|mix|whisk|chop|dice|slice|mince|simmer|saute|sauté|roast|grill|season|marinate|preheat|oven|pan|skillet|pot|bowl|heat|cook|cooking|recipe|ingredients?|salt|pepper|garlic|onion|butter|oil|sugar|flour|egg|eggs|cheese|sauce|chicken|beef|pork|rice|pasta|minutes?)\b"
    )
    .unwrap();
    static ref UNIT_KEYWORDS: Regex = Regex::new(
        r"(?i)\b(cups?|tablespoons?|tbsp|teaspoons?|tsp|grams?|kg|oz|ounces?|lbs?|pounds?|ml|liters?|pinch|cloves?)\b"
    )
    .unwrap();
    static ref MUSIC_TAG: Regex = Regex::new(r"(?i)\[music\]").unwrap();
    static ref VAGUE: Regex = Regex::new(
        r"(?i)\b(to taste|optional|as needed|as desired|as required|for serving|for garnish|a little|a bit|a few|a handful|some)\b"
    )
    .unwrap();
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Confidence {
    pub low: bool,
    pub warning: Option<String>,
}

/// Score an extracted recipe against the raw text it came from.
///
/// Each check is independent; the recipe is low confidence when any fires,
/// and the warning names the first two reasons.
pub fn evaluate(
    recipe: &RecipeDraft,
    raw_text: &str,
    quality: ExtractionQuality,
    had_audio: bool,
) -> Confidence {
    let mut reasons: Vec<String> = Vec::new();

    if !had_audio && quality == ExtractionQuality::Low {
        reasons.push("no audio transcript and only sparse video metadata".to_string());
    }

    let words = word_count(raw_text);
    if words < MIN_WORDS {
        reasons.push(format!("insufficient content ({} words of source text)", words));
    }

    if had_audio && is_music_dominated(raw_text) {
        reasons.push("the audio appears to be mostly music".to_string());
    }

    let ingredients: Vec<&Ingredient> = recipe.all_ingredients().collect();
    if ingredients.is_empty() {
        reasons.push("no ingredients were found".to_string());
    } else if ingredients.len() < MIN_INGREDIENTS {
        reasons.push(format!("only {} ingredients were found", ingredients.len()));
    } else {
        let vague = ingredients.iter().filter(|i| is_vague(i)).count();
        if vague * 2 >= ingredients.len() {
            reasons.push("most ingredient quantities are vague".to_string());
        }
    }

    if recipe.step_count() == 0 {
        reasons.push("no steps were found".to_string());
    }

    if is_placeholder_title(&recipe.title) {
        reasons.push("the title looks generic".to_string());
    }

    if reasons.is_empty() {
        return Confidence::default();
    }

    let summary = reasons
        .iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" and ");
    Confidence {
        low: true,
        warning: Some(format!(
            "This recipe may be incomplete: {}. Please review it before cooking.",
            summary
        )),
    }
}

/// Exact (case-insensitive) match against known placeholder titles, or too short.
pub fn is_placeholder_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    title.chars().count() < 3 || GENERIC_TITLES.contains(&title.as_str())
}

fn is_music_dominated(raw_text: &str) -> bool {
    let (metadata, spoken) = split_segments(raw_text);
    let Some(spoken) = spoken else {
        return false;
    };

    let glyphs: usize = MUSIC_GLYPHS
        .iter()
        .map(|glyph| spoken.matches(glyph).count())
        .sum::<usize>()
        + MUSIC_TAG.find_iter(spoken).count();
    if glyphs < MUSIC_THRESHOLD {
        return false;
    }
    if RECIPE_KEYWORDS.find_iter(spoken).count() >= MIN_RECIPE_KEYWORDS {
        return false;
    }

    // A caption that is itself a full recipe makes the music irrelevant
    let rich_metadata = RECIPE_KEYWORDS.find_iter(metadata).count() >= MIN_RECIPE_KEYWORDS
        && UNIT_KEYWORDS.find_iter(metadata).count() >= MIN_UNIT_KEYWORDS;
    !rich_metadata
}

fn is_vague(ingredient: &Ingredient) -> bool {
    [
        Some(ingredient.name.as_str()),
        ingredient.quantity.as_deref(),
        ingredient.notes.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|text| VAGUE.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{assemble, SPOKEN_LABEL};
    use crate::model::{Component, VideoMetadata};

    fn ingredient(name: &str, quantity: Option<&str>) -> Ingredient {
        Ingredient {
            quantity: quantity.map(str::to_string),
            ..Ingredient::named(name)
        }
    }

    fn solid_recipe() -> RecipeDraft {
        RecipeDraft {
            title: "Garlic Butter Noodles".to_string(),
            components: vec![Component {
                name: "Noodles".to_string(),
                ingredients: vec![
                    ingredient("spaghetti", Some("1")),
                    ingredient("garlic", Some("6")),
                    ingredient("butter", Some("4")),
                    ingredient("parmesan", Some("1/2")),
                ],
                steps: vec!["Boil".to_string(), "Toss".to_string()],
                notes: None,
            }],
            ..Default::default()
        }
    }

    fn long_text() -> String {
        "Boil the spaghetti in salted water then melt butter with garlic. ".repeat(6)
    }

    #[test]
    fn test_good_recipe_is_confident() {
        let confidence = evaluate(&solid_recipe(), &long_text(), ExtractionQuality::High, true);
        assert_eq!(confidence, Confidence::default());
    }

    #[test]
    fn test_short_content_is_always_low() {
        let confidence = evaluate(&solid_recipe(), "VIDEO TITLE: Noodles", ExtractionQuality::High, true);
        assert!(confidence.low);
        assert!(confidence.warning.unwrap().contains("insufficient content"));
    }

    #[test]
    fn test_chatter_transcript() {
        let transcript = "hey guys welcome back so today we are just hanging out and talking about my weekend it was really fun honestly";
        let raw = assemble(&VideoMetadata::default(), Some(transcript));
        let recipe = RecipeDraft {
            title: "Weekend Vlog".to_string(),
            components: vec![Component::default()],
            ..Default::default()
        };

        let confidence = evaluate(&recipe, &raw, ExtractionQuality::High, true);
        let warning = confidence.warning.unwrap();
        assert!(confidence.low);
        assert!(warning.contains("insufficient content"));
        assert!(warning.contains("no ingredients were found"));
    }

    #[test]
    fn test_no_audio_and_low_quality() {
        let confidence = evaluate(&solid_recipe(), &long_text(), ExtractionQuality::Low, false);
        assert!(confidence.low);
        assert!(confidence.warning.unwrap().contains("no audio transcript"));
    }

    #[test]
    fn test_music_dominated_transcript() {
        let spoken = format!("♪ ♪ [Music] ♫ yeah {}", "la ".repeat(60));
        let raw = assemble(&VideoMetadata::default(), Some(&spoken));
        let confidence = evaluate(&solid_recipe(), &raw, ExtractionQuality::High, true);
        assert!(confidence.warning.unwrap().contains("mostly music"));
    }

    #[test]
    fn test_rich_caption_overrides_music() {
        let meta = VideoMetadata {
            description: Some(
                "Ingredients: 2 cups flour, 1 tsp salt, 3 tbsp butter. Mix and bake in the oven."
                    .to_string(),
            ),
            ..Default::default()
        };
        let spoken = format!("♪ ♪ ♪ {}", "la ".repeat(60));
        let raw = assemble(&meta, Some(&spoken));
        assert!(!is_music_dominated(&raw));
        assert!(raw.contains(SPOKEN_LABEL));
    }

    #[test]
    fn test_vague_quantities() {
        let mut recipe = solid_recipe();
        recipe.components[0].ingredients = vec![
            ingredient("salt", Some("to taste")),
            ingredient("pepper to taste", None),
            ingredient("parsley (optional)", None),
            ingredient("pasta", Some("1 lb")),
        ];
        let confidence = evaluate(&recipe, &long_text(), ExtractionQuality::High, true);
        assert!(confidence.warning.unwrap().contains("vague"));
    }

    #[test]
    fn test_few_ingredients_and_no_steps() {
        let mut recipe = solid_recipe();
        recipe.components[0].ingredients.truncate(2);
        recipe.components[0].steps.clear();
        let confidence = evaluate(&recipe, &long_text(), ExtractionQuality::High, true);
        assert_eq!(
            confidence.warning.as_deref(),
            Some("This recipe may be incomplete: only 2 ingredients were found and no steps were found. Please review it before cooking.")
        );
    }

    #[test]
    fn test_placeholder_titles() {
        assert!(is_placeholder_title("Recipe from TikTok"));
        assert!(is_placeholder_title(" untitled "));
        assert!(is_placeholder_title("Pi"));
        assert!(!is_placeholder_title("Pho"));
        assert!(!is_placeholder_title("Chicken Adobo"));
    }
}
