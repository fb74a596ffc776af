use crate::confidence::is_placeholder_title;
use crate::content::append_notes;
use crate::engine::{EngineError, ExtractionEngine};
use crate::error::{ErrorCode, ExtractError};
use crate::model::{
    Component, ExtractionMethod, ExtractionQuality, ExtractionResult, Media, Nutrition,
    RecipeDraft,
};
use crate::normalize::normalize;
use crate::progress::{emit, ProgressSink};
use crate::strategy::Strategy;
use crate::url_to_text::fetchers::PageFetcher;
use crate::url_to_text::html::extractors::{
    find_ingredient_groups, has_named_sections, IngredientGroup, JsonLdExtractor,
    StructuredRecipe,
};
use crate::url_to_text::html::{extract_main_content, meta_thumbnail, split_inline_steps};
use log::{debug, info, warn};
use scraper::Html;

/// Raw text kept for AI-extracted pages.
const MAX_RAW_TEXT_CHARS: usize = 5000;
const UNTITLED: &str = "Untitled Recipe";

/// Everything the pipeline needs from one page, gathered in a single parse.
#[derive(Debug, Default)]
pub struct PageAnalysis {
    pub structured: Option<StructuredRecipe>,
    pub groups: Option<Vec<IngredientGroup>>,
    pub main_content: Option<String>,
    pub meta_thumbnail: Option<String>,
}

/// Parse `html` once. Kept synchronous: `Html` must not live across an await.
pub fn analyze_page(html: &str) -> PageAnalysis {
    let document = Html::parse_document(html);
    PageAnalysis {
        structured: JsonLdExtractor.try_extract(&document),
        groups: find_ingredient_groups(&document),
        main_content: extract_main_content(&document),
        meta_thumbnail: meta_thumbnail(&document),
    }
}

/// Build a draft from structured data, honouring plugin ingredient sections
/// and JSON-LD instruction sections.
pub fn structured_to_draft(
    structured: &StructuredRecipe,
    groups: Option<&[IngredientGroup]>,
    notes: &str,
) -> RecipeDraft {
    let title = if structured.title.is_empty() {
        UNTITLED.to_string()
    } else {
        structured.title.clone()
    };

    let components = match groups.filter(|g| has_named_sections(g)) {
        Some(groups) => {
            let mut components: Vec<Component> = groups
                .iter()
                .map(|group| Component {
                    name: group.name.clone().unwrap_or_else(|| title.clone()),
                    ingredients: group.ingredients.clone(),
                    ..Default::default()
                })
                .collect();
            components[0].steps = split_inline_steps(structured.flat_steps());
            components
        }
        None if structured.is_sectioned() => {
            let mut components: Vec<Component> = structured
                .sections
                .iter()
                .map(|section| Component {
                    name: section.name.clone().unwrap_or_else(|| title.clone()),
                    steps: section.steps.clone(),
                    ..Default::default()
                })
                .collect();
            components[0].ingredients = structured.ingredients.clone();
            components
        }
        None => vec![Component {
            name: title.clone(),
            ingredients: structured.ingredients.clone(),
            steps: split_inline_steps(structured.flat_steps()),
            notes: None,
        }],
    };

    let notes = Some(notes.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| structured.description.clone());

    RecipeDraft {
        title,
        description: structured.description.clone(),
        servings: structured.servings,
        times: structured.times.clone(),
        components,
        notes,
        tags: structured.tags.clone(),
        nutrition: Nutrition {
            per_serving: structured.nutrition.clone(),
            ..Default::default()
        },
        media: Media {
            thumbnail: structured.thumbnail.clone(),
        },
        ..Default::default()
    }
}

/// Recipe-website path: structured data first, AI over the page text second.
pub async fn process(
    pages: &dyn PageFetcher,
    engine: &ExtractionEngine,
    url: &str,
    location: &str,
    notes: &str,
    progress: Option<&dyn ProgressSink>,
) -> Result<ExtractionResult, ExtractError> {
    emit(progress, "fetching", 20, "Fetching webpage...").await;

    let html = match pages.fetch_html(url, None).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Failed to fetch {}: {}", url, e);
            return Ok(fetch_failure(&e));
        }
    };

    let page = analyze_page(&html);
    let thumbnail = page
        .structured
        .as_ref()
        .and_then(|s| s.thumbnail.clone())
        .or_else(|| page.meta_thumbnail.clone());

    if let Some(structured) = &page.structured {
        if structured.ingredients.is_empty() || structured.step_count() == 0 {
            debug!("JSON-LD recipe is missing ingredients or steps, falling back to AI");
        } else {
            let draft = structured_to_draft(structured, page.groups.as_deref(), notes);
            info!(
                "Using JSON-LD recipe with {} ingredients and {} steps",
                draft.ingredient_count(),
                draft.step_count()
            );
            let mut recipe = normalize(draft, url, location);
            recipe.media.thumbnail = thumbnail;
            let raw_text = serde_json::to_string_pretty(&structured.raw)?;
            return Ok(ExtractionResult::succeeded(
                recipe,
                ExtractionMethod::WebsiteJsonLd,
                ExtractionQuality::High,
            )
            .with_raw_text(raw_text));
        }
    }

    let Some(main_content) = page.main_content else {
        return Ok(ExtractionResult::failed_with_message(
            ErrorCode::NoContent,
            "Could not extract recipe content from page",
            "We couldn't find a recipe on this page.",
        ));
    };

    emit(progress, "extracting", 70, "Extracting recipe with AI...").await;
    let content = append_notes(main_content.clone(), notes);
    let output = match engine.extract_website(url, &content, location).await {
        Ok(output) => output,
        Err(EngineError::NoContent) => {
            return Ok(ExtractionResult::failed(
                ErrorCode::NoContent,
                "Page content was empty after cleanup",
            ))
        }
        Err(EngineError::AllProvidersFailed(_)) => {
            return Ok(ExtractionResult::failed(
                ErrorCode::LlmExtractionFailed,
                "AI could not extract recipe from page content",
            ))
        }
    };

    let mut recipe = output.into_recipe(url, location);
    if is_placeholder_title(&recipe.title)
        || (recipe.ingredient_count() == 0 && recipe.step_count() == 0)
    {
        warn!("AI output for {} does not look like a recipe", url);
        return Ok(ExtractionResult::failed(
            ErrorCode::LlmExtractionFailed,
            "AI could not extract recipe from page content",
        ));
    }
    recipe.media.thumbnail = page.meta_thumbnail;

    let raw_text: String = main_content.chars().take(MAX_RAW_TEXT_CHARS).collect();
    Ok(ExtractionResult::succeeded(
        recipe,
        ExtractionMethod::WebsiteAi,
        ExtractionQuality::Good,
    )
    .with_raw_text(raw_text))
}

fn fetch_failure(err: &ExtractError) -> ExtractionResult {
    let code = match err {
        ExtractError::Status { status: 404 | 410, .. } => ErrorCode::NotFound,
        ExtractError::Status { status: 401 | 403, .. } => ErrorCode::AccessDenied,
        ExtractError::Status { status: 429, .. } => ErrorCode::RateLimited,
        ExtractError::Http(e) if e.is_timeout() => ErrorCode::Timeout,
        _ => ErrorCode::ExtractionFailed,
    };
    ExtractionResult::failed_with_message(
        code,
        format!("Failed to fetch webpage: {}", err),
        "We couldn't load this webpage. Please check the link and try again.",
    )
}
