/// System message sent with every extraction request.
pub const SYSTEM_PROMPT: &str =
    "You are a culinary extraction engine. Extract recipe information and return valid JSON only.";

/// Marks where text input is spliced into an instruction template.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

// Templates are loaded at compile time so they can be edited as plain text.
const RECIPE_TEMPLATE: &str = include_str!("prompts/recipe.txt");
const OCR_TEMPLATE: &str = include_str!("prompts/ocr.txt");
const MULTI_IMAGE_TEMPLATE: &str = include_str!("prompts/multi_image.txt");
const SLIDESHOW_TEMPLATE: &str = include_str!("prompts/slideshow.txt");
const WEBSITE_TEMPLATE: &str = include_str!("prompts/website.txt");
const RESPONSE_SHAPE: &str = include_str!("prompts/shape.txt");

fn fill(template: &str, location: &str, source_url: &str) -> String {
    template
        .replace("{shape}", RESPONSE_SHAPE)
        .replace("{location}", location)
        .replace("{source_url}", source_url)
}

/// Instructions for assembled video text. The `{content}` placeholder is
/// left for the engine, which splices in the sanitized text.
pub fn build_recipe_prompt(source_url: &str, location: &str) -> String {
    fill(RECIPE_TEMPLATE, location, source_url)
}

/// Instructions for readable page text from a recipe website.
pub fn build_website_prompt(source_url: &str, location: &str) -> String {
    fill(WEBSITE_TEMPLATE, location, source_url)
}

pub fn build_ocr_prompt(location: &str) -> String {
    fill(OCR_TEMPLATE, location, "")
}

pub fn build_multi_image_prompt(count: usize, location: &str) -> String {
    fill(MULTI_IMAGE_TEMPLATE, location, "").replace("{count}", &count.to_string())
}

pub fn build_slideshow_prompt(source_url: &str, caption: &str, location: &str) -> String {
    let caption = if caption.trim().is_empty() {
        "(no caption)"
    } else {
        caption
    };
    // Caption last so braces inside it stay literal
    fill(SLIDESHOW_TEMPLATE, location, source_url).replace("{caption}", caption)
}
