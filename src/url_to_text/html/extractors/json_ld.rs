use crate::ingredient::{first_integer, parse_ingredient, parse_iso_duration};
use crate::model::{Ingredient, NutritionValues, Times};
use crate::strategy::Strategy;
use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use log::debug;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

const MAX_TAGS: usize = 10;

lazy_static! {
    static ref LD_SCRIPT: Selector =
        Selector::parse("script[type='application/ld+json']").unwrap();
}

/// A schema.org `Recipe` node converted to the draft vocabulary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredRecipe {
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<u32>,
    pub times: Times,
    pub ingredients: Vec<Ingredient>,
    pub sections: Vec<InstructionSection>,
    pub tags: Vec<String>,
    pub nutrition: NutritionValues,
    pub thumbnail: Option<String>,
    /// The recipe node as found on the page
    pub raw: Value,
}

impl StructuredRecipe {
    pub fn step_count(&self) -> usize {
        self.sections.iter().map(|s| s.steps.len()).sum()
    }

    pub fn flat_steps(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|s| s.steps.iter().cloned())
            .collect()
    }

    /// True when the instructions carry more than one named `HowToSection`.
    pub fn is_sectioned(&self) -> bool {
        self.sections.iter().filter(|s| s.name.is_some()).count() > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionSection {
    pub name: Option<String>,
    pub steps: Vec<String>,
}

pub struct JsonLdExtractor;

impl Strategy<Html> for JsonLdExtractor {
    type Output = StructuredRecipe;

    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn try_extract(&self, document: &Html) -> Option<StructuredRecipe> {
        let scripts: Vec<_> = document.select(&LD_SCRIPT).collect();
        debug!("JsonLdExtractor: Found {} JSON-LD script tags", scripts.len());

        for (index, script) in scripts.iter().enumerate() {
            let cleaned = repair_json(&script.inner_html());
            let json_ld = match serde_json::from_str::<Value>(&cleaned) {
                Ok(value) => value,
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to parse JSON-LD {}: {}", index, e);
                    continue;
                }
            };

            let Some(node) = find_recipe_node(&json_ld) else {
                debug!("JsonLdExtractor: No recipe in JSON-LD {}", index);
                continue;
            };

            match serde_json::from_value::<JsonLdRecipe>(node.clone()) {
                Ok(recipe) => return Some(recipe.into_structured(node.clone())),
                Err(e) => debug!("JsonLdExtractor: Recipe node {} did not match: {}", index, e),
            }
        }
        None
    }
}

/// Locate the first recipe node in a root object, a top-level array or `@graph`.
fn find_recipe_node(json_ld: &Value) -> Option<&Value> {
    if is_recipe_type(json_ld) {
        return Some(json_ld);
    }
    if let Some(items) = json_ld.as_array() {
        return items.iter().find_map(find_recipe_node);
    }
    json_ld
        .get("@graph")
        .and_then(Value::as_array)
        .and_then(|items| items.iter().find(|item| is_recipe_type(item)))
}

/// `@type` may be a single string or a list of types.
fn is_recipe_type(value: &Value) -> bool {
    let matches = |t: &Value| {
        t.as_str()
            .map(|s| s.trim().eq_ignore_ascii_case("recipe"))
            .unwrap_or(false)
    };
    match value.get("@type") {
        Some(Value::Array(types)) => types.iter().any(matches),
        Some(t) => matches(t),
        None => false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLdRecipe {
    #[serde(default)]
    name: Option<String>,
    description: Option<DescriptionType>,
    image: Option<ImageType>,
    recipe_ingredient: Option<RecipeIngredients>,
    recipe_instructions: Option<RecipeInstructions>,
    recipe_yield: Option<RecipeYield>,
    prep_time: Option<String>,
    cook_time: Option<String>,
    total_time: Option<String>,
    keywords: Option<Keywords>,
    nutrition: Option<NutritionInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionType {
    String(String),
    Object { text: String },
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageType {
    None,
    String(String),
    Object(ImageObject),
    Multiple(Vec<ImageType>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Single(String),
    Multiple(Vec<IngredientEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientEntry {
    Text(String),
    Object {
        name: Option<String>,
        text: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInstructions {
    String(String),
    Multiple(Vec<Instruction>),
    NestedSections(Vec<Vec<Instruction>>),
}

/// Sections are tried before steps because every step field is optional.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Instruction {
    Text(String),
    Section(HowToSection),
    Step(HowToStep),
}

#[derive(Debug, Deserialize)]
struct HowToStep {
    text: Option<String>,
    description: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HowToSection {
    name: Option<String>,
    item_list_element: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    String(String),
    Number(f64),
    Array(Vec<Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Keywords {
    String(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutritionInformation {
    calories: Option<Value>,
    protein_content: Option<Value>,
    carbohydrate_content: Option<Value>,
    fat_content: Option<Value>,
    fiber_content: Option<Value>,
    sugar_content: Option<Value>,
    sodium_content: Option<Value>,
}

impl JsonLdRecipe {
    fn into_structured(self, raw: Value) -> StructuredRecipe {
        let description = self
            .description
            .map(|d| match d {
                DescriptionType::String(s) => s,
                DescriptionType::Object { text } => text,
            })
            .map(|d| decode_html_symbols(&d))
            .filter(|d| !d.trim().is_empty());

        let ingredients = match self.recipe_ingredient {
            Some(RecipeIngredients::Single(line)) => vec![line],
            Some(RecipeIngredients::Multiple(entries)) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    IngredientEntry::Text(line) => Some(line),
                    IngredientEntry::Object { name, text } => text.or(name),
                })
                .collect(),
            None => Vec::new(),
        }
        .iter()
        .map(|line| decode_html_symbols(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_ingredient(&line))
        .collect();

        let sections = match self.recipe_instructions {
            Some(RecipeInstructions::String(text)) => vec![InstructionSection {
                name: None,
                steps: split_lines(&text),
            }],
            Some(RecipeInstructions::Multiple(items)) => collect_sections(items),
            Some(RecipeInstructions::NestedSections(groups)) => groups
                .into_iter()
                .flat_map(collect_sections)
                .collect(),
            None => Vec::new(),
        }
        .into_iter()
        .filter(|section| !section.steps.is_empty())
        .collect();

        let times = Times {
            prep: self.prep_time.as_deref().and_then(duration),
            cook: self.cook_time.as_deref().and_then(duration),
            total: self.total_time.as_deref().and_then(duration),
        };

        StructuredRecipe {
            title: self
                .name
                .map(|n| decode_html_symbols(&n).trim().to_string())
                .unwrap_or_default(),
            description,
            servings: self.recipe_yield.and_then(servings),
            times,
            ingredients,
            sections,
            tags: self.keywords.map(tags).unwrap_or_default(),
            nutrition: self.nutrition.map(nutrition).unwrap_or_default(),
            thumbnail: self.image.and_then(first_image),
            raw,
        }
    }
}

fn collect_sections(items: Vec<Instruction>) -> Vec<InstructionSection> {
    let mut sections = Vec::new();
    let mut loose = InstructionSection::default();

    for item in items {
        match item {
            Instruction::Text(text) => loose.steps.extend(split_lines(&text)),
            Instruction::Step(step) => loose.steps.extend(step_text(step)),
            Instruction::Section(section) => {
                if !loose.steps.is_empty() {
                    sections.push(std::mem::take(&mut loose));
                }
                let mut steps = Vec::new();
                for nested in collect_sections(section.item_list_element) {
                    steps.extend(nested.steps);
                }
                sections.push(InstructionSection {
                    name: section
                        .name
                        .map(|n| decode_html_symbols(&n).trim().to_string())
                        .filter(|n| !n.is_empty()),
                    steps,
                });
            }
        }
    }
    if !loose.steps.is_empty() {
        sections.push(loose);
    }
    sections
}

fn step_text(step: HowToStep) -> Option<String> {
    step.text
        .or(step.description)
        .or(step.name)
        .map(|t| decode_html_symbols(&t).trim().to_string())
        .filter(|t| !t.is_empty())
}

fn split_lines(text: &str) -> Vec<String> {
    decode_html_symbols(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn duration(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| parse_iso_duration(value))
}

fn servings(recipe_yield: RecipeYield) -> Option<u32> {
    let text = match recipe_yield {
        RecipeYield::String(s) => s,
        RecipeYield::Number(n) => return (n >= 1.0).then_some(n.round() as u32),
        RecipeYield::Array(items) => match items.into_iter().next()? {
            Value::String(s) => s,
            other => other.to_string(),
        },
    };
    first_integer(&text).and_then(|n| u32::try_from(n).ok())
}

fn tags(keywords: Keywords) -> Vec<String> {
    let raw: Vec<String> = match keywords {
        Keywords::String(s) => s.split(',').map(str::to_string).collect(),
        Keywords::Multiple(v) => v,
    };
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.truncate(MAX_TAGS);
    tags
}

fn nutrition(info: NutritionInformation) -> NutritionValues {
    let number = |value: Option<Value>| match value? {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
        Value::String(s) => first_integer(&s),
        _ => None,
    };
    NutritionValues {
        calories: number(info.calories),
        protein: number(info.protein_content),
        carbs: number(info.carbohydrate_content),
        fat: number(info.fat_content),
        fiber: number(info.fiber_content),
        sugar: number(info.sugar_content),
        sodium: number(info.sodium_content),
    }
}

fn first_image(image: ImageType) -> Option<String> {
    match image {
        ImageType::None => None,
        ImageType::String(url) => Some(decode_html_symbols(&url)),
        ImageType::Object(object) => object.url,
        ImageType::Multiple(images) => images.into_iter().next().and_then(first_image),
    }
    .filter(|url| !url.trim().is_empty())
}

fn decode_html_symbols(text: &str) -> String {
    // Some CMSs double-encode entities
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

/// Minify a JSON-LD block and patch the breakage CMS templates tend to emit:
/// missing commas between members, doubled or dangling commas, and raw
/// newlines inside strings.
fn repair_json(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut depth: i32 = 0;

    let next_significant = |from: usize| chars[from..].iter().find(|c| !c.is_whitespace()).copied();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    out.push(c);
                }
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                    if matches!(next_significant(i + 1), Some('"' | '[' | '{')) {
                        debug!("Adding missing comma after string");
                        out.push(',');
                    }
                }
                '\n' | '\r' | '\t' => out.push(' '),
                _ => out.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                depth += 1;
                out.push(c);
            }
            '}' | ']' => {
                depth -= 1;
                while out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
                if depth > 0 && matches!(next_significant(i + 1), Some('"' | '{')) {
                    debug!("Adding missing comma after closing bracket");
                    out.push(',');
                }
            }
            ',' => {
                if !out.ends_with([',', '[', '{', ':']) {
                    out.push(c);
                }
            }
            ':' => {
                while out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            c if c.is_whitespace() => {}
            _ => out.push(c),
        }
    }
    out
}
