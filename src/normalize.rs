//! Canonical recipe shape, whichever path produced the draft.

use crate::ingredient::{first_integer, parse_ingredient};
use crate::model::{
    Component, Ingredient, Media, Nutrition, NutritionValues, RecipeDraft, Times,
};
use serde_json::{Map, Value};

const DEFAULT_COMPONENT_NAME: &str = "Main Dish";

/// Enforce the canonical recipe shape.
///
/// `source_url` and `cost_location` always come from the call, never from the
/// draft. The result has at least one component, no nameless ingredients, and
/// flat `ingredients`/`steps` derived from the components. Normalizing twice
/// gives the same recipe as normalizing once.
pub fn normalize(mut draft: RecipeDraft, source_url: &str, location: &str) -> RecipeDraft {
    draft.source_url = source_url.to_string();
    draft.cost_location = location.to_string();
    draft.title = draft.title.trim().to_string();

    if draft.components.is_empty() {
        draft.components.push(Component {
            name: fallback_component_name(&draft.title),
            ingredients: std::mem::take(&mut draft.ingredients),
            steps: std::mem::take(&mut draft.steps),
            notes: None,
        });
    }

    for component in &mut draft.components {
        component.name = component.name.trim().to_string();
        if component.name.is_empty() {
            component.name = fallback_component_name(&draft.title);
        }
        component.ingredients.retain_mut(|ingredient| {
            ingredient.name = ingredient.name.trim().to_string();
            !ingredient.name.is_empty()
        });
        component.steps = component
            .steps
            .iter()
            .map(|step| step.trim().to_string())
            .filter(|step| !step.is_empty())
            .collect();
    }

    let prefix_steps = draft.components.len() > 1;
    draft.ingredients = draft
        .components
        .iter()
        .flat_map(|c| c.ingredients.iter().cloned())
        .collect();
    draft.steps = draft
        .components
        .iter()
        .flat_map(|c| {
            c.steps.iter().map(move |step| {
                if prefix_steps {
                    format!("{}: {}", c.name, step)
                } else {
                    step.clone()
                }
            })
        })
        .collect();

    draft.tags = clean_list(std::mem::take(&mut draft.tags));
    draft.equipment = clean_list(std::mem::take(&mut draft.equipment));

    if draft.total_estimated_cost.is_none() {
        let costs: Vec<f64> = draft
            .ingredients
            .iter()
            .filter_map(|i| i.estimated_cost)
            .collect();
        if !costs.is_empty() {
            let sum: f64 = costs.iter().sum();
            draft.total_estimated_cost = Some((sum * 100.0).round() / 100.0);
        }
    }

    draft
}

fn fallback_component_name(title: &str) -> String {
    if title.is_empty() {
        DEFAULT_COMPONENT_NAME.to_string()
    } else {
        title.to_string()
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

impl RecipeDraft {
    /// Lenient conversion of model output.
    ///
    /// Language models drift from the requested schema: quantities come back
    /// as numbers, equipment as objects, nutrition as floats, steps as
    /// `{"text": ...}` objects. Anything unrecognizable becomes a default.
    pub fn from_value(value: &Value) -> RecipeDraft {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        RecipeDraft {
            title: string_field(obj, "title").unwrap_or_default(),
            description: string_field(obj, "description"),
            servings: obj.get("servings").and_then(to_servings),
            times: obj.get("times").map(to_times).unwrap_or_default(),
            components: obj
                .get("components")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(to_component).collect())
                .unwrap_or_default(),
            ingredients: obj.get("ingredients").map(to_ingredients).unwrap_or_default(),
            steps: obj.get("steps").map(to_steps).unwrap_or_default(),
            equipment: obj.get("equipment").map(to_names).unwrap_or_default(),
            notes: string_field(obj, "notes"),
            tags: obj.get("tags").map(to_names).unwrap_or_default(),
            nutrition: obj.get("nutrition").map(to_nutrition).unwrap_or_default(),
            media: Media {
                thumbnail: obj
                    .get("media")
                    .and_then(|m| m.get("thumbnail"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            cost_location: string_field(obj, "costLocation").unwrap_or_default(),
            total_estimated_cost: obj.get("totalEstimatedCost").and_then(to_f64),
            source_url: string_field(obj, "sourceUrl").unwrap_or_default(),
        }
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(to_text)
}

/// Non-empty string, or a number rendered as text.
fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
}

fn to_servings(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f.round()).filter(|f| *f >= 0.0).map(|f| f as u32),
        Value::String(s) => first_integer(s).and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

fn to_times(value: &Value) -> Times {
    let field = |key: &str| {
        value.get(key).and_then(|v| match v {
            Value::Number(n) => Some(format!("{} min", n)),
            other => to_text(other),
        })
    };
    Times {
        prep: field("prep"),
        cook: field("cook"),
        total: field("total"),
    }
}

fn to_component(value: &Value) -> Option<Component> {
    let obj = value.as_object()?;
    Some(Component {
        name: string_field(obj, "name").unwrap_or_default(),
        ingredients: obj.get("ingredients").map(to_ingredients).unwrap_or_default(),
        steps: obj.get("steps").map(to_steps).unwrap_or_default(),
        notes: string_field(obj, "notes"),
    })
}

fn to_ingredients(value: &Value) -> Vec<Ingredient> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(to_ingredient).collect())
        .unwrap_or_default()
}

fn to_ingredient(value: &Value) -> Option<Ingredient> {
    match value {
        Value::String(line) => Some(parse_ingredient(line)),
        Value::Object(obj) => Some(Ingredient {
            quantity: string_field(obj, "quantity"),
            unit: string_field(obj, "unit"),
            name: string_field(obj, "name")
                .or_else(|| string_field(obj, "original"))
                .unwrap_or_default(),
            notes: string_field(obj, "notes"),
            estimated_cost: obj.get("estimatedCost").and_then(to_f64),
        }),
        _ => None,
    }
}

fn to_steps(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return to_text(value).into_iter().collect();
    };
    items
        .iter()
        .filter_map(|step| match step {
            Value::Object(obj) => string_field(obj, "text").or_else(|| string_field(obj, "name")),
            other => to_text(other),
        })
        .collect()
}

/// Strings, or objects reduced to their `name`.
fn to_names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => string_field(obj, "name"),
                    other => to_text(other),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn to_nutrition(value: &Value) -> Nutrition {
    Nutrition {
        per_serving: value
            .get("perServing")
            .map(to_nutrition_values)
            .unwrap_or_default(),
        total: value.get("total").map(to_nutrition_values).unwrap_or_default(),
    }
}

fn to_nutrition_values(value: &Value) -> NutritionValues {
    let mut values = NutritionValues::default();
    for field in NutritionValues::FIELDS {
        let number = value.get(field).and_then(|v| match v {
            Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
            Value::String(s) => first_integer(s),
            _ => None,
        });
        values.set(field, number);
    }
    values
}
