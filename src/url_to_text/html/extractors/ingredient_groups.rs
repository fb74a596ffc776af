//! Ingredient sections rendered by common WordPress recipe-card plugins.
//!
//! JSON-LD flattens `recipeIngredient`, so section headings ("For the
//! sauce") only survive in the card markup.

use crate::ingredient::parse_ingredient;
use crate::model::Ingredient;
use crate::strategy::{run_in_order, Strategy};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref WPRM_GROUP: Selector = Selector::parse(".wprm-recipe-ingredient-group").unwrap();
    static ref WPRM_GROUP_NAME: Selector = Selector::parse(".wprm-recipe-group-name").unwrap();
    static ref WPRM_INGREDIENT: Selector = Selector::parse(".wprm-recipe-ingredient").unwrap();
    static ref TASTY_CONTAINER: Selector =
        Selector::parse(".tasty-recipes-ingredients, .tasty-recipe-ingredients").unwrap();
    static ref MEDIAVINE_CONTAINER: Selector = Selector::parse(".mv-create-ingredients").unwrap();
    static ref HEADING: Selector = Selector::parse("h2, h3, h4, h5, h6").unwrap();
    static ref LIST_ITEM: Selector = Selector::parse("li").unwrap();
    static ref WPZOOM_CONTAINER: Selector =
        Selector::parse(".wp-block-wpzoom-recipe-card-block-ingredients, .ingredients-list")
            .unwrap();
    static ref WPZOOM_GROUP: Selector = Selector::parse("li.ingredient-item-group").unwrap();
    static ref WPZOOM_ITEM: Selector = Selector::parse("li.ingredient-item").unwrap();
}

/// One headed block of ingredients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientGroup {
    pub name: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

/// Run the plugin strategies in order and return the first non-empty grouping.
pub fn find_ingredient_groups(document: &Html) -> Option<Vec<IngredientGroup>> {
    let strategies: [&dyn Strategy<Html, Output = Vec<IngredientGroup>>; 4] = [
        &WpRecipeMaker,
        &TastyRecipes,
        &MediavineCreate,
        &WpZoomRecipeCard,
    ];
    run_in_order(&strategies, document).map(|(_, groups)| groups)
}

/// More than one group carries a heading.
pub fn has_named_sections(groups: &[IngredientGroup]) -> bool {
    groups.iter().filter(|g| g.name.is_some()).count() > 1
}

pub struct WpRecipeMaker;

impl Strategy<Html> for WpRecipeMaker {
    type Output = Vec<IngredientGroup>;

    fn name(&self) -> &'static str {
        "wp-recipe-maker"
    }

    fn try_extract(&self, document: &Html) -> Option<Vec<IngredientGroup>> {
        let groups = document
            .select(&WPRM_GROUP)
            .map(|group| IngredientGroup {
                name: group.select(&WPRM_GROUP_NAME).next().and_then(element_text),
                ingredients: group
                    .select(&WPRM_INGREDIENT)
                    .filter_map(element_text)
                    .map(|line| parse_ingredient(&line))
                    .collect(),
            })
            .collect();
        non_empty(groups)
    }
}

pub struct TastyRecipes;

impl Strategy<Html> for TastyRecipes {
    type Output = Vec<IngredientGroup>;

    fn name(&self) -> &'static str {
        "tasty-recipes"
    }

    fn try_extract(&self, document: &Html) -> Option<Vec<IngredientGroup>> {
        let container = document.select(&TASTY_CONTAINER).next()?;
        non_empty(group_by_heading(container, &HEADING, &LIST_ITEM))
    }
}

pub struct MediavineCreate;

impl Strategy<Html> for MediavineCreate {
    type Output = Vec<IngredientGroup>;

    fn name(&self) -> &'static str {
        "mediavine-create"
    }

    fn try_extract(&self, document: &Html) -> Option<Vec<IngredientGroup>> {
        let container = document.select(&MEDIAVINE_CONTAINER).next()?;
        non_empty(group_by_heading(container, &HEADING, &LIST_ITEM))
    }
}

pub struct WpZoomRecipeCard;

impl Strategy<Html> for WpZoomRecipeCard {
    type Output = Vec<IngredientGroup>;

    fn name(&self) -> &'static str {
        "wpzoom-recipe-card"
    }

    fn try_extract(&self, document: &Html) -> Option<Vec<IngredientGroup>> {
        let container = document.select(&WPZOOM_CONTAINER).next()?;
        non_empty(group_by_heading(container, &WPZOOM_GROUP, &WPZOOM_ITEM))
    }
}

/// Walk `container` in document order; every `heading` match opens a new
/// group and every `item` match lands in the current one.
fn group_by_heading(
    container: ElementRef,
    heading: &Selector,
    item: &Selector,
) -> Vec<IngredientGroup> {
    let mut groups: Vec<IngredientGroup> = Vec::new();
    let mut current = IngredientGroup::default();

    for element in container.descendants().filter_map(ElementRef::wrap) {
        if heading.matches(&element) {
            if !current.ingredients.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.name = element_text(element);
        } else if item.matches(&element) {
            if let Some(line) = element_text(element) {
                current.ingredients.push(parse_ingredient(&line));
            }
        }
    }
    if !current.ingredients.is_empty() {
        groups.push(current);
    }
    groups
}

fn non_empty(groups: Vec<IngredientGroup>) -> Option<Vec<IngredientGroup>> {
    let groups: Vec<IngredientGroup> = groups
        .into_iter()
        .filter(|g| !g.ingredients.is_empty())
        .collect();
    (!groups.is_empty()).then_some(groups)
}

fn element_text(element: ElementRef) -> Option<String> {
    let text = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.trim_end_matches(':').trim().to_string();
    (!text.is_empty()).then_some(text)
}
