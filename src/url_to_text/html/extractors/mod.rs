mod ingredient_groups;
mod json_ld;

pub use ingredient_groups::{
    find_ingredient_groups, has_named_sections, IngredientGroup, MediavineCreate, TastyRecipes,
    WpRecipeMaker, WpZoomRecipeCard,
};
pub use json_ld::{InstructionSection, JsonLdExtractor, StructuredRecipe};
