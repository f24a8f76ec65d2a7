//! AI prompt templates.

pub mod images;
pub mod recipe;

pub use images::{render_hero_image_prompt, render_step_image_prompt};
pub use recipe::{recipe_response_schema, render_recipe_messages};
