//! Generation client: the three provider operations a recipe request is built from.
//!
//! Each operation has its own failure domain. Only recipe text is fatal; image
//! failures are reported to the caller, who decides how to degrade.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::FutureExt;
use serde::Deserialize;
use tracing::Instrument;

use crate::ai::prompts::images::{HERO_IMAGE_PROMPT_NAME, STEP_IMAGE_PROMPT_NAME};
use crate::ai::prompts::recipe::RECIPE_PROMPT_NAME;
use crate::ai::prompts::{
    recipe_response_schema, render_hero_image_prompt, render_recipe_messages,
    render_step_image_prompt,
};
use crate::ai::{AiClient, ChatRequest, ImageRequest};
use crate::error::{GenerationError, ImageGenerationError};
use crate::types::{GeneratedImage, Recipe};

/// Recipe as the model returned it, before shape validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    recipe_name: Option<String>,
    description: Option<String>,
    prep_time: Option<String>,
    cook_time: Option<String>,
    servings: Option<String>,
    ingredients: Option<Vec<String>>,
    instructions: Option<Vec<String>>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, GenerationError> {
    value.ok_or_else(|| GenerationError::Malformed(format!("missing field {}", field)))
}

impl RawRecipe {
    fn into_recipe(self) -> Result<Recipe, GenerationError> {
        let recipe = Recipe {
            name: required(self.recipe_name, "recipeName")?,
            description: required(self.description, "description")?,
            prep_time: required(self.prep_time, "prepTime")?,
            cook_time: required(self.cook_time, "cookTime")?,
            servings: required(self.servings, "servings")?,
            ingredients: required(self.ingredients, "ingredients")?,
            instructions: required(self.instructions, "instructions")?,
        };

        match recipe.shape_error() {
            Some(field) => Err(GenerationError::Malformed(format!("empty {}", field))),
            None => Ok(recipe),
        }
    }
}

/// Parse the text model's JSON answer into a validated recipe.
pub fn parse_recipe(content: &str) -> Result<Recipe, GenerationError> {
    let raw: RawRecipe = serde_json::from_str(content.trim())
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;
    raw.into_recipe()
}

/// Client for the recipe, hero image and step image operations.
#[derive(Clone)]
pub struct GenerationClient {
    ai: Arc<dyn AiClient>,
}

impl GenerationClient {
    pub fn new(ai: Arc<dyn AiClient>) -> Self {
        Self { ai }
    }

    /// Generate a recipe from the given ingredients.
    pub async fn generate_recipe_text(
        &self,
        ingredients: &[String],
    ) -> Result<Recipe, GenerationError> {
        let request = ChatRequest {
            messages: render_recipe_messages(ingredients),
            response_schema: Some(recipe_response_schema()),
            ..Default::default()
        };

        let response = self.ai.complete(RECIPE_PROMPT_NAME, request).await?;
        let recipe = parse_recipe(&response.content)?;

        tracing::debug!(
            recipe = %recipe.name,
            steps = recipe.instructions.len(),
            cached = response.cached,
            "Recipe text generated"
        );
        Ok(recipe)
    }

    /// Generate a photo of the finished dish.
    pub async fn generate_hero_image(
        &self,
        name: &str,
        description: &str,
    ) -> Result<GeneratedImage, ImageGenerationError> {
        let request = render_hero_image_prompt(name, description);
        self.first_image(HERO_IMAGE_PROMPT_NAME, request).await
    }

    /// Generate one image per step, concurrently.
    ///
    /// A failed or panicking step yields `None` at its index; the output always
    /// has one slot per step.
    pub async fn generate_step_images(
        &self,
        name: &str,
        steps: &[String],
    ) -> Vec<Option<GeneratedImage>> {
        let total = steps.len();
        let requests = steps.iter().enumerate().map(|(index, step)| {
            let request = render_step_image_prompt(name, step, index, total);
            let request = AssertUnwindSafe(self.first_image(STEP_IMAGE_PROMPT_NAME, request));
            async move {
                match request.catch_unwind().await {
                    Ok(Ok(image)) => Some(image),
                    Ok(Err(e)) => {
                        tracing::warn!(
                            step = index + 1,
                            error = %e,
                            "Step image generation failed"
                        );
                        None
                    }
                    Err(_) => {
                        tracing::warn!(step = index + 1, "Step image generation panicked");
                        None
                    }
                }
            }
            .instrument(tracing::debug_span!("step_image", step = index + 1))
        });

        join_all(requests).await
    }

    async fn first_image(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<GeneratedImage, ImageGenerationError> {
        let response = self.ai.generate_images(prompt_name, request).await?;
        response
            .images
            .into_iter()
            .next()
            .ok_or(ImageGenerationError::Empty)
    }
}
