//! Image prompts for the finished dish and for individual steps.

use crate::ai::{AspectRatio, ImageRequest};

/// Prompt name for the hero image cache keys.
pub const HERO_IMAGE_PROMPT_NAME: &str = "hero_image";

/// Prompt name for step image cache keys.
pub const STEP_IMAGE_PROMPT_NAME: &str = "step_image";

/// Render the hero image request: a photo of the finished dish.
pub fn render_hero_image_prompt(recipe_name: &str, description: &str) -> ImageRequest {
    let prompt = format!(
        "A delicious, high-quality, professional photograph of a finished dish: {recipe_name}. \
{description}. The food should look appealing and be presented on a clean, simple background."
    );
    ImageRequest::single_png(prompt, AspectRatio::Landscape16x9)
}

/// Render the image request for step `index` (zero-based) of `total`.
pub fn render_step_image_prompt(
    recipe_name: &str,
    instruction: &str,
    index: usize,
    total: usize,
) -> ImageRequest {
    let prompt = format!(
        "A clear, high-quality, photorealistic instructional image for a recipe step. \
The recipe is for \"{recipe_name}\". The step is: \"{instruction}\". \
The image should be from a first-person perspective, showing hands performing the action if appropriate. \
The background should be a clean, modern kitchen setting. \
Focus on the action described in the step. Step {step} of {total}.",
        step = index + 1
    );
    ImageRequest::single_png(prompt, AspectRatio::Landscape4x3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_prompt() {
        let request = render_hero_image_prompt("Simple Pancakes", "Fluffy and golden");
        assert!(request.prompt.contains("finished dish: Simple Pancakes."));
        assert!(request.prompt.contains("Fluffy and golden"));
        assert_eq!(request.aspect_ratio, AspectRatio::Landscape16x9);
        assert_eq!(request.count, 1);
    }

    #[test]
    fn test_step_prompt_numbers_from_one() {
        let request = render_step_image_prompt("Simple Pancakes", "Whisk the eggs", 0, 3);
        assert!(request.prompt.contains("\"Whisk the eggs\""));
        assert!(request.prompt.ends_with("Step 1 of 3."));
        assert_eq!(request.aspect_ratio, AspectRatio::Landscape4x3);
    }
}
