//! Recipe prompt: turn an ingredient list into a structured recipe.

use serde_json::{json, Value as JsonValue};

use crate::ai::ChatMessage;

/// Prompt name for cache keys.
pub const RECIPE_PROMPT_NAME: &str = "recipe";

/// Render the recipe request for the given ingredients.
pub fn render_recipe_messages(ingredients: &[String]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a creative chef."),
        ChatMessage::user(format!(
            "Generate a delicious recipe using only the following ingredients: {ingredients}. \
You can assume basic pantry staples like salt, pepper, oil, and water are available. \
If the ingredients are insufficient for a good recipe, be creative but realistic. \
Present the recipe in a clear, structured format.",
            ingredients = ingredients.join(", ")
        )),
    ]
}

/// Schema the text model must answer in. Every field is required.
pub fn recipe_response_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "recipeName": {
                "type": "STRING",
                "description": "The name of the recipe."
            },
            "description": {
                "type": "STRING",
                "description": "A short, enticing description of the dish."
            },
            "prepTime": {
                "type": "STRING",
                "description": "Estimated preparation time, e.g., '15 minutes'."
            },
            "cookTime": {
                "type": "STRING",
                "description": "Estimated cooking time, e.g., '25 minutes'."
            },
            "servings": {
                "type": "STRING",
                "description": "Number of servings the recipe makes, e.g., '4 servings'."
            },
            "ingredients": {
                "type": "ARRAY",
                "items": {
                    "type": "STRING",
                    "description": "A required ingredient for the recipe, including quantity."
                },
                "description": "An array of all ingredients needed for the recipe."
            },
            "instructions": {
                "type": "ARRAY",
                "items": {
                    "type": "STRING",
                    "description": "A single step in the cooking instructions."
                },
                "description": "An array of step-by-step instructions for preparing the dish."
            }
        },
        "required": [
            "recipeName",
            "description",
            "prepTime",
            "cookTime",
            "servings",
            "ingredients",
            "instructions"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Role;

    #[test]
    fn test_render_prompt() {
        let messages = render_recipe_messages(&["3 eggs".to_string(), "1 cup flour".to_string()]);

        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("3 eggs, 1 cup flour"));
        assert!(messages[1].content.contains("pantry staples"));
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = recipe_response_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 7);
        for field in required {
            let name = field.as_str().unwrap();
            assert!(schema["properties"].get(name).is_some(), "{name} missing");
        }
    }
}
