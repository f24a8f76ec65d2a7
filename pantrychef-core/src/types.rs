use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A generated recipe, as returned by the text model.
///
/// Times and servings are display strings ("15 minutes", "4 servings"), never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "recipeName")]
    pub name: String,
    pub description: String,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Name of the first field that makes this recipe unusable, if any.
    ///
    /// A usable recipe has at least one ingredient and one instruction.
    pub fn shape_error(&self) -> Option<&'static str> {
        if self.ingredients.is_empty() {
            Some("ingredients")
        } else if self.instructions.is_empty() {
            Some("instructions")
        } else {
            None
        }
    }
}

/// Image bytes produced by the image model.
///
/// Serializes as a `data:` URL so results can be embedded in JSON (share tokens,
/// cache entries) without a side channel.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn png(data: Vec<u8>) -> Self {
        Self::new("image/png", data)
    }

    /// Render as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    /// Parse a base64 `data:` URL. Returns None for anything else.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        if mime_type.is_empty() {
            return None;
        }
        let data = STANDARD.decode(payload).ok()?;
        Some(Self::new(mime_type, data))
    }

    /// File extension for the image's MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

// Image payloads can be megabytes; keep Debug output readable.
impl std::fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Serialize for GeneratedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for GeneratedImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Self::from_data_url(&url)
            .ok_or_else(|| serde::de::Error::custom("expected a base64 image data URL"))
    }
}

/// A recipe together with whatever images could be generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub recipe: Recipe,
    #[serde(rename = "imageUrl")]
    pub hero_image: Option<GeneratedImage>,
    /// One slot per instruction, `None` where the image could not be generated.
    pub instruction_images: Vec<Option<GeneratedImage>>,
}

impl GenerationResult {
    /// True when step images line up with instructions (or were never produced).
    pub fn is_consistent(&self) -> bool {
        self.instruction_images.is_empty()
            || self.recipe.instructions.is_empty()
            || self.instruction_images.len() == self.recipe.instructions.len()
    }

    /// True if the hero image or any step image is missing.
    pub fn has_missing_images(&self) -> bool {
        self.hero_image.is_none() || self.instruction_images.iter().any(Option::is_none)
    }

    /// Number of images actually present, hero included.
    pub fn image_count(&self) -> usize {
        usize::from(self.hero_image.is_some())
            + self.instruction_images.iter().flatten().count()
    }
}

/// The single persisted ingredient-list record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedIngredients {
    pub ingredients: Vec<String>,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    /// Recomputed from `ingredients` on load, so records may omit it.
    #[serde(default)]
    pub count: usize,
}

impl SavedIngredients {
    pub fn new(ingredients: Vec<String>, timestamp: i64) -> Self {
        let count = ingredients.len();
        Self {
            ingredients,
            timestamp,
            count,
        }
    }

    /// Format the timestamp in local time, e.g. "Oct 18, 2026" or "Oct 18, 2026, 3:04 PM".
    pub fn display_timestamp(&self, with_time: bool) -> String {
        let Some(when) = Local.timestamp_millis_opt(self.timestamp).single() else {
            return "an unknown date".to_string();
        };
        if with_time {
            when.format("%b %-d, %Y, %-I:%M %p").to_string()
        } else {
            when.format("%b %-d, %Y").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn pancakes() -> Recipe {
        Recipe {
            name: "Simple Pancakes".to_string(),
            description: "Fluffy".to_string(),
            prep_time: "5 minutes".to_string(),
            cook_time: "10 minutes".to_string(),
            servings: "2 servings".to_string(),
            ingredients: vec!["3 eggs".to_string()],
            instructions: vec!["Whisk".to_string(), "Fry".to_string()],
        }
    }

    #[test]
    fn test_recipe_uses_provider_field_names() {
        let json = serde_json::to_value(pancakes()).unwrap();
        assert_eq!(json["recipeName"], "Simple Pancakes");
        assert_eq!(json["prepTime"], "5 minutes");
        assert_eq!(json["cookTime"], "10 minutes");
    }

    #[test]
    fn test_shape_error() {
        let mut recipe = pancakes();
        assert_eq!(recipe.shape_error(), None);
        recipe.instructions.clear();
        assert_eq!(recipe.shape_error(), Some("instructions"));
        recipe.ingredients.clear();
        assert_eq!(recipe.shape_error(), Some("ingredients"));
    }

    #[test]
    fn test_image_data_url() {
        let image = GeneratedImage::png(vec![1, 2, 3]);
        let url = image.to_data_url();
        assert_eq!(url, "data:image/png;base64,AQID");
        assert_eq!(GeneratedImage::from_data_url(&url), Some(image));
        assert_eq!(GeneratedImage::from_data_url("https://example.com/a.png"), None);
        assert_eq!(GeneratedImage::from_data_url("data:image/png;base64,%%%"), None);
    }

    #[test]
    fn test_missing_images() {
        let full = GenerationResult {
            recipe: pancakes(),
            hero_image: Some(GeneratedImage::png(vec![0])),
            instruction_images: vec![
                Some(GeneratedImage::png(vec![1])),
                Some(GeneratedImage::png(vec![2])),
            ],
        };
        assert!(!full.has_missing_images());
        assert_eq!(full.image_count(), 3);

        let partial = GenerationResult {
            instruction_images: vec![Some(GeneratedImage::png(vec![1])), None],
            ..full.clone()
        };
        assert!(partial.has_missing_images());
        assert!(partial.is_consistent());

        let mismatched = GenerationResult {
            instruction_images: vec![None],
            ..full
        };
        assert!(!mismatched.is_consistent());
    }

    #[test]
    fn test_saved_count_matches_list() {
        let saved = SavedIngredients::new(vec!["salt".to_string(), "pepper".to_string()], 0);
        assert_eq!(saved.count, 2);
    }

    #[test]
    fn test_display_timestamp() {
        // 2023-11-14 22:13:20 UTC
        let millis = 1_700_000_000_000;
        let saved = SavedIngredients::new(vec!["salt".to_string()], millis);
        let local = Local.timestamp_millis_opt(millis).unwrap();

        let date = saved.display_timestamp(false);
        assert_eq!(date, local.format("%b %-d, %Y").to_string());
        assert!(date == "Nov 14, 2023" || date == "Nov 15, 2023", "{}", date);

        let with_time = saved.display_timestamp(true);
        assert_eq!(with_time, local.format("%b %-d, %Y, %-I:%M %p").to_string());
        assert!(with_time.starts_with(&format!("{}, ", date)));
        assert!(with_time.ends_with(" AM") || with_time.ends_with(" PM"));
        assert!(with_time.contains(&format!(":{:02} ", local.minute())));
    }

    #[test]
    fn test_unrepresentable_timestamp() {
        let saved = SavedIngredients::new(Vec::new(), i64::MAX);
        assert_eq!(saved.display_timestamp(true), "an unknown date");
    }
}
