use thiserror::Error;

use crate::ai::AiError;

/// A generation request was rejected before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please add some ingredients first.")]
    NoIngredients,
}

/// The recipe text could not be produced. Fatal to the request.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Recipe request failed: {0}")]
    Provider(#[from] AiError),

    #[error("Malformed recipe response: {0}")]
    Malformed(String),
}

/// An image could not be produced. Degrades the result but never fails it.
#[derive(Error, Debug)]
pub enum ImageGenerationError {
    #[error("Image request failed: {0}")]
    Provider(#[from] AiError),

    #[error("No image was generated")]
    Empty,
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to serialize recipe: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to compress recipe: {0}")]
    Compress(#[from] std::io::Error),

    #[error("Recipe is too large to share ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Error, Debug)]
pub enum DecodingError {
    #[error("Share token is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Share token is not valid compressed data: {0}")]
    Decompress(std::io::Error),

    #[error("Share token does not contain a recipe: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Shared recipe has no {0}")]
    IncompleteRecipe(&'static str),

    #[error("Shared recipe has {images} step images for {instructions} instructions")]
    MismatchedImages { images: usize, instructions: usize },
}

/// Writing to the key-value medium failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The stored record could not be read. Never surfaced; `load` treats it as absent.
#[derive(Error, Debug)]
pub enum PersistenceReadError {
    #[error("Failed to read stored record: {0}")]
    Medium(#[from] StorageError),

    #[error("Stored record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngredientError {
    #[error("Ingredient is blank")]
    Blank,

    #[error("{0} is already in the list")]
    Duplicate(String),

    #[error("No ingredient at position {index} (list has {len})")]
    OutOfRange { index: usize, len: usize },
}
