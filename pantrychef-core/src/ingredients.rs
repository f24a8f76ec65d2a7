//! The working ingredient list the user edits before generating.

use crate::error::IngredientError;

/// Seeded into a fresh session so the first request works out of the box.
pub const DEFAULT_INGREDIENTS: [&str; 3] = ["3 eggs", "1 cup flour", "1/2 cup milk"];

/// Ordered list of non-blank, distinct ingredient lines.
///
/// Duplicates are compared exactly after trimming, so "Salt" and "salt" may coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientList {
    items: Vec<String>,
}

impl Default for IngredientList {
    fn default() -> Self {
        Self {
            items: DEFAULT_INGREDIENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IngredientList {
    /// An empty list.
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Append `ingredient` after trimming it.
    pub fn add(&mut self, ingredient: &str) -> Result<(), IngredientError> {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() {
            return Err(IngredientError::Blank);
        }
        if self.items.iter().any(|existing| existing == ingredient) {
            return Err(IngredientError::Duplicate(ingredient.to_string()));
        }
        self.items.push(ingredient.to_string());
        Ok(())
    }

    /// Remove and return the ingredient at `index`.
    pub fn remove(&mut self, index: usize) -> Result<String, IngredientError> {
        if index >= self.items.len() {
            return Err(IngredientError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Replace the whole list, dropping blanks and later duplicates.
    pub fn replace_with<I, T>(&mut self, ingredients: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.items.clear();
        for ingredient in ingredients {
            // Invalid entries from older records are skipped, not fatal
            let _ = self.add(ingredient.as_ref());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.items.iter()
    }
}
