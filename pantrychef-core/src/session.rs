//! Session state for one user: the working list, the saved record, and the
//! confirmation and shared-view flows around them.
//!
//! Front ends hold a `Session` and render from its getters. Destructive actions
//! go through `request_*` and only happen after [`Session::confirm`].

use url::Url;

use crate::error::{DecodingError, IngredientError, StorageError};
use crate::ingredients::IngredientList;
use crate::share::{take_shared_token, ShareCodec};
use crate::storage::{IngredientStore, KeyValueStore};
use crate::types::{GenerationResult, SavedIngredients};

/// A destructive action waiting for the user to confirm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Load,
    Clear,
}

impl PendingAction {
    pub fn title(&self) -> &'static str {
        match self {
            PendingAction::Load => "Load Saved Ingredients?",
            PendingAction::Clear => "Clear Saved Ingredients?",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PendingAction::Load => {
                "This will replace your current ingredient list. Are you sure you want to proceed?"
            }
            PendingAction::Clear => {
                "This will permanently delete your saved ingredient list. This action cannot be undone."
            }
        }
    }
}

/// What a requested action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran (or had nothing to do); see the status message.
    Completed,
    /// Nothing changed yet; call `confirm` or `cancel`.
    NeedsConfirmation(PendingAction),
}

pub struct Session<S> {
    ingredients: IngredientList,
    store: IngredientStore<S>,
    saved: Option<SavedIngredients>,
    status: String,
    pending: Option<PendingAction>,
    shared: Option<GenerationResult>,
}

impl<S: KeyValueStore> Session<S> {
    /// Start a session with the default ingredients and look for a saved record.
    ///
    /// The saved record is only reported, not loaded into the working list.
    pub fn new(store: S) -> Self {
        let store = IngredientStore::new(store);
        let saved = store.load();
        let status = match &saved {
            Some(record) => format!(
                "Found {} saved ingredients from {}.",
                record.count,
                record.display_timestamp(false)
            ),
            None => "No saved ingredients found.".to_string(),
        };

        Self {
            ingredients: IngredientList::default(),
            store,
            saved,
            status,
            pending: None,
            shared: None,
        }
    }

    pub fn ingredients(&self) -> &[String] {
        self.ingredients.as_slice()
    }

    pub fn saved(&self) -> Option<&SavedIngredients> {
        self.saved.as_ref()
    }

    pub fn has_saved(&self) -> bool {
        self.saved.is_some()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn pending(&self) -> Option<PendingAction> {
        self.pending
    }

    /// The recipe opened from a share link, if the session is in shared view.
    pub fn shared(&self) -> Option<&GenerationResult> {
        self.shared.as_ref()
    }

    pub fn add_ingredient(&mut self, ingredient: &str) -> Result<(), IngredientError> {
        self.ingredients.add(ingredient)
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Result<String, IngredientError> {
        self.ingredients.remove(index)
    }

    /// Save the working list, replacing any saved record.
    pub fn save(&mut self) -> Result<&SavedIngredients, StorageError> {
        let record = self.store.save(self.ingredients.as_slice())?;
        self.status = format!(
            "Saved {} ingredients. ({})",
            record.count,
            record.display_timestamp(true)
        );
        Ok(self.saved.insert(record))
    }

    /// Replace the working list with the saved one.
    ///
    /// Asks for confirmation first when there is work to lose.
    pub fn request_load(&mut self) -> ActionOutcome {
        if self.saved.is_none() {
            self.status = "No saved ingredients to load.".to_string();
            return ActionOutcome::Completed;
        }

        if self.ingredients.is_empty() {
            self.perform_load();
            ActionOutcome::Completed
        } else {
            self.ask(PendingAction::Load)
        }
    }

    /// Delete the saved record. Always asks for confirmation when one exists.
    pub fn request_clear(&mut self) -> ActionOutcome {
        if self.saved.is_none() {
            self.status = "No saved ingredients to clear.".to_string();
            return ActionOutcome::Completed;
        }
        self.ask(PendingAction::Clear)
    }

    /// Run the pending action. Does nothing if none is pending.
    pub fn confirm(&mut self) -> Result<ActionOutcome, StorageError> {
        match self.pending.take() {
            Some(PendingAction::Load) => self.perform_load(),
            Some(PendingAction::Clear) => self.perform_clear()?,
            None => {}
        }
        Ok(ActionOutcome::Completed)
    }

    /// Drop the pending action without running it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Enter shared view if `url` carries a share token.
    ///
    /// The token is removed from `url` whether or not it decodes. Returns
    /// whether the session is now showing a shared recipe.
    pub fn open_shared(
        &mut self,
        url: &mut Url,
        codec: &ShareCodec,
    ) -> Result<bool, DecodingError> {
        let Some(token) = take_shared_token(url) else {
            return Ok(false);
        };

        let result = codec.decode(&token).inspect_err(|e| {
            tracing::warn!(error = %e, "Ignoring invalid share link");
        })?;
        tracing::debug!(recipe = %result.recipe.name, "Opened shared recipe");
        self.shared = Some(result);
        Ok(true)
    }

    /// Leave shared view.
    pub fn close_shared(&mut self) {
        self.shared = None;
    }

    fn ask(&mut self, action: PendingAction) -> ActionOutcome {
        self.pending = Some(action);
        ActionOutcome::NeedsConfirmation(action)
    }

    fn perform_load(&mut self) {
        // Re-read so changes made by another process are picked up
        self.saved = self.store.load();
        let Some(record) = &self.saved else {
            self.status = "No saved ingredients to load.".to_string();
            return;
        };

        self.ingredients.replace_with(&record.ingredients);
        self.status = format!(
            "Loaded {} ingredients from {}.",
            record.count,
            record.display_timestamp(false)
        );
    }

    fn perform_clear(&mut self) -> Result<(), StorageError> {
        self.store.clear()?;
        self.saved = None;
        self.status = "Saved ingredients cleared.".to_string();
        Ok(())
    }
}
