//! Recipe orchestrator: sequences a generation request and publishes its state.
//!
//! A request moves `Idle -> Generating(Text) -> Generating(Images) -> Settled(..)`.
//! Recipe text is generated first; the hero image and step images then run
//! concurrently and are joined before anything is published. Observers only ever
//! see whole snapshots, so a recipe is never visible without its images.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::Instrument;

use crate::error::ValidationError;
use crate::generation::GenerationClient;
use crate::types::{GeneratedImage, GenerationResult, Recipe};

/// Shown when a request fails for any reason other than validation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, I couldn't come up with a recipe. Please try again.";

/// Attached to a result that is missing at least one image.
pub const DEGRADED_NOTICE: &str = "Recipe is ready! Some images couldn't be generated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Text,
    Images,
}

impl Phase {
    /// Progress message for the UI while in this phase.
    pub fn loading_message(&self) -> &'static str {
        match self {
            Phase::Text => "Crafting your recipe...",
            Phase::Images => "Visualizing your masterpiece...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Success,
    /// Recipe produced, but the hero image or some step images are missing.
    Degraded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating(Phase),
    Settled(Settlement),
}

/// An immutable view of the orchestrator at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSnapshot {
    /// Request this snapshot belongs to; 0 before the first request.
    pub request_id: u64,
    pub state: GenerationState,
    pub result: Option<Arc<GenerationResult>>,
    /// User-facing failure message. Only set when `Settled(Failed)`.
    pub error: Option<String>,
    /// Non-fatal notice shown next to a degraded result.
    pub notice: Option<String>,
}

impl OrchestratorSnapshot {
    fn idle() -> Self {
        Self {
            request_id: 0,
            state: GenerationState::Idle,
            result: None,
            error: None,
            notice: None,
        }
    }

    fn generating(request_id: u64, phase: Phase) -> Self {
        Self {
            request_id,
            state: GenerationState::Generating(phase),
            result: None,
            error: None,
            notice: None,
        }
    }

    fn failed(request_id: u64) -> Self {
        Self {
            request_id,
            state: GenerationState::Settled(Settlement::Failed),
            result: None,
            error: Some(GENERIC_FAILURE_MESSAGE.to_string()),
            notice: None,
        }
    }

    fn settled(request_id: u64, result: GenerationResult, settlement: Settlement) -> Self {
        let notice = (settlement == Settlement::Degraded).then(|| DEGRADED_NOTICE.to_string());
        Self {
            request_id,
            state: GenerationState::Settled(settlement),
            result: Some(Arc::new(result)),
            error: None,
            notice,
        }
    }

    /// False while a request is in flight; the UI disables its trigger.
    pub fn can_generate(&self) -> bool {
        !matches!(self.state, GenerationState::Generating(_))
    }

    /// Progress message while generating.
    pub fn loading_message(&self) -> Option<&'static str> {
        match self.state {
            GenerationState::Generating(phase) => Some(phase.loading_message()),
            _ => None,
        }
    }
}

/// Merge the outcomes of the two image operations into a result.
///
/// `steps` is None when the step batch as a whole failed; it is replaced by one
/// empty slot per instruction.
pub fn reconcile(
    recipe: Recipe,
    hero: Option<GeneratedImage>,
    steps: Option<Vec<Option<GeneratedImage>>>,
) -> (GenerationResult, Settlement) {
    let instruction_count = recipe.instructions.len();
    let mut instruction_images = steps.unwrap_or_else(|| vec![None; instruction_count]);
    // One slot per instruction
    instruction_images.resize(instruction_count, None);

    let result = GenerationResult {
        recipe,
        hero_image: hero,
        instruction_images,
    };

    let settlement = if result.has_missing_images() {
        Settlement::Degraded
    } else {
        Settlement::Success
    };

    (result, settlement)
}

/// Runs generation requests and publishes their progress as snapshots.
pub struct RecipeOrchestrator {
    client: GenerationClient,
    state: watch::Sender<OrchestratorSnapshot>,
    next_request_id: AtomicU64,
}

impl RecipeOrchestrator {
    pub fn new(client: GenerationClient) -> Self {
        let (state, _) = watch::channel(OrchestratorSnapshot::idle());
        Self {
            client,
            state,
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> OrchestratorSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorSnapshot> {
        self.state.subscribe()
    }

    /// Generate a recipe with images for `ingredients`.
    ///
    /// Returns the settled snapshot for this request. An empty list is rejected
    /// before any state change or provider call. Failures after that point are
    /// reported inside the snapshot, never as an error.
    pub async fn generate(
        &self,
        ingredients: &[String],
    ) -> Result<OrchestratorSnapshot, ValidationError> {
        if ingredients.is_empty() {
            return Err(ValidationError::NoIngredients);
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        // Start clean: nothing from the previous request survives
        self.state
            .send_replace(OrchestratorSnapshot::generating(request_id, Phase::Text));

        let span = tracing::info_span!(
            "recipe_generation",
            request_id,
            ingredients = ingredients.len()
        );
        let settled = match AssertUnwindSafe(self.run(request_id, ingredients))
            .catch_unwind()
            .instrument(span)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(_) => {
                tracing::error!(request_id, "Recipe generation panicked");
                OrchestratorSnapshot::failed(request_id)
            }
        };

        self.publish(settled.clone());
        Ok(settled)
    }

    async fn run(&self, request_id: u64, ingredients: &[String]) -> OrchestratorSnapshot {
        let recipe = match self.client.generate_recipe_text(ingredients).await {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::error!(error = %e, "Recipe generation failed");
                return OrchestratorSnapshot::failed(request_id);
            }
        };

        self.publish(OrchestratorSnapshot::generating(request_id, Phase::Images));

        let hero = AssertUnwindSafe(
            self.client
                .generate_hero_image(&recipe.name, &recipe.description),
        )
        .catch_unwind();
        let steps = AssertUnwindSafe(
            self.client
                .generate_step_images(&recipe.name, &recipe.instructions),
        )
        .catch_unwind();

        let (hero, steps) = futures_util::join!(hero, steps);

        let hero = match hero {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Hero image generation failed");
                None
            }
            Err(_) => {
                tracing::warn!("Hero image generation panicked");
                None
            }
        };

        let steps = match steps {
            Ok(images) => Some(images),
            Err(_) => {
                tracing::warn!("Step image batch panicked");
                None
            }
        };

        let (result, settlement) = reconcile(recipe, hero, steps);
        tracing::info!(
            recipe = %result.recipe.name,
            images = result.image_count(),
            ?settlement,
            "Recipe generation settled"
        );

        OrchestratorSnapshot::settled(request_id, result, settlement)
    }

    /// Publish `snapshot` unless a newer request has started since.
    fn publish(&self, snapshot: OrchestratorSnapshot) -> bool {
        let published = self.state.send_if_modified(|current| {
            if current.request_id != snapshot.request_id {
                return false;
            }
            *current = snapshot.clone();
            true
        });

        if !published {
            tracing::debug!(
                request_id = snapshot.request_id,
                "Dropping snapshot from superseded request"
            );
        }
        published
    }
}
