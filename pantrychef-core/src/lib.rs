pub mod ai;
pub mod error;
pub mod generation;
pub mod ingredients;
pub mod orchestrator;
pub mod session;
pub mod share;
pub mod storage;
pub mod types;

pub use ai::{create_client, create_client_from_env, AiClient, AiConfig, FakeAiClient};
pub use error::{
    DecodingError, EncodingError, GenerationError, ImageGenerationError, IngredientError,
    PersistenceReadError, StorageError, ValidationError,
};
pub use generation::GenerationClient;
pub use ingredients::{IngredientList, DEFAULT_INGREDIENTS};
pub use orchestrator::{
    GenerationState, OrchestratorSnapshot, Phase, RecipeOrchestrator, Settlement,
    DEGRADED_NOTICE, GENERIC_FAILURE_MESSAGE,
};
pub use session::{ActionOutcome, PendingAction, Session};
pub use share::{share_url, take_shared_token, ShareCodec, SHARE_QUERY_PARAM};
pub use storage::{FileStore, IngredientStore, KeyValueStore, MemoryStore};
pub use types::{GeneratedImage, GenerationResult, Recipe, SavedIngredients};
