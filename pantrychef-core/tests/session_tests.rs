use pantrychef_core::storage::SAVED_INGREDIENTS_KEY;
use pantrychef_core::{
    share_url, ActionOutcome, FileStore, GeneratedImage, GenerationResult, IngredientStore,
    KeyValueStore, PendingAction, Recipe, Session, ShareCodec,
};
use tempfile::TempDir;
use url::Url;

fn session(dir: &TempDir) -> Session<FileStore> {
    Session::new(FileStore::new(dir.path().to_path_buf()))
}

fn clear_working_list<S: KeyValueStore>(session: &mut Session<S>) {
    while !session.ingredients().is_empty() {
        session.remove_ingredient(0).unwrap();
    }
}

fn shared_result() -> GenerationResult {
    GenerationResult {
        recipe: Recipe {
            name: "Garlic Bread".to_string(),
            description: "Buttery.".to_string(),
            prep_time: "5 minutes".to_string(),
            cook_time: "10 minutes".to_string(),
            servings: "4 servings".to_string(),
            ingredients: vec!["bread".to_string(), "garlic".to_string()],
            instructions: vec!["Spread.".to_string(), "Bake.".to_string()],
        },
        hero_image: Some(GeneratedImage::png(vec![1, 2, 3])),
        instruction_images: vec![None, Some(GeneratedImage::png(vec![4]))],
    }
}

#[test]
fn test_load_replaces_list_after_confirmation() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);

    clear_working_list(&mut session);
    session.add_ingredient("salt").unwrap();
    session.add_ingredient("pepper").unwrap();
    session.save().unwrap();

    session.add_ingredient("basil").unwrap();
    assert_eq!(
        session.request_load(),
        ActionOutcome::NeedsConfirmation(PendingAction::Load)
    );
    assert_eq!(session.ingredients(), &["salt", "pepper", "basil"]);

    session.confirm().unwrap();
    assert_eq!(session.ingredients(), &["salt", "pepper"]);
    assert!(session.status().starts_with("Loaded 2 ingredients from "));
    assert_eq!(session.pending(), None);
}

#[test]
fn test_saved_record_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = session(&dir);
        session.add_ingredient("basil").unwrap();
        session.save().unwrap();
    }

    let session = session(&dir);
    let saved = session.saved().unwrap();
    assert_eq!(saved.count, 4);
    assert_eq!(saved.ingredients.last().map(String::as_str), Some("basil"));
    assert!(session.status().starts_with("Found 4 saved ingredients from "));
    // The working list is still the defaults until the user loads
    assert_eq!(session.ingredients().len(), 3);
}

#[test]
fn test_clear_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    session.save().unwrap();

    assert_eq!(
        session.request_clear(),
        ActionOutcome::NeedsConfirmation(PendingAction::Clear)
    );
    session.cancel();
    assert!(session.has_saved());

    session.request_clear();
    session.confirm().unwrap();
    assert!(!session.has_saved());
    assert_eq!(session.status(), "Saved ingredients cleared.");
    assert!(!dir.path().join(format!("{}.json", SAVED_INGREDIENTS_KEY)).exists());

    // Clearing again has nothing to confirm
    assert_eq!(session.request_clear(), ActionOutcome::Completed);
    assert_eq!(session.request_load(), ActionOutcome::Completed);
    assert_eq!(session.status(), "No saved ingredients to load.");
}

#[test]
fn test_load_after_record_cleared_by_another_process() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    session.add_ingredient("basil").unwrap();
    session.save().unwrap();
    session.add_ingredient("thyme").unwrap();

    assert_eq!(
        session.request_load(),
        ActionOutcome::NeedsConfirmation(PendingAction::Load)
    );
    IngredientStore::new(FileStore::new(dir.path().to_path_buf()))
        .clear()
        .unwrap();
    session.confirm().unwrap();

    // The deleted list must not come back from the session's copy
    assert_eq!(session.ingredients().len(), 5);
    assert!(!session.has_saved());
    assert_eq!(session.status(), "No saved ingredients to load.");
}

#[test]
fn test_corrupt_record_is_treated_as_absent() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().to_path_buf());
    store.set(SAVED_INGREDIENTS_KEY, "not json at all").unwrap();

    let mut session = Session::new(store);
    assert!(!session.has_saved());
    assert_eq!(session.status(), "No saved ingredients found.");

    // Saving over the corrupt record works
    session.save().unwrap();
    assert_eq!(session.saved().unwrap().count, 3);
}

#[test]
fn test_open_shared_link_is_read_only() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let codec = ShareCodec::default();

    let token = codec.encode(&shared_result()).unwrap();
    let base = Url::parse("http://localhost:3000/").unwrap();
    let mut url = share_url(&base, &token);

    assert!(session.open_shared(&mut url, &codec).unwrap());
    assert_eq!(session.shared(), Some(&shared_result()));
    assert_eq!(url.as_str(), "http://localhost:3000/");
    assert!(!session.has_saved());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

    session.close_shared();
    assert!(session.shared().is_none());
}

#[test]
fn test_open_shared_without_token() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let mut url = Url::parse("http://localhost:3000/?theme=dark").unwrap();

    assert!(!session.open_shared(&mut url, &ShareCodec::default()).unwrap());
    assert!(session.shared().is_none());
}

#[test]
fn test_open_corrupt_shared_link() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let mut url = Url::parse("http://localhost:3000/?recipe=garbage!!").unwrap();

    assert!(session.open_shared(&mut url, &ShareCodec::default()).is_err());
    assert!(session.shared().is_none());
    // The bad token is consumed either way
    assert_eq!(url.as_str(), "http://localhost:3000/");
}
