use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pantrychef_core::{GenerationResult, OrchestratorSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Print loading messages to stderr as the orchestrator moves between phases.
pub fn spawn_progress(mut updates: watch::Receiver<OrchestratorSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let message = updates.borrow_and_update().loading_message();
            if let Some(message) = message {
                eprintln!("{}", message);
            }
        }
    })
}

pub fn print_result(result: &GenerationResult) {
    let recipe = &result.recipe;

    println!("\n{}", recipe.name);
    println!("{}", "=".repeat(recipe.name.chars().count()));
    println!("{}\n", recipe.description);
    println!(
        "Prep: {} | Cook: {} | Serves: {}",
        recipe.prep_time, recipe.cook_time, recipe.servings
    );

    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {}", ingredient);
    }

    println!("\nInstructions:");
    for (i, step) in recipe.instructions.iter().enumerate() {
        let marker = match result.instruction_images.get(i) {
            Some(Some(_)) => " [image]",
            _ => "",
        };
        println!("  {}. {}{}", i + 1, step, marker);
    }

    println!(
        "\n{} of {} images generated.",
        result.image_count(),
        recipe.instructions.len() + 1
    );
}

/// Write `recipe.json` and every generated image into `dir`.
pub fn write_result(result: &GenerationResult, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let json = serde_json::to_string_pretty(&result.recipe)?;
    fs::write(dir.join("recipe.json"), json).context("Failed to write recipe.json")?;

    let mut written = 0;
    if let Some(hero) = &result.hero_image {
        let path = dir.join(format!("hero.{}", hero.extension()));
        fs::write(&path, &hero.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;
    }

    for (i, image) in result.instruction_images.iter().enumerate() {
        let Some(image) = image else {
            continue;
        };
        let path = dir.join(format!("step-{:02}.{}", i + 1, image.extension()));
        fs::write(&path, &image.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;
    }

    eprintln!("Wrote recipe and {} images to {}", written, dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantrychef_core::{GeneratedImage, Recipe};
    use tempfile::TempDir;

    #[test]
    fn test_write_result_skips_missing_images() {
        let temp_dir = TempDir::new().unwrap();
        let result = GenerationResult {
            recipe: Recipe {
                name: "Toast".to_string(),
                description: "Crunchy".to_string(),
                prep_time: "1 minute".to_string(),
                cook_time: "2 minutes".to_string(),
                servings: "1 serving".to_string(),
                ingredients: vec!["bread".to_string()],
                instructions: vec!["Slice.".to_string(), "Toast.".to_string()],
            },
            hero_image: None,
            instruction_images: vec![None, Some(GeneratedImage::new("image/jpeg", vec![1]))],
        };

        write_result(&result, temp_dir.path()).unwrap();

        assert!(temp_dir.path().join("recipe.json").exists());
        assert!(!temp_dir.path().join("hero.png").exists());
        assert!(!temp_dir.path().join("step-01.png").exists());
        assert_eq!(fs::read(temp_dir.path().join("step-02.jpg")).unwrap(), vec![1]);
    }
}
