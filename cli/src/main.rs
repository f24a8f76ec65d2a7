mod render;
mod shell;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pantrychef_core::ai::{AiCache, AiConfig};
use pantrychef_core::storage::data_dir_from_env;
use pantrychef_core::{
    create_client_from_env, share_url, take_shared_token, FileStore, GenerationClient,
    IngredientList, IngredientStore, RecipeOrchestrator, ShareCodec, GENERIC_FAILURE_MESSAGE,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

#[derive(Parser)]
#[command(name = "pantrychef")]
#[command(about = "Turn the ingredients you have into a recipe", long_about = None)]
struct Cli {
    /// Directory for saved ingredients (default: ~/.pantrychef/storage)
    #[arg(long, global = true, env = "PANTRYCHEF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL that share links point at
    #[arg(
        long,
        global = true,
        env = "PANTRYCHEF_SHARE_BASE_URL",
        default_value = "http://localhost:3000/"
    )]
    share_base_url: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a recipe with images
    Generate {
        /// Ingredients to cook with (default: 3 eggs, 1 cup flour, 1/2 cup milk)
        ingredients: Vec<String>,
        /// Use the saved ingredient list instead
        #[arg(long, conflicts_with = "ingredients")]
        saved: bool,
        /// Directory to write the recipe and its images to
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print a share link for the result
        #[arg(long)]
        share: bool,
    },
    /// Save an ingredient list, replacing the saved one
    Save {
        /// Ingredients to save
        ingredients: Vec<String>,
    },
    /// Show the saved ingredient list
    Saved,
    /// Delete the saved ingredient list
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show a recipe from a share link or token
    View {
        /// Share link, or the bare token from its `recipe` parameter
        link: String,
        /// Directory to write the recipe's images to
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Interactive session
    Shell,
    /// Inspect or clear the AI response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
        /// Cache directory (default: ~/.pantrychef/ai-cache)
        #[arg(long, env = "PANTRYCHEF_AI_CACHE_DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Count cached responses
    Stats,
    /// Delete every cached response
    Clear,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(data_dir_from_env);
    tracing::debug!(data_dir = %data_dir.display(), "Using data directory");

    match cli.command {
        Commands::Generate {
            ingredients,
            saved,
            out,
            share,
        } => {
            let list = if saved {
                load_saved(&data_dir)?
            } else if ingredients.is_empty() {
                IngredientList::default()
            } else {
                let mut list = IngredientList::empty();
                list.replace_with(&ingredients);
                list
            };
            let share_base = share.then_some(&cli.share_base_url);
            generate(list.as_slice(), out.as_deref(), share_base).await?;
        }
        Commands::Save { ingredients } => {
            let mut list = IngredientList::empty();
            list.replace_with(&ingredients);
            let record = ingredient_store(&data_dir)
                .save(list.as_slice())
                .context("Failed to save ingredients")?;
            println!(
                "Saved {} ingredients. ({})",
                record.count,
                record.display_timestamp(true)
            );
        }
        Commands::Saved => match ingredient_store(&data_dir).load() {
            Some(record) => {
                println!(
                    "{} saved ingredients from {}:",
                    record.count,
                    record.display_timestamp(true)
                );
                for ingredient in &record.ingredients {
                    println!("  - {}", ingredient);
                }
            }
            None => println!("No saved ingredients found."),
        },
        Commands::Clear { yes } => {
            let store = ingredient_store(&data_dir);
            if store.load().is_none() {
                println!("No saved ingredients to clear.");
            } else if yes || confirm("Clear saved ingredients? This cannot be undone.")? {
                store.clear().context("Failed to clear saved ingredients")?;
                println!("Saved ingredients cleared.");
            } else {
                println!("Cancelled.");
            }
        }
        Commands::View { link, out } => {
            let token = parse_share_link(&link)?;
            let result = ShareCodec::default()
                .decode(&token)
                .context("Invalid share link")?;
            render::print_result(&result);
            if let Some(out) = out {
                render::write_result(&result, &out)?;
            }
        }
        Commands::Shell => {
            let store = FileStore::new(data_dir);
            shell::run(store, cli.share_base_url).await?;
        }
        Commands::Cache { action, dir } => {
            let dir = dir.unwrap_or_else(AiConfig::default_cache_dir);
            let cache = AiCache::new(dir.clone());
            match action {
                CacheAction::Stats => {
                    let stats = cache.stats();
                    println!(
                        "{} cached responses in {}",
                        stats.cached_responses,
                        dir.display()
                    );
                }
                CacheAction::Clear => {
                    cache
                        .clear()
                        .with_context(|| format!("Failed to clear {}", dir.display()))?;
                    println!("Cleared AI cache at {}", dir.display());
                }
            }
        }
    }

    Ok(())
}

fn ingredient_store(data_dir: &Path) -> IngredientStore<FileStore> {
    IngredientStore::new(FileStore::new(data_dir.to_path_buf()))
}

fn load_saved(data_dir: &Path) -> Result<IngredientList> {
    let Some(record) = ingredient_store(data_dir).load() else {
        bail!("No saved ingredients found. Save some with `pantrychef save`.");
    };
    let mut list = IngredientList::empty();
    list.replace_with(&record.ingredients);
    Ok(list)
}

/// Accept a full share link or a bare token.
fn parse_share_link(link: &str) -> Result<String> {
    match Url::parse(link) {
        Ok(mut url) => take_shared_token(&mut url)
            .with_context(|| format!("{} has no `recipe` parameter", link)),
        Err(_) => Ok(link.trim().to_string()),
    }
}

async fn generate(
    ingredients: &[String],
    out: Option<&Path>,
    share_base: Option<&Url>,
) -> Result<()> {
    let ai = create_client_from_env().context("Failed to create AI client")?;
    let orchestrator = RecipeOrchestrator::new(GenerationClient::new(ai));

    let progress = render::spawn_progress(orchestrator.subscribe());
    let outcome = orchestrator.generate(ingredients).await;
    progress.abort();

    let snapshot = match outcome {
        Ok(snapshot) => snapshot,
        Err(e) => bail!("{}", e),
    };

    let Some(result) = snapshot.result.as_deref() else {
        bail!(
            "{}",
            snapshot
                .error
                .as_deref()
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
        );
    };

    render::print_result(result);
    if let Some(notice) = &snapshot.notice {
        eprintln!("\n{}", notice);
    }
    if let Some(out) = out {
        render::write_result(result, out)?;
    }
    if let Some(base) = share_base {
        let token = ShareCodec::default()
            .encode(result)
            .context("Failed to create share link")?;
        println!("\nShare: {}", share_url(base, &token));
    }
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but "y"/"yes" is no.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
