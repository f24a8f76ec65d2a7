//! Interactive session: a line-based stand-in for the web UI.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pantrychef_core::{
    create_client_from_env, share_url, ActionOutcome, FileStore, GenerationClient,
    GenerationResult, PendingAction, RecipeOrchestrator, Session, ShareCodec,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use url::Url;

use crate::render;

const HELP: &str = "\
Commands:
  list                 Show the working ingredient list
  add <ingredient>     Add an ingredient
  rm <n>               Remove ingredient number n
  save                 Save the working list
  load                 Replace the working list with the saved one
  clear                Delete the saved list
  generate             Generate a recipe from the working list
  show                 Show the current recipe
  write <dir>          Write the current recipe and its images to a directory
  share                Print a share link for the current recipe
  open <link>          View a shared recipe
  close                Leave the shared recipe view
  help                 Show this help
  quit                 Exit";

type Input = Lines<BufReader<Stdin>>;

struct Shell {
    session: Session<FileStore>,
    codec: ShareCodec,
    share_base: Url,
    orchestrator: Option<RecipeOrchestrator>,
    last_result: Option<Arc<GenerationResult>>,
}

pub async fn run(store: FileStore, share_base: Url) -> Result<()> {
    let mut shell = Shell {
        session: Session::new(store),
        codec: ShareCodec::default(),
        share_base,
        orchestrator: None,
        last_result: None,
    };
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("PantryChef. Type `help` for commands.");
    println!("{}", shell.session.status());
    shell.print_list();

    loop {
        let Some(line) = prompt(&mut input, "> ").await? else {
            break;
        };
        let (command, arg) = match line.trim().split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.trim(), ""),
        };

        let outcome = match command {
            "" => Ok(()),
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            "list" | "ls" => {
                shell.print_list();
                Ok(())
            }
            "add" => shell.add(arg),
            "rm" | "remove" => shell.remove(arg),
            "save" => shell.save(),
            "load" => {
                let outcome = shell.session.request_load();
                shell.settle(outcome, &mut input).await
            }
            "clear" => {
                let outcome = shell.session.request_clear();
                shell.settle(outcome, &mut input).await
            }
            "generate" | "gen" => shell.generate().await,
            "show" => {
                shell.show();
                Ok(())
            }
            "write" => shell.write(arg),
            "share" => shell.share(),
            "open" => shell.open(arg),
            "close" => {
                shell.session.close_shared();
                println!("Back to your own recipes.");
                Ok(())
            }
            other => {
                println!("Unknown command `{}`. Type `help` for commands.", other);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {:#}", e);
        }
    }

    Ok(())
}

/// Print `text` and read one line. None at end of input.
async fn prompt(input: &mut Input, text: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}

impl Shell {
    fn print_list(&self) {
        let ingredients = self.session.ingredients();
        if ingredients.is_empty() {
            println!("No ingredients yet. Add some with `add <ingredient>`.");
            return;
        }
        for (i, ingredient) in ingredients.iter().enumerate() {
            println!("  {}. {}", i + 1, ingredient);
        }
    }

    fn add(&mut self, ingredient: &str) -> Result<()> {
        self.session.add_ingredient(ingredient)?;
        self.print_list();
        Ok(())
    }

    fn remove(&mut self, position: &str) -> Result<()> {
        let position: usize = position
            .parse()
            .with_context(|| format!("`{}` is not an ingredient number", position))?;
        let index = position
            .checked_sub(1)
            .context("Ingredient numbers start at 1")?;
        let removed = self.session.remove_ingredient(index)?;
        println!("Removed {}.", removed);
        self.print_list();
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.session.save().context("Failed to save ingredients")?;
        println!("{}", self.session.status());
        Ok(())
    }

    /// Ask about a pending action, then run or drop it.
    async fn settle(&mut self, outcome: ActionOutcome, input: &mut Input) -> Result<()> {
        if let ActionOutcome::NeedsConfirmation(action) = outcome {
            println!("{}", action.title());
            println!("{}", action.message());
            let answer = prompt(input, "[y/N] ").await?.unwrap_or_default();

            if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                self.session
                    .confirm()
                    .context("Failed to update saved ingredients")?;
            } else {
                self.session.cancel();
                println!("Cancelled.");
                return Ok(());
            }

            if action == PendingAction::Load {
                self.print_list();
            }
        }

        println!("{}", self.session.status());
        Ok(())
    }

    async fn generate(&mut self) -> Result<()> {
        if self.orchestrator.is_none() {
            let ai = create_client_from_env().context("Failed to create AI client")?;
            self.orchestrator = Some(RecipeOrchestrator::new(GenerationClient::new(ai)));
        }
        let Some(orchestrator) = &self.orchestrator else {
            return Ok(());
        };

        let progress = render::spawn_progress(orchestrator.subscribe());
        let outcome = orchestrator.generate(self.session.ingredients()).await;
        progress.abort();

        let snapshot = outcome?;
        // Nothing from the previous request survives a new one
        self.last_result = snapshot.result.clone();

        match &snapshot.result {
            Some(result) => {
                render::print_result(result);
                if let Some(notice) = &snapshot.notice {
                    println!("\n{}", notice);
                }
            }
            None => {
                if let Some(error) = &snapshot.error {
                    println!("{}", error);
                }
            }
        }
        Ok(())
    }

    /// The recipe on screen: the shared one in shared view, else the last generated.
    fn current(&self) -> Option<&GenerationResult> {
        self.session.shared().or(self.last_result.as_deref())
    }

    fn show(&self) {
        match self.current() {
            Some(result) => render::print_result(result),
            None => println!("Your generated recipe will appear here."),
        }
    }

    fn write(&self, dir: &str) -> Result<()> {
        if dir.is_empty() {
            anyhow::bail!("Usage: write <dir>");
        }
        let result = self.current().context("No recipe to write")?;
        render::write_result(result, Path::new(dir))
    }

    fn share(&self) -> Result<()> {
        let result = self.current().context("Generate a recipe first")?;
        let token = self
            .codec
            .encode(result)
            .context("Failed to create share link")?;
        println!("{}", share_url(&self.share_base, &token));
        Ok(())
    }

    fn open(&mut self, link: &str) -> Result<()> {
        let mut url = Url::parse(link).context("Not a share link")?;
        if self.session.open_shared(&mut url, &self.codec)? {
            println!("Viewing a shared recipe. Type `close` to leave.");
            self.show();
        } else {
            println!("That link has no shared recipe.");
        }
        Ok(())
    }
}
