use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use memefinder::{config::Config, MatchResult, MemeFinder};
use std::path::PathBuf;

const EXIT_KEYWORD: &str = "quit";

#[derive(Parser)]
#[command(name = "memefinder")]
#[command(about = "Find the meme that best fits a line of conversation")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config/settings.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Meme catalogue CSV (overrides config)
    #[arg(long)]
    catalogue: Option<PathBuf>,

    /// Embedding index directory (overrides config)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Use nearest-neighbour search only, no LLM
    #[arg(long)]
    similarity: bool,

    /// Hugging Face token (overrides config and HF_TOKEN)
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Neighbours requested on the similarity path
    #[arg(long, default_value_t = 1)]
    top_k: usize,

    /// Answer one query and exit instead of prompting
    #[arg(short, long)]
    query: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    memefinder::init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_default(),
    };
    if let Some(path) = &cli.catalogue {
        config.catalogue.path = path.display().to_string();
    }
    if let Some(dir) = &cli.index_dir {
        config.index.dir = dir.display().to_string();
    }
    if cli.similarity {
        config.llm.enabled = false;
    }
    if cli.hf_token.is_some() {
        config.llm.api_key = cli.hf_token.clone();
    }

    let interactive = cli.query.is_none();
    if interactive {
        println!("\n🎭 Meme Finder");
        println!("{}", "=".repeat(50));
        if config.llm.enabled && config.llm_api_key().is_none() {
            config.llm.api_key = prompt_for_token();
        }
        println!("\nInitializing...");
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} memes embedded")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    if !interactive {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let finder = MemeFinder::from_config(&config, &pb)
        .await
        .context("Failed to initialize meme finder")?;

    if let Some(query) = &cli.query {
        let result = finder.find_relevant_meme_result(query, cli.top_k).await;
        print_result(&result, cli.json)?;
        return Ok(());
    }

    println!("Ready! Enter your text and I'll find a relevant meme.");
    loop {
        let context: String = Input::new()
            .with_prompt(format!("\n🗨️  Enter text (or '{}' to exit)", EXIT_KEYWORD))
            .allow_empty(true)
            .interact_text()
            .context("Failed to read user input")?;

        if context.trim().eq_ignore_ascii_case(EXIT_KEYWORD) {
            break;
        }
        if context.trim().is_empty() {
            continue;
        }

        println!("\n🔍 Searching...");
        let result = finder.find_relevant_meme_result(&context, cli.top_k).await;
        print_result(&result, cli.json)?;
    }

    println!("\n👋 Thanks for using the Meme Finder!");
    Ok(())
}

/// Ask once for a token; an empty answer (or no terminal) continues without one
fn prompt_for_token() -> Option<String> {
    let token = Password::new()
        .with_prompt("Enter your Hugging Face token (or press Enter to continue without one)")
        .allow_empty_password(true)
        .interact()
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if token.is_none() {
        println!("⚠️ Warning: No token provided. Some API calls may be rate-limited.");
    }
    token
}

fn print_result(result: &MatchResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match (&result.filename, &result.error) {
        (Some(filename), _) => {
            println!("\n✨ Found meme:");
            println!("📁 Filename: {}", filename);
            println!(
                "📝 Description: {}",
                result.description.as_deref().unwrap_or("No description")
            );
            println!("📊 Relevance: {:.2}", result.similarity_score.unwrap_or_default());
            if result.llm_selected {
                println!("🤖 Selected by AI");
            }
        }
        (None, error) => {
            println!("\n❌ {}", error.as_deref().unwrap_or("No matching memes found"));
        }
    }
    Ok(())
}
