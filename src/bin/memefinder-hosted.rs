use anyhow::Result;
use clap::Parser;
use memefinder::{config::Config, hosted::GradioSpaceClient};

#[derive(Parser)]
#[command(name = "memefinder-hosted")]
#[command(about = "Ask the hosted meme-search space for a meme")]
#[command(version)]
struct Cli {
    /// Text to find a meme for
    #[arg(value_name = "TEXT")]
    text: String,

    /// Hugging Face space (overrides config)
    #[arg(long)]
    space: Option<String>,

    /// Space URL (overrides the one derived from the space name)
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    memefinder::init_tracing();
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    let space = cli.space.unwrap_or(config.hosted.space);
    let url = cli.url.or(config.hosted.base_url);
    let client = GradioSpaceClient::new(&space, url.as_deref());

    match client.predict(&cli.text).await {
        Ok(meme) => {
            println!("{}", meme.description);
            println!("\n{}", meme.rendering_fragment.trim());
        }
        Err(e) => {
            // a failed lookup is reported, not fatal
            println!("Error calling Gradio API: {:#}", e);
        }
    }

    Ok(())
}
