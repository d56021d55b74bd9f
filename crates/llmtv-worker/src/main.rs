//! `llmtv` command-line entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use llmtv_ai_client::AiClientConfig;
use llmtv_models::MusicVideoRequest;
use llmtv_worker::{init_tracing, MusicVideoPipeline, PipelineConfig, PipelineServices};

#[derive(Debug, Parser)]
#[command(name = "llmtv", version, about = "Turn a song concept into a music video")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline and print the output path
    Generate {
        /// Song concept, e.g. "a song about cats taking over the world"
        #[arg(short, long)]
        prompt: String,

        /// Music style or genre
        #[arg(short, long)]
        style: Option<String>,

        /// Lyrics model as provider/model
        #[arg(short, long)]
        model: Option<String>,

        /// Final video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Segments generated at once
        #[arg(long)]
        parallel: Option<usize>,

        /// Skip cache reads and writes
        #[arg(long)]
        no_cache: bool,
    },
    /// Delete every cached stage result
    ClearCache,
}

#[tokio::main]
async fn main() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env();

    match cli.command {
        Command::Generate {
            prompt,
            style,
            model,
            output,
            parallel,
            no_cache,
        } => {
            if let Some(parallel) = parallel {
                config.max_parallel_segments = parallel;
            }
            if no_cache {
                config.use_cache = false;
            }

            let model = model.unwrap_or_else(|| config.lyrics_model.clone());
            let mut request = MusicVideoRequest::new(prompt).with_model(model);
            if let Some(style) = style {
                request = request.with_style(style);
            }

            let services = PipelineServices::from_config(&AiClientConfig::from_env())?;
            let pipeline = MusicVideoPipeline::new(config, services).await?;
            info!(
                prompt = %request.concept_prompt,
                model = %request.lyrics_model,
                "Generating music video"
            );

            let path = pipeline
                .run(&request, output.as_deref())
                .await
                .context("music video generation failed")?;
            println!("{}", path.display());
        }
        Command::ClearCache => {
            let cache_dir = config.resolved_cache_dir();
            let cache = llmtv_cache::CacheStore::open(&cache_dir).await?;
            cache.clear().await?;
            info!(cache_dir = %cache_dir.display(), "Cache cleared");
        }
    }

    Ok(())
}
