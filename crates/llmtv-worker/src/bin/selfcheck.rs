use std::path::Path;

use llmtv_ai_client::{parse_model_id, AiClientConfig};
use llmtv_media::{check_ffmpeg, check_ffprobe};
use llmtv_worker::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env();

    println!(
        "llmtv-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    config.validate()?;
    ensure_workdir(&config.work_dir).await?;

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!("llmtv-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    ensure_api_keys(&AiClientConfig::from_env(), &config.lyrics_model)?;

    println!("llmtv-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".llmtv-selfcheck");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_api_keys(ai: &AiClientConfig, lyrics_model: &str) -> anyhow::Result<()> {
    let mut missing = ai.missing_keys();

    let (provider, _) = parse_model_id(lyrics_model)?;
    let lyrics_key = provider.key_env();
    if std::env::var(lyrics_key).map(|v| v.trim().is_empty()).unwrap_or(true)
        && !missing.contains(&lyrics_key)
    {
        missing.push(lyrics_key);
    }

    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "missing required env vars: {}",
            missing.join(", ")
        ));
    }
    Ok(())
}
