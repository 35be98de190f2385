use anyhow::{Context, Result};
use clap::Parser;
use drive_summarizer::{
    DownloadConfig, Downloader, FolderCollector, Invoker, LlmConfig, OpenRouterTransport,
    ProcessorRegistry, Summarizer, SummarizerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Download a public drive folder and produce one summary of all its files.
#[derive(Debug, Parser)]
#[command(name = "drive-summarizer", version)]
struct Args {
    /// URL of the public folder to download
    #[arg(long, required_unless_present = "input", conflicts_with = "input")]
    url: Option<String>,

    /// Summarize an already downloaded directory instead
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for downloaded files (default: DOWNLOAD_DIR or ./downloads)
    #[arg(long)]
    output: Option<PathBuf>,

    /// File the final summary is written to
    #[arg(long, default_value = "summary.txt")]
    save: PathBuf,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.verbose);

    let llm_config = LlmConfig::from_env().context("invalid LLM configuration")?;
    llm_config.validate_api_key()?;
    let summarizer_config = SummarizerConfig::from_env().context("invalid summarizer configuration")?;

    let root = if let Some(input) = &args.input {
        input.clone()
    } else if let Some(url) = &args.url {
        let mut download_config = DownloadConfig::from_env();
        if let Some(output) = &args.output {
            download_config.download_dir = output.clone();
        }
        Downloader::new(download_config)
            .download_folder(url)
            .await
            .context("folder download failed")?
    } else {
        anyhow::bail!("either --url or --input is required");
    };

    let folder = FolderCollector::new(&root, ProcessorRegistry::default())
        .collect()
        .with_context(|| format!("could not read {}", root.display()))?;
    for skipped in &folder.skipped {
        warn!("Not processed: {} ({})", skipped.identifier, skipped.reason);
    }
    if folder.artifacts.is_empty() {
        error!("No supported files found in {}", root.display());
        anyhow::bail!("the folder is empty or no files could be extracted");
    }

    let transport = Arc::new(OpenRouterTransport::new(&llm_config)?);
    let invoker = Invoker::from_config(transport, &llm_config);
    let summarizer = Summarizer::new(invoker, &summarizer_config);

    let report = summarizer.summarize_report(&folder.artifacts).await?;
    for identifier in report.unavailable() {
        warn!("Summary was produced without content from {}", identifier);
    }

    let banner = "=".repeat(60);
    println!("\n{}\nFOLDER SUMMARY\n{}\n{}\n{}", banner, banner, report.summary, banner);

    std::fs::write(&args.save, &report.summary)
        .with_context(|| format!("could not write {}", args.save.display()))?;
    let saved = args.save.canonicalize().unwrap_or_else(|_| args.save.clone());
    info!(
        "Summary from {} saved to {} (run {}, {})",
        report.model,
        saved.display(),
        report.run_id,
        report.generated_at.to_rfc3339()
    );
    println!("\nSummary saved to: {}", saved.display());
    Ok(())
}
