use awards_aggregator::{
    AwardExtractor, BatchOrchestrator, ExtractOutcome, FeedRegistry, FetchConfig, Fetcher,
    LinkEnumerator, MergeEngine, OpenAiExtractor, PageExtractor, PageRenderer,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Sync contract-award announcements from the feed, then merge newly
/// extracted artifacts into the master dataset.
#[derive(Parser, Debug)]
#[command(name = "awards-aggregator", version)]
struct Args {
    /// Named feed to enumerate.
    #[arg(long, default_value = "Contract Announcements")]
    feed: String,

    /// Directory holding per-announcement extraction artifacts.
    #[arg(long, default_value = "dod_awards_json")]
    artifact_dir: PathBuf,

    /// Path of the master awards dataset.
    #[arg(long, default_value = "dod_awards_json/contract_awards.json")]
    master: PathBuf,

    /// Base URL of the headless rendering service.
    #[arg(long, env = "RENDERER_URL", default_value = "http://localhost:3000")]
    renderer_url: String,

    /// Model identifier passed to the structured-extraction service.
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Skip feed sync and only merge artifacts already on disk.
    #[arg(long)]
    skip_sync: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let registry = FeedRegistry::defense();

    if !args.skip_sync {
        sync_feed(&registry, &args).await?;
    }

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY must be set for structured extraction"))?;
    let extractor: Arc<dyn AwardExtractor> = Arc::new(OpenAiExtractor::new(&api_key, &args.model));
    let engine = MergeEngine::new(extractor);
    let orchestrator = BatchOrchestrator::new(&engine);

    let summary = orchestrator.run(&args.artifact_dir, &args.master).await?;
    info!(
        "Appended {} award(s) across {} artifact(s)",
        summary.appended, summary.merged
    );

    Ok(())
}

/// Enumerate the feed and extract an artifact per announcement page. Each
/// link is isolated: a failed page is logged and the rest continue.
async fn sync_feed(registry: &FeedRegistry, args: &Args) -> anyhow::Result<()> {
    let feed_url = registry.resolve(&args.feed)?;
    info!("Enumerating feed {:?} at {}", args.feed, feed_url);

    let fetcher = Fetcher::new(&FetchConfig::default());
    let enumerator = LinkEnumerator::new(&fetcher);
    let links = enumerator.enumerate(&feed_url).await?;

    let token = std::env::var("RENDERER_TOKEN").ok();
    let renderer = PageRenderer::new(&args.renderer_url, token.as_deref());
    let extractor = PageExtractor::new(&renderer, &args.artifact_dir);

    for link in &links {
        info!("Processing: {} - {}", link.title, link.link);
        match extractor.extract(&link.link).await {
            Ok(ExtractOutcome::Written { path, paragraphs }) => {
                info!("Wrote {} paragraph(s) to {}", paragraphs, path.display())
            }
            Ok(ExtractOutcome::Skipped { path }) => {
                info!("Artifact {} already present", path.display())
            }
            Err(e) => warn!("Extraction failed for {}: {}", link.link, e),
        }
    }

    Ok(())
}
