use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use render_client::RenderClient;
use storia_harvest::config::Config;
use storia_harvest::page_source::RemotePage;
use storia_harvest::run;

/// Harvest apartment listings from storia.ro into an append-only CSV dataset.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the output CSV file
    #[arg(short, long)]
    output: Option<std::path::PathBuf>,

    /// Maximum number of result pages to visit
    #[arg(short, long)]
    max_pages: Option<u32>,

    /// Skip detail-page enrichment
    #[arg(long)]
    no_enrich: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("storia_harvest=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::from_env();
    if let Some(output) = args.output {
        cfg.output_path = output;
    }
    if let Some(max_pages) = args.max_pages {
        cfg.max_pages = max_pages;
    }
    if args.no_enrich {
        cfg.enrich_enabled = false;
    }

    info!(
        base_url = cfg.base_url.as_str(),
        max_pages = cfg.max_pages,
        enrich = cfg.enrich_enabled,
        "Storia harvest starting"
    );

    // One client identity per run, shared by both sessions.
    let user_agent = cfg.pick_user_agent();
    let client = RenderClient::new(&cfg.render_url, cfg.render_token.as_deref(), &user_agent);

    // Results and detail pages get their own sessions so enrichment never
    // disturbs the results page's state.
    let mut results = RemotePage::new(client.clone());
    let mut detail = RemotePage::new(client);

    let summary = run::run(&cfg, &mut results, &mut detail).await?;

    info!(
        total_rows = summary.total_rows,
        output = %summary.output_path.display(),
        debug_dir = %summary.debug_dir.display(),
        cache_size = summary.cache_size,
        "Harvest complete"
    );
    Ok(())
}
