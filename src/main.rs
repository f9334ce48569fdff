//! Job Harvester — Binary Entrypoint
//! One pipeline run: discover, classify, fetch per-company ATS postings,
//! reconcile, write the JSON report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_harvester::ats::{ClientRegistry, FetchContext};
use job_harvester::block::BlockMonitor;
use job_harvester::config::PipelineConfig;
use job_harvester::discovery::guest_search::GuestSearchDiscovery;
use job_harvester::discovery::SearchQuery;
use job_harvester::pipeline::{IngestionPipeline, PipelineOptions};
use job_harvester::rate::RateGovernor;
use job_harvester::{http, report};

#[derive(Debug, Parser)]
#[command(name = "job-harvester", about = "Discover job postings and reconcile them against ATS APIs.")]
struct Args {
    /// Search keywords (empty searches everything).
    #[arg(short, long, default_value = "")]
    keywords: String,

    /// Search location filter.
    #[arg(short, long, default_value = "")]
    location: String,

    /// Cap on candidates consumed from discovery (overrides config).
    #[arg(short, long)]
    max: Option<usize>,

    /// Skip ATS retrieval; discovery data is final.
    #[arg(long)]
    no_fetch_ats: bool,

    /// Where to write the JSON report.
    #[arg(short, long, default_value = "reports/run.json")]
    output: PathBuf,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("job_harvester=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op where there is none.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let cfg = PipelineConfig::load_default()?;

    let http = http::build_client(cfg.request_timeout_secs)?;
    let monitor = Arc::new(BlockMonitor::new());
    let governor = Arc::new(RateGovernor::from_millis(cfg.rate_limit_ms));

    let discovery = Arc::new(GuestSearchDiscovery::new(
        http.clone(),
        cfg.surface_base_url.clone(),
        monitor.clone(),
        governor.clone(),
    ));
    let clients = ClientRegistry::standard(FetchContext {
        http,
        monitor: monitor.clone(),
        governor,
    });

    let pipeline = IngestionPipeline::new(
        discovery,
        clients,
        monitor,
        PipelineOptions {
            fetch_ats: cfg.fetch_ats && !args.no_fetch_ats,
            max_per_company: cfg.max_per_company,
        },
    );

    let query = SearchQuery {
        keywords: args.keywords,
        location: args.location,
        max: args.max.unwrap_or(cfg.max_postings),
    };
    let result = pipeline.run(query).await;

    if result.run_state.is_blocked {
        tracing::warn!(reason = ?result.run_state.block_reason, "run ended blocked; results are partial");
    }
    for error in &result.errors {
        tracing::warn!(%error, "run error");
    }

    let report = report::build_report(result);
    tracing::info!(
        total = report.total_postings,
        origins = ?report.origin_distribution,
        providers = ?report.provider_distribution,
        "run complete"
    );
    report::write_json(&report, &args.output)?;

    Ok(())
}
