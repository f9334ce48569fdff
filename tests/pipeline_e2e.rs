// tests/pipeline_e2e.rs
// End-to-end reconciliation: a native company passes through untouched, an
// ATS company's corpus comes from its provider, and an identity seen first
// at discovery survives the collapse.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use futures::StreamExt;

use job_harvester::ats::{ClientRegistry, FetchClient};
use job_harvester::discovery::{DiscoverySource, RawCandidate, SearchQuery};
use job_harvester::pipeline::{IngestionPipeline, PipelineOptions};
use job_harvester::{BlockMonitor, Origin, Posting, Provider, Source};

struct ListDiscovery {
    candidates: Vec<RawCandidate>,
}

impl DiscoverySource for ListDiscovery {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn search(&self, _query: SearchQuery) -> BoxStream<'static, Result<RawCandidate>> {
        futures::stream::iter(self.candidates.clone().into_iter().map(Ok)).boxed()
    }
}

struct ScriptedBoard {
    ids: Vec<&'static str>,
}

fn ats_posting(id: &str, company: &str) -> Posting {
    Posting {
        id: id.into(),
        title: format!("ATS role {id}"),
        company_name: company.into(),
        location: Some("Remote".into()),
        source: Source::Ats,
        source_url: format!("https://boards.greenhouse.io/acme/jobs/{id}"),
        apply_url: Some(format!("https://boards.greenhouse.io/acme/jobs/{id}")),
        provider: Some(Provider::Greenhouse),
        origin: Origin::Ats,
        extraction_method: "ats_api".into(),
        extracted_at: Utc::now(),
    }
}

#[async_trait]
impl FetchClient for ScriptedBoard {
    fn provider(&self) -> Provider {
        Provider::Greenhouse
    }
    fn extract_slug(&self, url: &str) -> Option<String> {
        url.contains("greenhouse.io").then(|| "acme".to_string())
    }
    async fn fetch(
        &self,
        _slug: &str,
        company_name: &str,
        _base_url: Option<&str>,
        max: usize,
    ) -> Result<Vec<Posting>> {
        Ok(self.ids.iter().take(max).map(|id| ats_posting(id, company_name)).collect())
    }
}

fn candidate(company: &str, id: &str, apply_url: Option<&str>) -> RawCandidate {
    RawCandidate {
        id: id.into(),
        title: format!("Discovered role {id}"),
        company_name: company.into(),
        location: None,
        apply_url: apply_url.map(str::to_string),
        source_url: format!("https://www.surface.example/jobs/view/{id}"),
    }
}

#[tokio::test]
async fn end_to_end_reconciliation_scenario() {
    let monitor = Arc::new(BlockMonitor::new());
    let discovery = ListDiscovery {
        candidates: vec![
            candidate("Acme", "1001", Some("https://boards.greenhouse.io/acme/jobs/1001")),
            candidate("Acme", "1002", Some("https://boards.greenhouse.io/acme/jobs/1002")),
            candidate("Tiny Co", "9001", None),
        ],
    };
    // 5 board postings; "1001" collides with a discovery-time identity.
    let board = ScriptedBoard {
        ids: vec!["1001", "2001", "2002", "2003", "2004"],
    };

    let pipeline = IngestionPipeline::new(
        Arc::new(discovery),
        ClientRegistry::new(vec![Arc::new(board)]),
        monitor,
        PipelineOptions::default(),
    );
    let result = pipeline
        .run(SearchQuery {
            max: 25,
            ..Default::default()
        })
        .await;

    // 1 native Tiny Co posting + 5 Acme postings, duplicate collapsed.
    assert_eq!(result.postings.len(), 6);
    assert_eq!(result.run_state.postings_collected, 6);

    let acme_info = &result.provider_companies["acme"];
    assert_eq!(acme_info.posting_count, 5);
    assert_eq!(acme_info.provider, Provider::Greenhouse);
    assert_eq!(acme_info.base_url, "https://boards.greenhouse.io");

    assert_eq!(result.native_companies, vec!["tiny co".to_string()]);

    // The shared identity survives as the discovery-time instance.
    let shared = result
        .postings
        .iter()
        .find(|p| p.id == "1001" && p.company_key() == "acme")
        .expect("shared identity present");
    assert_eq!(shared.extraction_method, "network_interception");
    assert_eq!(shared.source, Source::Discovery);

    // The discovery-only Acme identity was superseded by the board corpus.
    assert!(!result.postings.iter().any(|p| p.id == "1002"));

    // Board-only identities arrive via the ATS path.
    let board_only = result.postings.iter().find(|p| p.id == "2003").unwrap();
    assert_eq!(board_only.extraction_method, "ats_api");
    assert_eq!(board_only.origin, Origin::Ats);

    assert!(result.errors.is_empty());
    assert!(!result.run_state.is_blocked);
}

#[tokio::test]
async fn fetch_ats_disabled_keeps_discovery_data_final() {
    let monitor = Arc::new(BlockMonitor::new());
    let discovery = ListDiscovery {
        candidates: vec![
            candidate("Acme", "1001", Some("https://boards.greenhouse.io/acme/jobs/1001")),
            candidate("Tiny Co", "9001", None),
        ],
    };
    let board = ScriptedBoard {
        ids: vec!["2001", "2002"],
    };

    let pipeline = IngestionPipeline::new(
        Arc::new(discovery),
        ClientRegistry::new(vec![Arc::new(board)]),
        monitor,
        PipelineOptions {
            fetch_ats: false,
            ..Default::default()
        },
    );
    let result = pipeline
        .run(SearchQuery {
            max: 25,
            ..Default::default()
        })
        .await;

    assert_eq!(result.postings.len(), 2);
    assert!(result.provider_companies.is_empty());
    let ids: Vec<&str> = result.postings.iter().map(|p| p.id.as_str()).collect();
    assert!(ids.contains(&"1001") && ids.contains(&"9001"));
}
