// src/report.rs
// Run report: the persisted artifact of one pipeline run. Origin/provider
// distributions are computed here — the orchestrator hands over the raw
// snapshot and stays out of the statistics business.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{BlockReason, Origin, PipelineResult};

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub total_postings: usize,
    pub blocked: bool,
    pub block_reason: Option<BlockReason>,
    pub origin_distribution: BTreeMap<String, u64>,
    pub provider_distribution: BTreeMap<String, u64>,
    pub result: PipelineResult,
}

pub fn build_report(result: PipelineResult) -> RunReport {
    let mut origin_distribution: BTreeMap<String, u64> = BTreeMap::new();
    let mut provider_distribution: BTreeMap<String, u64> = BTreeMap::new();

    for posting in &result.postings {
        let origin = match posting.origin {
            Origin::Ats => "ATS",
            Origin::Native => "NATIVE",
        };
        *origin_distribution.entry(origin.to_string()).or_default() += 1;
        if let Some(provider) = posting.provider {
            *provider_distribution.entry(provider.as_str().to_string()).or_default() += 1;
        }
    }

    RunReport {
        generated_at: Utc::now(),
        total_postings: result.postings.len(),
        blocked: result.run_state.is_blocked,
        block_reason: result.run_state.block_reason,
        origin_distribution,
        provider_distribution,
        result,
    }
}

pub fn write_json(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating report dir {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(report).context("serializing report")?;
    std::fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Posting, Provider, RunState, Source};
    use chrono::Utc;

    fn posting(company: &str, id: &str, origin: Origin, provider: Option<Provider>) -> Posting {
        Posting {
            id: id.into(),
            title: "t".into(),
            company_name: company.into(),
            location: None,
            source: Source::Discovery,
            source_url: String::new(),
            apply_url: None,
            provider,
            origin,
            extraction_method: "network_interception".into(),
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn distributions_count_postings() {
        let result = PipelineResult {
            postings: vec![
                posting("a", "1", Origin::Ats, Some(Provider::Greenhouse)),
                posting("a", "2", Origin::Ats, Some(Provider::Greenhouse)),
                posting("b", "1", Origin::Native, None),
            ],
            provider_companies: Default::default(),
            native_companies: vec!["b".into()],
            run_state: RunState::default(),
            errors: vec![],
            completed_at: Utc::now(),
        };
        let report = build_report(result);
        assert_eq!(report.total_postings, 3);
        assert_eq!(report.origin_distribution["ATS"], 2);
        assert_eq!(report.origin_distribution["NATIVE"], 1);
        assert_eq!(report.provider_distribution["greenhouse"], 2);
        assert!(!report.blocked);
    }
}
