// src/ats/greenhouse.rs
// Greenhouse public board API client.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::ats::{FetchClient, FetchContext};
use crate::model::{Origin, Posting, Provider, Source};

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

pub struct GreenhouseClient {
    ctx: FetchContext,
}

impl GreenhouseClient {
    pub fn new(ctx: FetchContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct BoardJob {
    id: i64,
    title: String,
    #[serde(default)]
    location: Option<BoardLocation>,
    #[serde(default)]
    absolute_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BoardLocation {
    #[serde(default)]
    name: Option<String>,
}

/// Board payload -> canonical postings. Entries that fail to deserialize
/// are skipped one at a time.
pub fn postings_from_payload(payload: &Value, slug: &str, company_name: &str, max: usize) -> Vec<Posting> {
    let jobs = payload.get("jobs").and_then(Value::as_array).cloned().unwrap_or_default();
    jobs.into_iter()
        .filter_map(|item| serde_json::from_value::<BoardJob>(item).ok())
        .filter(|job| !job.title.is_empty())
        .take(max)
        .map(|job| {
            let url = job
                .absolute_url
                .unwrap_or_else(|| format!("https://boards.greenhouse.io/{slug}/jobs/{}", job.id));
            Posting {
                id: job.id.to_string(),
                title: job.title,
                company_name: company_name.to_string(),
                location: job.location.and_then(|l| l.name).filter(|n| !n.is_empty()),
                source: Source::Ats,
                source_url: url.clone(),
                apply_url: Some(url),
                provider: Some(Provider::Greenhouse),
                origin: Origin::Ats,
                extraction_method: "ats_api".into(),
                extracted_at: Utc::now(),
            }
        })
        .collect()
}

#[async_trait]
impl FetchClient for GreenhouseClient {
    fn provider(&self) -> Provider {
        Provider::Greenhouse
    }

    fn extract_slug(&self, url: &str) -> Option<String> {
        static RES: OnceCell<Vec<Regex>> = OnceCell::new();
        let res = RES.get_or_init(|| {
            vec![
                Regex::new(r"boards\.greenhouse\.io/([^/?#]+)").unwrap(),
                Regex::new(r"job-boards\.greenhouse\.io/([^/?#]+)").unwrap(),
                Regex::new(r"greenhouse\.io/.*embed/job_board/js\?for=([^&]+)").unwrap(),
            ]
        });
        res.iter()
            .find_map(|re| re.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
    }

    async fn fetch(
        &self,
        slug: &str,
        company_name: &str,
        _base_url: Option<&str>,
        max: usize,
    ) -> Result<Vec<Posting>> {
        let payload = self.ctx.get_json(&format!("{API_BASE}/{slug}/jobs")).await?;
        let postings = postings_from_payload(&payload, slug, company_name, max);
        tracing::debug!(company = company_name, count = postings.len(), "greenhouse fetch");
        Ok(postings)
    }
}
