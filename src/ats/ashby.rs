// src/ats/ashby.rs
// Ashby public job-board API client.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::ats::{FetchClient, FetchContext};
use crate::model::{Origin, Posting, Provider, Source};

const API_BASE: &str = "https://api.ashbyhq.com/posting-api/job-board";

pub struct AshbyClient {
    ctx: FetchContext,
}

impl AshbyClient {
    pub fn new(ctx: FetchContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct AshbyJob {
    id: String,
    title: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, rename = "jobUrl")]
    job_url: Option<String>,
}

pub fn postings_from_payload(payload: &Value, slug: &str, company_name: &str, max: usize) -> Vec<Posting> {
    let jobs = payload.get("jobs").and_then(Value::as_array).cloned().unwrap_or_default();
    jobs.into_iter()
        .filter_map(|item| serde_json::from_value::<AshbyJob>(item).ok())
        .filter(|job| !job.id.is_empty() && !job.title.is_empty())
        .take(max)
        .map(|job| {
            let url = job
                .job_url
                .unwrap_or_else(|| format!("https://jobs.ashbyhq.com/{slug}/{}", job.id));
            Posting {
                id: job.id,
                title: job.title,
                company_name: company_name.to_string(),
                location: job.location.filter(|l| !l.is_empty()),
                source: Source::Ats,
                source_url: url.clone(),
                apply_url: Some(url),
                provider: Some(Provider::Ashby),
                origin: Origin::Ats,
                extraction_method: "ats_api".into(),
                extracted_at: Utc::now(),
            }
        })
        .collect()
}

#[async_trait]
impl FetchClient for AshbyClient {
    fn provider(&self) -> Provider {
        Provider::Ashby
    }

    fn extract_slug(&self, url: &str) -> Option<String> {
        static RES: OnceCell<Vec<Regex>> = OnceCell::new();
        let res = RES.get_or_init(|| {
            vec![
                Regex::new(r"jobs\.ashbyhq\.com/([^/?#]+)").unwrap(),
                Regex::new(r"ashbyhq\.com/([^/?#]+)").unwrap(),
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
        let payload = self.ctx.get_json(&format!("{API_BASE}/{slug}")).await?;
        let postings = postings_from_payload(&payload, slug, company_name, max);
        tracing::debug!(company = company_name, count = postings.len(), "ashby fetch");
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_jobs_and_builds_urls() {
        let payload = json!({
            "jobs": [
                {"id": "x1", "title": "Engineer", "location": "Berlin"},
                {"id": "x2", "title": "", "location": "skipped"}
            ]
        });
        let out = postings_from_payload(&payload, "acme", "Acme", 50);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_url, "https://jobs.ashbyhq.com/acme/x1");
    }
}
