// src/ats/lever.rs
// Lever public postings API client. The payload is a bare array, not an
// object envelope.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::ats::{FetchClient, FetchContext};
use crate::model::{Origin, Posting, Provider, Source};

const API_BASE: &str = "https://api.lever.co/v0/postings";

pub struct LeverClient {
    ctx: FetchContext,
}

impl LeverClient {
    pub fn new(ctx: FetchContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct LeverPosting {
    id: String,
    text: String,
    #[serde(default)]
    categories: LeverCategories,
    #[serde(default, rename = "hostedUrl")]
    hosted_url: Option<String>,
    #[serde(default, rename = "applyUrl")]
    apply_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    #[serde(default)]
    location: Option<String>,
}

pub fn postings_from_payload(payload: &Value, slug: &str, company_name: &str, max: usize) -> Vec<Posting> {
    let items = payload.as_array().cloned().unwrap_or_default();
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<LeverPosting>(item).ok())
        .filter(|job| !job.id.is_empty() && !job.text.is_empty())
        .take(max)
        .map(|job| {
            let hosted = job
                .hosted_url
                .unwrap_or_else(|| format!("https://jobs.lever.co/{slug}/{}", job.id));
            let apply = job.apply_url.unwrap_or_else(|| hosted.clone());
            Posting {
                id: job.id,
                title: job.text,
                company_name: company_name.to_string(),
                location: job.categories.location.filter(|l| !l.is_empty()),
                source: Source::Ats,
                source_url: hosted,
                apply_url: Some(apply),
                provider: Some(Provider::Lever),
                origin: Origin::Ats,
                extraction_method: "ats_api".into(),
                extracted_at: Utc::now(),
            }
        })
        .collect()
}

#[async_trait]
impl FetchClient for LeverClient {
    fn provider(&self) -> Provider {
        Provider::Lever
    }

    fn extract_slug(&self, url: &str) -> Option<String> {
        static RES: OnceCell<Vec<Regex>> = OnceCell::new();
        let res = RES.get_or_init(|| {
            vec![
                Regex::new(r"jobs\.lever\.co/([^/?#]+)").unwrap(),
                Regex::new(r"lever\.co/([^/?#]+)").unwrap(),
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
        tracing::debug!(company = company_name, count = postings.len(), "lever fetch");
        Ok(postings)
    }
}
