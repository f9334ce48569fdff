// src/ats/smartrecruiters.rs
// SmartRecruiters public postings API client.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::ats::{FetchClient, FetchContext};
use crate::model::{Origin, Posting, Provider, Source};

const API_BASE: &str = "https://api.smartrecruiters.com/v1/companies";

pub struct SmartRecruitersClient {
    ctx: FetchContext,
}

impl SmartRecruitersClient {
    pub fn new(ctx: FetchContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct SrPosting {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
    name: String,
    #[serde(default)]
    location: SrLocation,
}

#[derive(Debug, Default, Deserialize)]
struct SrLocation {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl SrLocation {
    fn render(self) -> Option<String> {
        match (self.city, self.region) {
            (Some(city), Some(region)) if !city.is_empty() && !region.is_empty() => {
                Some(format!("{city}, {region}"))
            }
            (Some(city), _) if !city.is_empty() => Some(city),
            _ => None,
        }
    }
}

pub fn postings_from_payload(payload: &Value, slug: &str, company_name: &str, max: usize) -> Vec<Posting> {
    let items = payload
        .get("content")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SrPosting>(item).ok())
        .filter_map(|job| {
            let id = job.id.clone().or(job.uuid.clone()).filter(|s| !s.is_empty())?;
            if job.name.is_empty() {
                return None;
            }
            Some((id, job))
        })
        .take(max)
        .map(|(id, job)| {
            let url = format!("https://jobs.smartrecruiters.com/{slug}/{id}");
            Posting {
                id,
                title: job.name,
                company_name: company_name.to_string(),
                location: job.location.render(),
                source: Source::Ats,
                source_url: url.clone(),
                apply_url: Some(url),
                provider: Some(Provider::SmartRecruiters),
                origin: Origin::Ats,
                extraction_method: "ats_api".into(),
                extracted_at: Utc::now(),
            }
        })
        .collect()
}

#[async_trait]
impl FetchClient for SmartRecruitersClient {
    fn provider(&self) -> Provider {
        Provider::SmartRecruiters
    }

    fn extract_slug(&self, url: &str) -> Option<String> {
        static RES: OnceCell<Vec<Regex>> = OnceCell::new();
        let res = RES.get_or_init(|| {
            vec![
                Regex::new(r"jobs\.smartrecruiters\.com/([^/?#]+)").unwrap(),
                Regex::new(r"careers\.smartrecruiters\.com/([^/?#]+)").unwrap(),
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
        let payload = self.ctx.get_json(&format!("{API_BASE}/{slug}/postings")).await?;
        let postings = postings_from_payload(&payload, slug, company_name, max);
        tracing::debug!(company = company_name, count = postings.len(), "smartrecruiters fetch");
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_content_and_prefers_id_over_uuid() {
        let payload = json!({
            "content": [
                {"id": "744", "uuid": "u-1", "name": "Engineer",
                 "location": {"city": "Boston", "region": "MA"}},
                {"uuid": "u-2", "name": "Designer", "location": {"city": "Remote"}},
                {"name": "no identifiers"}
            ]
        });
        let out = postings_from_payload(&payload, "Acme", "Acme", 50);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "744");
        assert_eq!(out[0].location.as_deref(), Some("Boston, MA"));
        assert_eq!(out[1].id, "u-2");
        assert_eq!(out[1].location.as_deref(), Some("Remote"));
    }
}
