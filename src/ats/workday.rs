// src/ats/workday.rs
// Workday client. Workday has no global board API: the endpoint is tenant
// scoped and must be reconstructed from the company's own apply URL, so this
// client requires `base_url` and resolves to nothing without it.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::ats::{derived_id, FetchClient, FetchContext};
use crate::model::{Origin, Posting, Provider, Source};

pub struct WorkdayClient {
    ctx: FetchContext,
}

impl WorkdayClient {
    pub fn new(ctx: FetchContext) -> Self {
        Self { ctx }
    }
}

/// Tenant API URL from an apply URL. Two layouts exist in the wild: a
/// `/d/{tenant}/` path segment, or `myworkdayjobs.com/{site}` with the
/// tenant as the host's first label.
fn build_api_url(base_url: &str, slug: &str) -> Option<String> {
    let parsed = Url::parse(base_url).ok()?;
    let origin = format!("{}://{}", parsed.scheme(), parsed.host_str()?);

    static RE_D: OnceCell<Regex> = OnceCell::new();
    let re_d = RE_D.get_or_init(|| Regex::new(r"/d/([^/]+)/").unwrap());
    if let Some(tenant) = re_d.captures(base_url).and_then(|c| c.get(1)) {
        return Some(format!("{origin}/wday/cxs/{}/{slug}/jobs", tenant.as_str()));
    }

    static RE_SITE: OnceCell<Regex> = OnceCell::new();
    let re_site = RE_SITE.get_or_init(|| Regex::new(r"myworkdayjobs\.com/([^/?#]+)").unwrap());
    if let Some(site) = re_site.captures(base_url).and_then(|c| c.get(1)) {
        let tenant = parsed.host_str()?.split('.').next()?.to_string();
        return Some(format!("{origin}/wday/cxs/{tenant}/{}/jobs", site.as_str()));
    }

    None
}

#[derive(Debug, Deserialize)]
struct WorkdayJob {
    title: String,
    #[serde(default, rename = "bulletFields")]
    bullet_fields: Vec<String>,
    #[serde(default, rename = "locationsText")]
    locations_text: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, rename = "externalPath")]
    external_path: Option<String>,
}

pub fn postings_from_payload(
    payload: &Value,
    base_url: &str,
    company_name: &str,
    max: usize,
) -> Vec<Posting> {
    let jobs = payload
        .get("jobPostings")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let origin_base = Url::parse(base_url).ok();

    jobs.into_iter()
        .filter_map(|item| serde_json::from_value::<WorkdayJob>(item).ok())
        .filter(|job| !job.title.is_empty())
        .take(max)
        .map(|job| {
            let id = job
                .bullet_fields
                .first()
                .filter(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| derived_id(&[&job.title, company_name]));
            let location = job
                .locations_text
                .or(job.location)
                .filter(|l| !l.is_empty());
            let source_url = match (&origin_base, job.external_path.as_deref()) {
                (Some(base), Some(path)) => base
                    .join(path)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| base_url.to_string()),
                _ => base_url.to_string(),
            };
            Posting {
                id,
                title: job.title,
                company_name: company_name.to_string(),
                location,
                source: Source::Ats,
                source_url: source_url.clone(),
                apply_url: Some(source_url),
                provider: Some(Provider::Workday),
                origin: Origin::Ats,
                extraction_method: "ats_api".into(),
                extracted_at: Utc::now(),
            }
        })
        .collect()
}

#[async_trait]
impl FetchClient for WorkdayClient {
    fn provider(&self) -> Provider {
        Provider::Workday
    }

    fn extract_slug(&self, url: &str) -> Option<String> {
        static RES: OnceCell<Vec<Regex>> = OnceCell::new();
        let res = RES.get_or_init(|| {
            vec![
                Regex::new(r"myworkdayjobs\.com/([^/?#]+)").unwrap(),
                Regex::new(r"wd\d+\.myworkdaysite\.com/.*?/([^/?#]+)").unwrap(),
            ]
        });
        res.iter()
            .find_map(|re| re.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
    }

    async fn fetch(
        &self,
        slug: &str,
        company_name: &str,
        base_url: Option<&str>,
        max: usize,
    ) -> Result<Vec<Posting>> {
        let base_url = base_url.context("workday requires the apply url as base")?;
        let Some(api_url) = build_api_url(base_url, slug) else {
            bail!("could not build workday api url from {base_url}");
        };
        let payload = self.ctx.get_json(&api_url).await?;
        let postings = postings_from_payload(&payload, base_url, company_name, max);
        tracing::debug!(company = company_name, count = postings.len(), "workday fetch");
        Ok(postings)
    }
}
