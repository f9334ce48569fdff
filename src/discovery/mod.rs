// src/discovery/mod.rs
pub mod guest_search;
pub mod payload;

use anyhow::Result;
use chrono::Utc;
use futures::stream::BoxStream;

use crate::classify::{classify, is_external_apply};
use crate::detect;
use crate::model::{Posting, Provider, Source};

/// Parameters of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
    /// Upper bound on candidates yielded; the orchestrator enforces it too.
    pub max: usize,
}

/// Minimal candidate shape crossing the discovery boundary. Everything
/// richer stays behind the collaborator.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub apply_url: Option<String>,
    pub source_url: String,
}

/// A discovery surface: produces a lazy, finite, non-restartable sequence of
/// candidates. A fresh `search` call starts over and may return different
/// results; there is no resumption mid-sequence.
pub trait DiscoverySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stable tag for postings this source produces.
    fn extraction_method(&self) -> &'static str {
        "network_interception"
    }

    fn search(&self, query: SearchQuery) -> BoxStream<'static, Result<RawCandidate>>;
}

/// Normalize a raw candidate into the canonical posting shape. Origin is
/// classified here, once, from what the apply URL looks like right now;
/// there is no retroactive reclassification.
pub fn into_posting(raw: RawCandidate, extraction_method: &str) -> Posting {
    let provider = raw
        .apply_url
        .as_deref()
        .map(detect::detect)
        .unwrap_or(Provider::Unknown);
    let external = raw
        .apply_url
        .as_deref()
        .map(|apply| is_external_apply(&raw.source_url, apply))
        .unwrap_or(false);
    let origin = classify(external, provider);

    Posting {
        id: raw.id,
        title: raw.title,
        company_name: raw.company_name,
        location: raw.location,
        source: Source::Discovery,
        source_url: raw.source_url,
        apply_url: raw.apply_url,
        provider: (provider != Provider::Unknown).then_some(provider),
        origin,
        extraction_method: extraction_method.to_string(),
        extracted_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Origin;

    fn candidate(apply_url: Option<&str>) -> RawCandidate {
        RawCandidate {
            id: "99".into(),
            title: "Engineer".into(),
            company_name: "Acme".into(),
            location: Some("Remote".into()),
            apply_url: apply_url.map(str::to_string),
            source_url: "https://www.surface.example/jobs/view/99".into(),
        }
    }

    #[test]
    fn ats_apply_url_classifies_ats() {
        let p = into_posting(candidate(Some("https://boards.greenhouse.io/acme/jobs/1")), "network_interception");
        assert_eq!(p.origin, Origin::Ats);
        assert_eq!(p.provider, Some(Provider::Greenhouse));
        assert_eq!(p.source, Source::Discovery);
    }

    #[test]
    fn missing_apply_url_classifies_native() {
        let p = into_posting(candidate(None), "network_interception");
        assert_eq!(p.origin, Origin::Native);
        assert_eq!(p.provider, None);
    }

    #[test]
    fn external_but_unknown_provider_classifies_native() {
        let p = into_posting(candidate(Some("https://careers.acme.com/jobs/1")), "network_interception");
        assert_eq!(p.origin, Origin::Native);
        assert_eq!(p.provider, None);
    }

    #[test]
    fn same_surface_apply_url_classifies_native() {
        // apply URL back onto the surface itself: not external, stays native
        // even though nothing about the host is provider-shaped anyway.
        let p = into_posting(candidate(Some("https://surface.example/apply/99")), "network_interception");
        assert_eq!(p.origin, Origin::Native);
    }
}
