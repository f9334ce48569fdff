// src/classify.rs
// Origin classification. Evaluated once per candidate, at the moment its
// apply URL is known; never re-evaluated later even if richer ATS-side data
// contradicts it.

use url::Url;

use crate::model::{Origin, Provider};

/// A posting belongs to an external ATS iff it advertises an external apply
/// URL AND that URL resolves to a known provider. Everything else is native
/// to the discovery surface.
pub fn classify(has_external_apply_url: bool, provider: Provider) -> Origin {
    if has_external_apply_url && provider != Provider::Unknown {
        Origin::Ats
    } else {
        Origin::Native
    }
}

/// Whether an apply URL points off the discovery surface, judged by
/// registrable host: `jobs.surface.example` and `www.surface.example` are
/// the same surface.
pub fn is_external_apply(source_url: &str, apply_url: &str) -> bool {
    match (registrable_host(source_url), registrable_host(apply_url)) {
        (Some(source), Some(apply)) => source != apply,
        _ => false,
    }
}

fn registrable_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let mut labels: Vec<&str> = host.rsplit('.').collect();
    labels.truncate(2);
    labels.reverse();
    Some(labels.join("."))
}
