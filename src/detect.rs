// src/detect.rs
// ATS provider detection from URLs. Ordered pattern matching: the first
// provider in registration order whose pattern matches wins, so overlapping
// signatures resolve deterministically.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::model::Provider;

static ATS_URL_PATTERNS: Lazy<Vec<(Provider, Vec<Regex>)>> = Lazy::new(|| {
    let table: [(Provider, &[&str]); 9] = [
        (
            Provider::Workday,
            &[
                r"myworkdayjobs\.com",
                r"wd\d+\.myworkdaysite\.com",
                r"wd\d+\.myworkdayjobs\.com",
                r"workday\.com/.*careers",
                r"\.wd\d+\.",
            ],
        ),
        (
            Provider::Greenhouse,
            &[
                r"boards\.greenhouse\.io",
                r"job-boards\.greenhouse\.io",
                r"greenhouse\.io/.*embed",
            ],
        ),
        (Provider::Lever, &[r"jobs\.lever\.co", r"lever\.co/.*apply"]),
        (
            Provider::Icims,
            &[r"careers-.*\.icims\.com", r"icims\.com", r"jobs\..*\.com/.*icims"],
        ),
        (
            Provider::Taleo,
            &[r"taleo\.net", r"oracle\.com/.*taleo", r"taleo\.com"],
        ),
        (
            Provider::BambooHr,
            &[r"\.bamboohr\.com/careers", r"\.bamboohr\.com/jobs"],
        ),
        (
            Provider::Jobvite,
            &[r"jobs\.jobvite\.com", r"\.jobvite\.com"],
        ),
        (
            Provider::SmartRecruiters,
            &[r"jobs\.smartrecruiters\.com", r"careers\.smartrecruiters\.com"],
        ),
        (
            Provider::Ashby,
            &[r"jobs\.ashbyhq\.com", r"\.ashbyhq\.com"],
        ),
    ];
    table
        .into_iter()
        .map(|(provider, pats)| {
            let compiled = pats.iter().map(|p| Regex::new(p).expect("ats pattern")).collect();
            (provider, compiled)
        })
        .collect()
});

/// Detect the ATS provider behind a URL. Total: empty input and unmatched
/// URLs yield [`Provider::Unknown`].
pub fn detect(url: &str) -> Provider {
    if url.is_empty() {
        return Provider::Unknown;
    }
    let url = url.to_lowercase();
    for (provider, patterns) in ATS_URL_PATTERNS.iter() {
        if patterns.iter().any(|p| p.is_match(&url)) {
            return *provider;
        }
    }
    Provider::Unknown
}

pub fn is_ats_url(url: &str) -> bool {
    detect(url) != Provider::Unknown
}

/// Base career-page URL (`scheme://host[:port]`) of an apply URL, used for
/// ProviderInfo and for tenant-addressed providers like Workday.
pub fn career_page_base_url(apply_url: &str) -> Option<String> {
    let parsed = Url::parse(apply_url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}
