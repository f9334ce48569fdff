// src/model.rs
// Canonical data model shared by every retrieval path. Field names are the
// wire contract: serialized output must round-trip losslessly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a posting was physically retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Discovery,
    Ats,
    CareerPage,
}

/// Whose data is authoritative for a posting: an external ATS, or the
/// discovery surface itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    Ats,
    Native,
}

/// Known ATS platforms, detectable from apply URLs. Not every detectable
/// provider has a fetch client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Workday,
    Greenhouse,
    Lever,
    Icims,
    Taleo,
    BambooHr,
    Jobvite,
    SmartRecruiters,
    Ashby,
    Unknown,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Workday => "workday",
            Provider::Greenhouse => "greenhouse",
            Provider::Lever => "lever",
            Provider::Icims => "icims",
            Provider::Taleo => "taleo",
            Provider::BambooHr => "bamboohr",
            Provider::Jobvite => "jobvite",
            Provider::SmartRecruiters => "smartrecruiters",
            Provider::Ashby => "ashby",
            Provider::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run was shut out of the remote surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    LoginRequired,
    CaptchaDetected,
    Authwall,
    Checkpoint,
    RateLimited,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::LoginRequired => "login_required",
            BlockReason::CaptchaDetected => "captcha_detected",
            BlockReason::Authwall => "authwall",
            BlockReason::Checkpoint => "checkpoint",
            BlockReason::RateLimited => "rate_limited",
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized job posting. Immutable once created; a posting is never
/// patched in place, only replaced wholesale if re-derived.
///
/// `id` is unique only within a company. Global identity is the composite
/// `(company_name.lower(), id)`; see [`crate::dedup::DedupIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(rename = "job_id")]
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub source: Source,
    pub source_url: String,
    pub apply_url: Option<String>,
    pub provider: Option<Provider>,
    pub origin: Origin,
    /// Stable tag naming the retrieval strategy that produced this record
    /// ("ats_api", "network_interception", ...).
    pub extraction_method: String,
    pub extracted_at: DateTime<Utc>,
}

impl Posting {
    /// Lower-cased company name: the partitioning and dedup scope.
    pub fn company_key(&self) -> String {
        self.company_name.to_lowercase()
    }
}

/// Mutable state of a single run. Transitions are forward-only: `is_blocked`
/// flips false -> true at most once and is never reset; `block_reason` is set
/// atomically with the flip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub is_blocked: bool,
    pub block_reason: Option<BlockReason>,
    pub postings_collected: u64,
    pub requests_made: u64,
    pub errors: Vec<String>,
}

/// Per-company provider cache entry, written once per run on the first
/// successful ATS fetch for that company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub company_name: String,
    pub provider: Provider,
    pub base_url: String,
    pub posting_count: u64,
    pub fetched_at: DateTime<Utc>,
}

/// Terminal snapshot of a pipeline run. Built once at aggregation and
/// read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub postings: Vec<Posting>,
    pub provider_companies: BTreeMap<String, ProviderInfo>,
    pub native_companies: Vec<String>,
    pub run_state: RunState,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_values_are_stable() {
        assert_eq!(serde_json::to_string(&Source::CareerPage).unwrap(), "\"career_page\"");
        assert_eq!(serde_json::to_string(&Origin::Ats).unwrap(), "\"ATS\"");
        assert_eq!(serde_json::to_string(&Origin::Native).unwrap(), "\"NATIVE\"");
        assert_eq!(
            serde_json::to_string(&Provider::SmartRecruiters).unwrap(),
            "\"smartrecruiters\""
        );
        assert_eq!(serde_json::to_string(&Provider::BambooHr).unwrap(), "\"bamboohr\"");
        assert_eq!(
            serde_json::to_string(&BlockReason::LoginRequired).unwrap(),
            "\"login_required\""
        );
    }

    #[test]
    fn posting_id_serializes_as_job_id() {
        let p = Posting {
            id: "123".into(),
            title: "Engineer".into(),
            company_name: "Acme".into(),
            location: None,
            source: Source::Discovery,
            source_url: "https://surface.example/jobs/view/123".into(),
            apply_url: None,
            provider: None,
            origin: Origin::Native,
            extraction_method: "network_interception".into(),
            extracted_at: Utc::now(),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["job_id"], "123");
        assert!(v.get("id").is_none());
    }

    #[test]
    fn company_key_is_lowercased() {
        let mut p = sample();
        p.company_name = "Acme Robotics".into();
        assert_eq!(p.company_key(), "acme robotics");
    }

    fn sample() -> Posting {
        Posting {
            id: "1".into(),
            title: "t".into(),
            company_name: "c".into(),
            location: None,
            source: Source::Discovery,
            source_url: String::new(),
            apply_url: None,
            provider: None,
            origin: Origin::Native,
            extraction_method: "network_interception".into(),
            extracted_at: Utc::now(),
        }
    }
}
