// src/discovery/payload.rs
// Extraction of job candidates from captured discovery-surface payloads.
// The surface's API answers in several envelope shapes and the entries
// themselves vary by recipe, so every accessor here is an explicit
// normalization path to the one RawCandidate shape; nothing payload-shaped
// leaves this module.

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::discovery::RawCandidate;

/// Normalize a text field lifted from a payload: entity-decode, strip tags,
/// collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Pull every job-shaped object out of a payload envelope. Handles the
/// three envelopes the surface uses: `included` (entity graph), `elements`
/// (plain list), and `data` (keyed sub-objects).
fn job_objects(payload: &Value) -> Vec<&Value> {
    let mut jobs = Vec::new();

    if let Some(included) = payload.get("included").and_then(Value::as_array) {
        for item in included {
            let urn = item.get("entityUrn").and_then(Value::as_str).unwrap_or_default();
            if urn.to_lowercase().contains("jobposting") {
                jobs.push(item);
            }
        }
    }

    if let Some(elements) = payload.get("elements").and_then(Value::as_array) {
        jobs.extend(elements.iter().filter(|e| e.is_object()));
    }

    if let Some(data) = payload.get("data").and_then(Value::as_object) {
        for (key, value) in data {
            if !key.to_lowercase().contains("job") {
                continue;
            }
            match value {
                Value::Array(items) => jobs.extend(items.iter().filter(|v| v.is_object())),
                Value::Object(_) => jobs.push(value),
                _ => {}
            }
        }
    }

    jobs
}

/// Candidates from one captured payload. Malformed entries are skipped one
/// at a time, never failing the payload.
pub fn extract_candidates(payload: &Value, surface_base: &str) -> Vec<RawCandidate> {
    job_objects(payload)
        .into_iter()
        .filter_map(|job| candidate_from_value(job, surface_base))
        .collect()
}

fn candidate_from_value(job: &Value, surface_base: &str) -> Option<RawCandidate> {
    let id = extract_id(job)?;
    let title = normalize_text(job.get("title").and_then(Value::as_str)?);
    let company_name = normalize_text(&extract_company_name(job)?);
    if title.is_empty() || company_name.is_empty() {
        return None;
    }

    let location = extract_location(job).map(|l| normalize_text(&l)).filter(|l| !l.is_empty());

    Some(RawCandidate {
        source_url: format!("{}/jobs/view/{}", surface_base.trim_end_matches('/'), id),
        id,
        title,
        company_name,
        location,
        apply_url: extract_apply_url(job),
    })
}

fn extract_id(job: &Value) -> Option<String> {
    if let Some(urn) = job.get("entityUrn").and_then(Value::as_str) {
        if let Some(id) = urn.rsplit(':').next().filter(|s| !s.is_empty()) {
            return Some(id.to_string());
        }
    }
    for key in ["jobPostingId", "id"] {
        match job.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    job.get("trackingUrn")
        .and_then(Value::as_str)
        .and_then(|urn| urn.rsplit(':').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn extract_company_name(job: &Value) -> Option<String> {
    let company = job.get("companyDetails").or_else(|| job.get("company"));
    match company {
        Some(Value::Object(obj)) => {
            for key in ["name", "companyName"] {
                if let Some(name) = obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()) {
                    return Some(name.to_string());
                }
            }
            // one level of nesting: {company: {name}}
            obj.get("company")
                .and_then(|c| c.get("name"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => job
            .get("companyName")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

fn extract_location(job: &Value) -> Option<String> {
    if let Some(s) = job.get("formattedLocation").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    if let Some(loc) = job.get("location") {
        match loc {
            Value::String(s) => return Some(s.clone()),
            Value::Object(obj) => {
                for key in ["defaultLocalizedName", "name"] {
                    if let Some(s) = obj.get(key).and_then(Value::as_str) {
                        return Some(s.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    job.get("locationName").and_then(Value::as_str).map(str::to_string)
}

/// Apply URL from a job entry. The surface spreads it over several keys and
/// sometimes nests it in the apply-method object.
pub fn extract_apply_url(job: &Value) -> Option<String> {
    const KEYS: [&str; 5] = [
        "applyUrl",
        "applyMethod",
        "externalApplyUrl",
        "companyApplyUrl",
        "offSiteApplyUrl",
    ];
    for key in KEYS {
        match job.get(key) {
            Some(Value::String(s)) if s.starts_with("http") => return Some(s.clone()),
            Some(Value::Object(obj)) => {
                for inner in ["url", "companyApplyUrl"] {
                    if let Some(url) = obj.get(inner).and_then(Value::as_str) {
                        if url.starts_with("http") {
                            return Some(url.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}
