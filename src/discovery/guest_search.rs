// src/discovery/guest_search.rs
// Discovery over the surface's guest search endpoint: no session, no DOM.
// Each page is one rate-governed request whose response goes through the
// Block Monitor before anything is parsed; the stream stops yielding the
// moment the monitor trips.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use url::Url;

use crate::block::BlockMonitor;
use crate::discovery::{payload, DiscoverySource, RawCandidate, SearchQuery};
use crate::http;
use crate::rate::RateGovernor;

const GUEST_SEARCH_PATH: &str = "/jobs-guest/api/search";
const PAGE_SIZE: usize = 25;
const MAX_PAGES: usize = 3;

pub struct GuestSearchDiscovery {
    http: reqwest::Client,
    base_url: String,
    monitor: Arc<BlockMonitor>,
    governor: Arc<RateGovernor>,
}

impl GuestSearchDiscovery {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        monitor: Arc<BlockMonitor>,
        governor: Arc<RateGovernor>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            monitor,
            governor,
        }
    }

    fn page_url(&self, query: &SearchQuery, page: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, GUEST_SEARCH_PATH))
            .context("building guest search url")?;
        {
            let mut pairs = url.query_pairs_mut();
            if !query.keywords.is_empty() {
                pairs.append_pair("keywords", &query.keywords);
            }
            if !query.location.is_empty() {
                pairs.append_pair("location", &query.location);
            }
            pairs.append_pair("start", &(page * PAGE_SIZE).to_string());
        }
        Ok(url)
    }
}

impl DiscoverySource for GuestSearchDiscovery {
    fn name(&self) -> &'static str {
        "guest_search"
    }

    fn search(&self, query: SearchQuery) -> BoxStream<'static, Result<RawCandidate>> {
        let http = self.http.clone();
        let monitor = self.monitor.clone();
        let governor = self.governor.clone();
        let base_url = self.base_url.clone();
        let page_urls: Vec<Result<Url>> =
            (0..MAX_PAGES).map(|page| self.page_url(&query, page)).collect();
        let max = query.max;

        let stream = async_stream::stream! {
            let mut yielded = 0usize;
            // Pages overlap when the surface reshuffles results between
            // requests; ids already yielded are not yielded again.
            let mut seen: HashSet<String> = HashSet::new();

            'pages: for url in page_urls {
                if monitor.is_tripped() || yielded >= max {
                    break;
                }
                let url = match url {
                    Ok(url) => url,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };
                let payload = match http::get_json(&http, &governor, &monitor, url.as_str()).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        // Transport retries are already exhausted; the
                        // sequence ends with whatever was produced so far.
                        yield Err(e);
                        break;
                    }
                };
                if monitor.is_tripped() {
                    break;
                }

                let candidates = payload::extract_candidates(&payload, &base_url);
                metrics::counter!("discovery_candidates_total").increment(candidates.len() as u64);
                if candidates.is_empty() {
                    break;
                }
                for candidate in candidates {
                    if yielded >= max {
                        break 'pages;
                    }
                    if !seen.insert(candidate.id.clone()) {
                        continue;
                    }
                    yielded += 1;
                    yield Ok(candidate);
                }
            }
            tracing::debug!(yielded, "guest search sequence finished");
        };
        stream.boxed()
    }
}
