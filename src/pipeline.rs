// src/pipeline.rs
// Ingestion Orchestrator: one value per run, driving the phases in order —
// discovery, classification, per-company ATS retrieval, aggregation — and
// owning the run's state and result. Block detection never interrupts
// control flow; every phase polls `is_blocked` at its checkpoints and winds
// down, keeping whatever was already produced.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::StreamExt;

use crate::ats::ClientRegistry;
use crate::block::BlockMonitor;
use crate::dedup::DedupIndex;
use crate::detect;
use crate::discovery::{self, DiscoverySource, SearchQuery};
use crate::model::{BlockReason, Origin, PipelineResult, Posting, ProviderInfo, RunState};

/// Run-scoped handle over the orchestrator's mutable state. The mutex is
/// never held across an await; it exists so the Block Monitor's callback and
/// a parallelized fetch phase stay safe without changing this contract.
#[derive(Clone, Default)]
pub struct RunStateHandle(Arc<Mutex<RunState>>);

impl RunStateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Forward-only transition: the first call sets `block_reason` with the
    /// flip; later calls are no-ops.
    pub fn mark_blocked(&self, reason: BlockReason) {
        let mut state = self.lock();
        if state.is_blocked {
            return;
        }
        state.is_blocked = true;
        state.block_reason = Some(reason);
        state.errors.push(format!("blocked: {reason}"));
    }

    pub fn is_blocked(&self) -> bool {
        self.lock().is_blocked
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.lock().errors.push(message.into());
    }

    fn incr_collected(&self) {
        self.lock().postings_collected += 1;
    }

    fn set_requests(&self, requests: u64) {
        self.lock().requests_made = requests;
    }

    pub fn snapshot(&self) -> RunState {
        self.lock().clone()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// When false, ATS retrieval is skipped entirely and discovery data is
    /// final for every company.
    pub fetch_ats: bool,
    pub max_per_company: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fetch_ats: true,
            max_per_company: 50,
        }
    }
}

pub struct IngestionPipeline {
    discovery: Arc<dyn DiscoverySource>,
    clients: ClientRegistry,
    monitor: Arc<BlockMonitor>,
    state: RunStateHandle,
    opts: PipelineOptions,
}

impl IngestionPipeline {
    /// Wire up a run. The monitor's on-block callback is pointed at this
    /// run's state; the monitor itself never holds the state.
    pub fn new(
        discovery: Arc<dyn DiscoverySource>,
        clients: ClientRegistry,
        monitor: Arc<BlockMonitor>,
        opts: PipelineOptions,
    ) -> Self {
        let state = RunStateHandle::new();
        let handle = state.clone();
        monitor.set_block_callback(move |reason| handle.mark_blocked(reason));
        Self {
            discovery,
            clients,
            monitor,
            state,
            opts,
        }
    }

    pub fn state(&self) -> RunStateHandle {
        self.state.clone()
    }

    /// Run the whole pipeline once. Consumes the orchestrator: state is
    /// run-scoped and a fresh run wants a fresh value.
    pub async fn run(self, query: SearchQuery) -> PipelineResult {
        crate::metrics::ensure_metrics_described();

        let candidates = self.discover(query).await;
        tracing::info!(count = candidates.len(), "discovery finished");

        let mut index = DedupIndex::new();
        let (groups, native) = self.partition(&mut index, candidates);
        tracing::info!(
            ats_companies = groups.len(),
            native_companies = native.len(),
            "classification finished"
        );

        let provider_companies = self.fetch_ats_companies(&mut index, groups).await;

        self.finalize(index, provider_companies, native)
    }

    /// DISCOVERING: consume the lazy candidate sequence, bounded by
    /// `query.max`. The block poll sits before each item so a candidate
    /// arriving after the flip is dropped with the rest of the sequence.
    async fn discover(&self, query: SearchQuery) -> Vec<Posting> {
        let max = query.max;
        if max == 0 {
            return Vec::new();
        }
        let method = self.discovery.extraction_method();
        let mut stream = self.discovery.search(query);
        let mut candidates = Vec::new();

        while let Some(item) = stream.next().await {
            if self.state.is_blocked() {
                break;
            }
            match item {
                Ok(raw) => {
                    candidates.push(discovery::into_posting(raw, method));
                    metrics::counter!("pipeline_discovered_total").increment(1);
                    if candidates.len() >= max {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = ?e, source = self.discovery.name(), "discovery error");
                    self.state.push_error(format!("discovery: {e:#}"));
                }
            }
        }
        candidates
    }

    /// CLASSIFYING: native-origin candidates go straight into the result;
    /// ATS-origin candidates are grouped per company in discovery order.
    /// Origin was computed at discovery time and is only read here.
    fn partition(
        &self,
        index: &mut DedupIndex,
        candidates: Vec<Posting>,
    ) -> (Vec<(String, Vec<Posting>)>, BTreeSet<String>) {
        let mut groups: Vec<(String, Vec<Posting>)> = Vec::new();
        let mut group_slot: HashMap<String, usize> = HashMap::new();
        let mut native: BTreeSet<String> = BTreeSet::new();

        for posting in candidates {
            let key = posting.company_key();
            if posting.origin == Origin::Ats && posting.apply_url.is_some() {
                match group_slot.get(&key) {
                    Some(&slot) => groups[slot].1.push(posting),
                    None => {
                        group_slot.insert(key.clone(), groups.len());
                        groups.push((key, vec![posting]));
                    }
                }
            } else {
                native.insert(key);
                self.add(index, posting);
            }
        }
        (groups, native)
    }

    /// FETCHING_ATS: companies strictly one at a time, in discovery order.
    /// Failures are isolated per company; a blocked run stops issuing
    /// requests but still retains every group's discovery candidates.
    async fn fetch_ats_companies(
        &self,
        index: &mut DedupIndex,
        groups: Vec<(String, Vec<Posting>)>,
    ) -> BTreeMap<String, ProviderInfo> {
        let mut provider_companies = BTreeMap::new();
        let mut processed: HashSet<String> = HashSet::new();

        for (key, group) in groups {
            if processed.contains(&key) {
                continue;
            }
            if !self.opts.fetch_ats || self.state.is_blocked() {
                self.keep_discovery_postings(index, group);
                continue;
            }
            self.fetch_company(index, &mut provider_companies, &mut processed, key, group)
                .await;
        }
        provider_companies
    }

    async fn fetch_company(
        &self,
        index: &mut DedupIndex,
        provider_companies: &mut BTreeMap<String, ProviderInfo>,
        processed: &mut HashSet<String>,
        key: String,
        group: Vec<Posting>,
    ) {
        let representative = &group[0];
        let company_name = representative.company_name.clone();

        // Provider resolution failures are informational skips, not errors:
        // the discovery data simply stays authoritative for the company.
        let (Some(apply_url), Some(provider)) =
            (representative.apply_url.clone(), representative.provider)
        else {
            tracing::info!(company = %company_name, "no provider resolved, keeping discovery postings");
            self.keep_discovery_postings(index, group);
            return;
        };
        let Some(client) = self.clients.client_for(provider) else {
            tracing::info!(company = %company_name, provider = %provider, "no fetch client, keeping discovery postings");
            self.keep_discovery_postings(index, group);
            return;
        };
        let Some(slug) = client.extract_slug(&apply_url) else {
            tracing::info!(company = %company_name, provider = %provider, url = %apply_url, "no slug in apply url, keeping discovery postings");
            self.keep_discovery_postings(index, group);
            return;
        };
        let base_url = detect::career_page_base_url(&apply_url).unwrap_or_default();

        tracing::info!(company = %company_name, provider = %provider, slug = %slug, "fetching ats postings");
        let started = std::time::Instant::now();
        match client
            .fetch(&slug, &company_name, Some(&apply_url), self.opts.max_per_company)
            .await
        {
            Ok(fetched) if !fetched.is_empty() => {
                metrics::histogram!("ats_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);
                let posting_count = fetched.len() as u64;

                // Identity reconciliation: a fetched posting whose key was
                // already seen at discovery collapses to that first-seen
                // candidate instance. Discovery-only candidates of this
                // company are superseded by the authoritative ATS corpus.
                let discovered: HashMap<String, &Posting> = group
                    .iter()
                    .map(|p| (DedupIndex::key(&p.company_name, &p.id), p))
                    .collect();
                for posting in fetched {
                    let k = DedupIndex::key(&posting.company_name, &posting.id);
                    let record = discovered.get(&k).map(|d| (*d).clone()).unwrap_or(posting);
                    self.add(index, record);
                }

                // First success wins; the company is not touched again.
                provider_companies.insert(
                    key.clone(),
                    ProviderInfo {
                        company_name,
                        provider,
                        base_url,
                        posting_count,
                        fetched_at: Utc::now(),
                    },
                );
                processed.insert(key);
            }
            Ok(_) => {
                self.state
                    .push_error(format!("ats fetch returned no postings ({company_name})"));
                metrics::counter!("pipeline_fetch_failures_total").increment(1);
                self.keep_discovery_postings(index, group);
            }
            Err(e) => {
                tracing::warn!(error = ?e, company = %company_name, "ats fetch failed, keeping discovery postings");
                self.state.push_error(format!("ats error ({company_name}): {e:#}"));
                metrics::counter!("pipeline_fetch_failures_total").increment(1);
                self.keep_discovery_postings(index, group);
            }
        }
    }

    /// Fallback shared by every non-success path: the company's
    /// discovery-time candidates become its final postings.
    fn keep_discovery_postings(&self, index: &mut DedupIndex, group: Vec<Posting>) {
        for posting in group {
            self.add(index, posting);
        }
    }

    fn add(&self, index: &mut DedupIndex, posting: Posting) -> bool {
        if index.add(posting) {
            self.state.incr_collected();
            true
        } else {
            metrics::counter!("pipeline_dedup_total").increment(1);
            false
        }
    }

    /// AGGREGATING: assemble the terminal snapshot. Distribution stats are
    /// the caller's job (see the report module), not this one's.
    fn finalize(
        &self,
        index: DedupIndex,
        provider_companies: BTreeMap<String, ProviderInfo>,
        native: BTreeSet<String>,
    ) -> PipelineResult {
        self.state.set_requests(self.monitor.requests_observed());
        let run_state = self.state.snapshot();
        let errors = run_state.errors.clone();

        tracing::info!(
            postings = index.len(),
            ats_companies = provider_companies.len(),
            blocked = run_state.is_blocked,
            errors = errors.len(),
            "pipeline finished"
        );

        PipelineResult {
            postings: index.into_postings(),
            provider_companies,
            native_companies: native.into_iter().collect(),
            run_state,
            errors,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_blocked_flips_once() {
        let handle = RunStateHandle::new();
        handle.mark_blocked(BlockReason::Authwall);
        handle.mark_blocked(BlockReason::RateLimited);

        let state = handle.snapshot();
        assert!(state.is_blocked);
        assert_eq!(state.block_reason, Some(BlockReason::Authwall));
        assert_eq!(state.errors, vec!["blocked: authwall".to_string()]);
    }
}
