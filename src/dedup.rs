// src/dedup.rs
// Identity index over the canonical posting key. First-seen wins: whichever
// call path adds a key first keeps its record; later adds are no-ops. The
// ordering privileges whoever saw the item first, not any particular source
// type, and must stay that way.

use std::collections::HashSet;

use crate::model::Posting;

#[derive(Default)]
pub struct DedupIndex {
    seen: HashSet<String>,
    postings: Vec<Posting>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical composite key: `company_name.lower():id`.
    pub fn key(company_name: &str, id: &str) -> String {
        format!("{}:{}", company_name.to_lowercase(), id)
    }

    /// Insert a posting. Returns true if it was newly added, false if the
    /// key was already present (the posting is discarded).
    pub fn add(&mut self, posting: Posting) -> bool {
        let key = Self::key(&posting.company_name, &posting.id);
        if !self.seen.insert(key) {
            return false;
        }
        self.postings.push(posting);
        true
    }

    pub fn contains(&self, company_name: &str, id: &str) -> bool {
        self.seen.contains(&Self::key(company_name, id))
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Surviving records in insertion order.
    pub fn into_postings(self) -> Vec<Posting> {
        self.postings
    }
}
