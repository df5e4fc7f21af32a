//! Immutable index snapshots.
//!
//! A [`Snapshot`] pairs the document list with the inverted token index built
//! over it. The two are created together by a [`SnapshotBuilder`], published
//! together and persisted together; every position in the token index refers
//! to the document list of the same snapshot.
//!
//! ## Layout
//!
//! - `documents`: `Vec<IndexedDocument>`, a document's id is its position
//! - `tokens`: lowercase tokens, sorted and unique
//! - `postings`: parallel to `tokens`, each a sorted list of unique positions
//!
//! Keeping the token table sorted turns a prefix lookup into a binary search
//! followed by a short forward scan over the matching range.

use crate::error::{FolioError, Result};
use crate::types::{IndexStats, IndexedDocument};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One published generation of the search index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    documents: Vec<IndexedDocument>,
    tokens: Vec<String>,
    postings: Vec<Vec<u32>>,
    built_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// All documents, in position order.
    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Get a document by position.
    pub fn document(&self, position: u32) -> Option<&IndexedDocument> {
        self.documents.get(position as usize)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// Compute summary statistics.
    pub fn stats(&self) -> IndexStats {
        let folders = self.documents.iter().filter(|d| d.is_dir).count() as u64;
        let projects: HashSet<&str> = self.documents.iter().map(|d| d.project.as_str()).collect();
        IndexStats {
            documents: self.documents.len() as u64,
            folders,
            files: self.documents.len() as u64 - folders,
            tokens: self.tokens.len() as u64,
            projects: projects.len() as u64,
            built_at: self.built_at,
        }
    }

    /// Positions of every document holding a token that starts with `term`.
    ///
    /// `term` must already be lowercase (see [`crate::tokenize`]). The result
    /// is sorted and free of duplicates.
    pub fn prefix_positions(&self, term: &str) -> Vec<u32> {
        let start = self.tokens.partition_point(|t| t.as_str() < term);
        let end = start
            + self.tokens[start..]
                .iter()
                .take_while(|t| t.starts_with(term))
                .count();

        match end - start {
            0 => Vec::new(),
            1 => self.postings[start].clone(),
            _ => {
                let mut merged: Vec<u32> = self.postings[start..end]
                    .iter()
                    .flat_map(|p| p.iter().copied())
                    .collect();
                merged.sort_unstable();
                merged.dedup();
                merged
            }
        }
    }

    /// Positions of the documents matching every term (logical AND of
    /// per-term prefix matches). Sorted, no duplicates.
    pub fn match_positions(&self, terms: &[String]) -> Vec<u32> {
        if terms.is_empty() {
            return Vec::new();
        }

        let mut sets: Vec<Vec<u32>> = Vec::with_capacity(terms.len());
        for term in terms {
            let set = self.prefix_positions(term);
            if set.is_empty() {
                return Vec::new();
            }
            sets.push(set);
        }

        // Intersect starting from the smallest set.
        sets.sort_by_key(|s| s.len());
        let mut iter = sets.into_iter();
        let mut result = iter.next().unwrap_or_default();
        for other in iter {
            result.retain(|pos| other.binary_search(pos).is_ok());
            if result.is_empty() {
                break;
            }
        }
        result
    }

    /// Documents matching every term.
    pub fn matching_documents(&self, terms: &[String], limit: usize) -> Vec<IndexedDocument> {
        self.match_positions(terms)
            .into_iter()
            .filter_map(|pos| self.document(pos).cloned())
            .take(limit)
            .collect()
    }

    /// Check the structural invariants of a snapshot read from outside:
    /// tokens sorted and unique, one posting list per token, every position
    /// in range, each posting list sorted and unique.
    pub fn validate(&self) -> Result<()> {
        if self.tokens.len() != self.postings.len() {
            return Err(FolioError::corrupted(format!(
                "{} tokens but {} posting lists",
                self.tokens.len(),
                self.postings.len()
            )));
        }
        if self.tokens.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FolioError::corrupted("token table is not sorted"));
        }

        let len = self.documents.len();
        let bad = self.postings.par_iter().any(|list| {
            list.windows(2).any(|w| w[0] >= w[1])
                || list.last().map_or(false, |&last| last as usize >= len)
        });
        if bad {
            return Err(FolioError::corrupted(
                "posting list out of order or out of range",
            ));
        }
        Ok(())
    }
}

/// Accumulates documents and tokens during a rebuild.
///
/// The builder is private to the rebuild that owns it; nothing is visible to
/// readers until [`SnapshotBuilder::finish`] hands over a complete snapshot.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    documents: Vec<IndexedDocument>,
    postings: HashMap<String, Vec<u32>>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Append a document and record it under each of its tokens.
    ///
    /// Tokens must be lowercase; repeated tokens are recorded once.
    pub fn push<I>(&mut self, document: IndexedDocument, tokens: I) -> u32
    where
        I: IntoIterator<Item = String>,
    {
        let position = self.documents.len() as u32;
        self.documents.push(document);

        for token in tokens {
            let list = self.postings.entry(token).or_default();
            // Positions only grow, so a repeat always sits at the tail.
            if list.last() != Some(&position) {
                list.push(position);
            }
        }
        position
    }

    /// Freeze into an immutable snapshot.
    pub fn finish(self) -> Snapshot {
        let mut entries: Vec<(String, Vec<u32>)> = self.postings.into_iter().collect();
        entries.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let (tokens, postings): (Vec<String>, Vec<Vec<u32>>) = entries.into_iter().unzip();

        Snapshot {
            documents: self.documents,
            tokens,
            postings,
            built_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::{tokenize, tokens};

    fn doc(name: &str, is_dir: bool, project: &str) -> IndexedDocument {
        IndexedDocument {
            name: name.to_string(),
            path: format!("/{}/{}", project, name),
            is_dir,
            project: project.to_string(),
        }
    }

    fn build(names: &[&str]) -> Snapshot {
        let mut builder = SnapshotBuilder::new();
        for name in names {
            builder.push(doc(name, false, "P"), tokens(name));
        }
        builder.finish()
    }

    fn names(snapshot: &Snapshot, query: &str) -> Vec<String> {
        let mut found: Vec<String> = snapshot
            .matching_documents(&tokenize(query), usize::MAX)
            .into_iter()
            .map(|d| d.name)
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_and_of_prefixes() {
        let snapshot = build(&["invoice_pro_forma.pdf", "invoice_final.pdf"]);
        assert_eq!(names(&snapshot, "inv pro"), vec!["invoice_pro_forma.pdf"]);
        assert_eq!(names(&snapshot, "inv"), vec!["invoice_final.pdf", "invoice_pro_forma.pdf"]);
    }

    #[test]
    fn test_terms_are_order_independent() {
        let snapshot = build(&["site_plan_rev3.dwg"]);
        assert_eq!(names(&snapshot, "REV plan"), vec!["site_plan_rev3.dwg"]);
    }

    #[test]
    fn test_prefix_not_substring() {
        let snapshot = build(&["invoice.pdf"]);
        assert!(names(&snapshot, "voice").is_empty());
    }

    #[test]
    fn test_empty_query() {
        let snapshot = build(&["invoice.pdf"]);
        assert!(snapshot.match_positions(&[]).is_empty());
    }

    #[test]
    fn test_prefix_positions_union_is_sorted_unique() {
        let snapshot = build(&["ab ac", "ad", "ab"]);
        assert_eq!(snapshot.prefix_positions("a"), vec![0, 1, 2]);
        assert_eq!(snapshot.prefix_positions("ab"), vec![0, 2]);
        assert!(snapshot.prefix_positions("b").is_empty());
    }

    #[test]
    fn test_builder_dedups_repeated_tokens() {
        let mut builder = SnapshotBuilder::new();
        builder.push(doc("a a A", false, "P"), tokens("a a A"));
        let snapshot = builder.finish();
        assert_eq!(snapshot.prefix_positions("a"), vec![0]);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_stats() {
        let mut builder = SnapshotBuilder::new();
        builder.push(doc("Docs", true, "Alpha"), tokens("Docs"));
        builder.push(doc("readme.txt", false, "Alpha"), tokens("readme.txt"));
        builder.push(doc("plan.pdf", false, "Beta"), tokens("plan.pdf"));
        let stats = builder.finish().stats();

        assert_eq!(stats.documents, 3);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.projects, 2);
        assert!(stats.built_at.is_some());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut snapshot = build(&["alpha"]);
        snapshot.postings[0].push(7);
        assert!(matches!(
            snapshot.validate(),
            Err(FolioError::SnapshotCorrupted { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unsorted_tokens() {
        let mut snapshot = build(&["alpha beta"]);
        snapshot.tokens.reverse();
        assert!(snapshot.validate().is_err());
    }
}
