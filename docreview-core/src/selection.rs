//! Selection of issues by stable key.
//!
//! Membership is independent of the current filter and page: hiding an issue
//! does not deselect it, and it shows as selected again when the filter is
//! relaxed. Only an explicit [`SelectionSet::select_none`] or a document reset
//! clears it.

use std::collections::HashSet;

use crate::types::{IssueEntry, IssueKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: HashSet<IssueKey>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `key`. Returns the new state (`true` = selected).
    pub fn toggle(&mut self, key: &IssueKey) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.clone());
            true
        }
    }

    pub fn select(&mut self, key: IssueKey) {
        self.keys.insert(key);
    }

    pub fn deselect(&mut self, key: &IssueKey) {
        self.keys.remove(key);
    }

    /// Adds every issue in `visible`. Selections of issues hidden by the
    /// current filter are kept.
    pub fn select_all<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a IssueEntry>,
    {
        self.keys.extend(visible.into_iter().map(|e| e.key.clone()));
    }

    pub fn select_none(&mut self) {
        self.keys.clear();
    }

    pub fn is_selected(&self, key: &IssueKey) -> bool {
        self.keys.contains(key)
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of selected issues among `visible`.
    pub fn count_in<'a, I>(&self, visible: I) -> usize
    where
        I: IntoIterator<Item = &'a IssueEntry>,
    {
        visible.into_iter().filter(|e| self.keys.contains(&e.key)).count()
    }

    /// Drops keys that are not in `known`. Used when a new review run
    /// replaces the issue set.
    pub fn retain_known(&mut self, known: &HashSet<&IssueKey>) {
        self.keys.retain(|k| known.contains(k));
    }

    pub fn iter(&self) -> impl Iterator<Item = &IssueKey> {
        self.keys.iter()
    }
}
