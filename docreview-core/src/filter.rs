//! Filter pipeline deriving the working issue set from the raw results.
//!
//! [`compute_filtered`] is pure: same issues and criteria in, same sequence
//! out, source order preserved. A chart filter, when set, is the only
//! criterion applied.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::settings::FilterSettings;
use crate::types::{Issue, IssueEntry, Severity};

/// Single-value override set by clicking a chart segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartFilter {
    Severity(Severity),
    Category(String),
}

impl fmt::Display for ChartFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartFilter::Severity(s) => write!(f, "severity={s}"),
            ChartFilter::Category(c) => write!(f, "category={c}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationFilter {
    Validated,
    Unvalidated,
}

/// Caller-supplied extra predicate, applied last.
pub type IssuePredicate = Arc<dyn Fn(&Issue) -> bool + Send + Sync>;

/// Snapshot of all active filter criteria.
#[derive(Clone)]
pub struct FilterCriteria {
    pub severities: BTreeSet<Severity>,
    /// Empty means no category restriction.
    pub categories: BTreeSet<String>,
    pub search_text: String,
    pub chart_filter: Option<ChartFilter>,
    pub validation_filter: Option<ValidationFilter>,
    pub custom_predicate: Option<IssuePredicate>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            severities: Severity::ALL.into_iter().collect(),
            categories: BTreeSet::new(),
            search_text: String::new(),
            chart_filter: None,
            validation_filter: None,
            custom_predicate: None,
        }
    }
}

impl fmt::Debug for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCriteria")
            .field("severities", &self.severities)
            .field("categories", &self.categories)
            .field("search_text", &self.search_text)
            .field("chart_filter", &self.chart_filter)
            .field("validation_filter", &self.validation_filter)
            .field("custom_predicate", &self.custom_predicate.is_some())
            .finish()
    }
}

impl FilterCriteria {
    /// Restores the persisted subset of the criteria. Search text, chart
    /// filter and custom predicate are session-only.
    pub fn from_settings(settings: &FilterSettings) -> Self {
        Self {
            severities: settings.severities.iter().copied().collect(),
            categories: settings.categories.iter().cloned().collect(),
            validation_filter: settings.validation_filter,
            ..Self::default()
        }
    }

    pub fn to_settings(&self) -> FilterSettings {
        FilterSettings {
            severities: self.severities.iter().rev().copied().collect(),
            categories: self.categories.iter().cloned().collect(),
            validation_filter: self.validation_filter,
        }
    }

    /// Returns `true` when `issue` passes every active criterion.
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(chart) = &self.chart_filter {
            return match chart {
                ChartFilter::Severity(sev) => issue.severity == *sev,
                ChartFilter::Category(cat) => issue.category == *cat,
            };
        }

        if !self.severities.contains(&issue.severity) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&issue.category) {
            return false;
        }
        if !matches_search(issue, &self.search_text) {
            return false;
        }
        match self.validation_filter {
            Some(ValidationFilter::Validated) if !issue.is_validated() => return false,
            Some(ValidationFilter::Unvalidated) if issue.is_validated() => return false,
            _ => {}
        }
        self.custom_predicate.as_ref().is_none_or(|pred| pred(issue))
    }

    /// `true` when nothing would be filtered out.
    pub fn is_unrestricted(&self) -> bool {
        self.chart_filter.is_none()
            && self.severities.len() == Severity::ALL.len()
            && self.categories.is_empty()
            && self.search_text.trim().is_empty()
            && self.validation_filter.is_none()
            && self.custom_predicate.is_none()
    }
}

/// Case-insensitive substring match against message, category and flagged text.
fn matches_search(issue: &Issue, search_text: &str) -> bool {
    let needle = search_text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    issue.message.to_lowercase().contains(&needle)
        || issue.category.to_lowercase().contains(&needle)
        || issue
            .flagged_text
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
}

/// Filters `issues` by `criteria`, preserving source order.
pub fn compute_filtered<'a, I>(issues: I, criteria: &FilterCriteria) -> Vec<&'a IssueEntry>
where
    I: IntoIterator<Item = &'a IssueEntry>,
{
    issues.into_iter().filter(|e| criteria.matches(&e.issue)).collect()
}

/// Positions in `issues` that pass `criteria`, in source order.
pub fn filtered_positions(issues: &[IssueEntry], criteria: &FilterCriteria) -> Vec<usize> {
    issues
        .iter()
        .enumerate()
        .filter(|(_, e)| criteria.matches(&e.issue))
        .map(|(i, _)| i)
        .collect()
}
