use std::cmp::Ordering;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordinal importance of an issue.
///
/// Ordering follows importance: `Critical > High > Medium > Low > Info`, so a
/// descending sort puts the most important issues first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "critical", alias = "CRITICAL")]
    Critical,
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "info", alias = "INFO")]
    Info,
}

impl Severity {
    /// All five severities, most important first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Numeric rank used for ordering; `Critical` is highest.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Info => "Info",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Parses a severity name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity '{s}'"))
    }
}

/// Server-assigned issue identifier. The analysis engine emits either strings
/// or integers depending on the checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueId {
    Number(i64),
    Text(String),
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueId::Number(n) => write!(f, "{n}"),
            IssueId::Text(s) => f.write_str(s),
        }
    }
}

/// Provenance of an issue: where in the document it was found and whether the
/// flagged text was validated against the original source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueSource {
    pub is_validated: bool,
    pub original_text: Option<String>,
    pub normalized_text: Option<String>,
    pub paragraph_index: Option<usize>,
    pub start_offset: Option<usize>,
    pub end_offset: Option<usize>,
}

/// One finding produced by the server-side analysis engine.
///
/// Issues are immutable once received. Selection and adjudication live in the
/// session state, keyed by [`IssueKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IssueId>,
    pub severity: Severity,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_text: Option<String>,
    /// Surrounding text; may embed inline highlight markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IssueSource>,
}

impl Issue {
    /// Returns `true` when the issue's source was validated. Issues without
    /// provenance count as unvalidated.
    pub fn is_validated(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_validated)
    }

    /// Hash of the fields that describe what was flagged and where.
    ///
    /// Used to derive a stable key for issues the server sent without an id.
    pub fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.severity.hash(&mut h);
        self.category.hash(&mut h);
        self.message.hash(&mut h);
        self.flagged_text.hash(&mut h);
        if let Some(src) = &self.source {
            src.paragraph_index.hash(&mut h);
            src.start_offset.hash(&mut h);
            src.end_offset.hash(&mut h);
        }
        h.finish()
    }
}

/// Stable identity of an issue within a session.
///
/// Assigned once at ingestion and never derived from a position in the
/// filtered list, so selection and adjudication survive re-filtering and
/// re-sorting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueKey {
    /// The server-provided id.
    Id(IssueId),
    /// Content fingerprint plus the occurrence index among issues that share it.
    Fingerprint { hash: u64, occurrence: u32 },
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKey::Id(id) => write!(f, "{id}"),
            IssueKey::Fingerprint { hash, occurrence } => write!(f, "#{hash:016x}.{occurrence}"),
        }
    }
}

/// An ingested issue together with its session key.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueEntry {
    pub key: IssueKey,
    pub issue: Issue,
}

/// A role extracted from the document by the server (e.g. "Program Manager").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,
    pub mentions: usize,
    pub category: Option<String>,
    pub responsibilities: Vec<String>,
}

/// A user decision on a detected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjudication {
    Confirm,
    Reject,
    Defer,
}

impl Adjudication {
    pub fn label(self) -> &'static str {
        match self {
            Adjudication::Confirm => "confirmed",
            Adjudication::Reject => "rejected",
            Adjudication::Defer => "deferred",
        }
    }
}

/// One entry in the session's review log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub at: i64, // Unix timestamp seconds
    pub action: String,
    pub detail: String,
}

/// The full payload of a completed analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewResult {
    pub issues: Vec<Issue>,
    pub roles: Vec<Role>,
    pub document_name: Option<String>,
    pub word_count: Option<u64>,
}
