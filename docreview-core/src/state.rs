//! Session state for the currently loaded document.
//!
//! [`SessionState`] owns the issues, the derived filtered view, the selection
//! and all other per-document bookkeeping. It is constructed once at startup
//! and handed to collaborators by reference; there is no global instance.
//!
//! [`SessionState::reset_for_new_document`] is the single place where the
//! per-document invariants are re-established. Callers must not clear pieces
//! of the state by hand.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::export::{self, ExportRow};
use crate::filter::{self, ChartFilter, FilterCriteria, ValidationFilter};
use crate::selection::SelectionSet;
use crate::types::{
    Adjudication, Issue, IssueEntry, IssueKey, ReviewLogEntry, ReviewResult, Role, Severity,
};

/// A running visualisation attached to the session (e.g. a force-layout
/// simulation over the role graph). Stopped and dropped on document reset.
pub trait Visualization: Send {
    fn stop(&mut self);
}

/// Features the server advertised. Survives document resets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerCapabilities {
    pub async_jobs: bool,
    pub role_extraction: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Source order as received from the server.
    #[default]
    Position,
    Severity,
    Category,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub descending: bool,
}

impl SortState {
    /// Position → Severity (most important first) → Category → Position.
    pub fn cycled(self) -> Self {
        match self.key {
            SortKey::Position => SortState { key: SortKey::Severity, descending: true },
            SortKey::Severity => SortState { key: SortKey::Category, descending: false },
            SortKey::Category => SortState::default(),
        }
    }
}

/// Transient UI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFlags {
    pub loading: bool,
    pub job_active: bool,
}

/// Issues that flag the same text under the same category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFamily {
    pub category: String,
    pub flagged_text: String,
    pub members: Vec<IssueKey>,
}

pub struct SessionState {
    session_id: String,
    document_name: Option<String>,
    word_count: Option<u64>,
    issues: Vec<IssueEntry>,
    /// Positions into `issues`, in source order.
    filtered: Vec<usize>,
    criteria: FilterCriteria,
    selection: SelectionSet,
    roles: Vec<Role>,
    current_page: usize,
    page_size: usize,
    sort: SortState,
    adjudications: HashMap<IssueKey, Adjudication>,
    review_log: Vec<ReviewLogEntry>,
    families: Vec<IssueFamily>,
    pub flags: UiFlags,
    capabilities: ServerCapabilities,
    visualization: Option<Box<dyn Visualization>>,
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Assigns a stable key to each issue.
///
/// Server ids are used as-is. Issues without an id, or repeating an id already
/// seen in this batch, get a content fingerprint plus an occurrence counter,
/// so identical findings stay distinct and the same finding in a later run
/// gets the same key.
pub fn assign_keys(issues: Vec<Issue>) -> Vec<IssueEntry> {
    let mut seen_ids = HashSet::new();
    let mut occurrences: HashMap<u64, u32> = HashMap::new();
    issues
        .into_iter()
        .map(|issue| {
            let key = match &issue.id {
                Some(id) if seen_ids.insert(id.clone()) => IssueKey::Id(id.clone()),
                _ => {
                    let hash = issue.fingerprint();
                    let slot = occurrences.entry(hash).or_insert(0);
                    let occurrence = *slot;
                    *slot += 1;
                    IssueKey::Fingerprint { hash, occurrence }
                }
            };
            IssueEntry { key, issue }
        })
        .collect()
}

impl SessionState {
    /// Creates an empty session using persisted filter criteria and page size.
    pub fn new(capabilities: ServerCapabilities, criteria: FilterCriteria, page_size: usize) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            document_name: None,
            word_count: None,
            issues: Vec::new(),
            filtered: Vec::new(),
            criteria,
            selection: SelectionSet::new(),
            roles: Vec::new(),
            current_page: 0,
            page_size: page_size.max(1),
            sort: SortState::default(),
            adjudications: HashMap::new(),
            review_log: Vec::new(),
            families: Vec::new(),
            flags: UiFlags::default(),
            capabilities,
            visualization: None,
        }
    }

    // -----------------------------------------------------------------------
    // Document lifecycle
    // -----------------------------------------------------------------------

    /// Clears every document-scoped field before a new document is loaded.
    ///
    /// Keeps the user's persisted filter preferences (severities, categories,
    /// validation filter), page size and server capabilities. Drops issues,
    /// selection, roles, page, sort, chart filter, search text, adjudications,
    /// review log and families, and stops any attached visualisation.
    pub fn reset_for_new_document(&mut self, document_name: Option<String>) {
        if let Some(mut vis) = self.visualization.take() {
            vis.stop();
        }
        self.session_id = uuid::Uuid::new_v4().to_string();
        self.document_name = document_name;
        self.word_count = None;
        self.issues.clear();
        self.filtered.clear();
        self.criteria.chart_filter = None;
        self.criteria.search_text.clear();
        self.selection.select_none();
        self.roles.clear();
        self.current_page = 0;
        self.sort = SortState::default();
        self.adjudications.clear();
        self.review_log.clear();
        self.families.clear();
        self.flags = UiFlags::default();
        tracing::debug!(session_id = %self.session_id, "session reset for new document");
    }

    /// Ingests a completed analysis.
    pub fn ingest_result(&mut self, result: ReviewResult) {
        if result.document_name.is_some() {
            self.document_name = result.document_name;
        }
        self.word_count = result.word_count;
        self.roles = result.roles;
        self.ingest_issues(result.issues);
    }

    /// Replaces the issue set with the results of a (new) review run.
    ///
    /// Selection is kept for issues whose key is still present.
    pub fn ingest_issues(&mut self, issues: Vec<Issue>) {
        self.issues = assign_keys(issues);
        let known: HashSet<&IssueKey> = self.issues.iter().map(|e| &e.key).collect();
        self.selection.retain_known(&known);
        self.families = group_families(&self.issues);
        self.flags.loading = false;
        self.recompute();
        self.log("ingest", format!("{} issues", self.issues.len()));
        tracing::info!(
            issues = self.issues.len(),
            visible = self.filtered.len(),
            families = self.families.len(),
            "issues ingested"
        );
    }

    /// Attaches a visualisation, stopping any previous one.
    pub fn attach_visualization(&mut self, vis: Box<dyn Visualization>) {
        if let Some(mut old) = self.visualization.replace(vis) {
            old.stop();
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    pub fn word_count(&self) -> Option<u64> {
        self.word_count
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    pub fn set_capabilities(&mut self, capabilities: ServerCapabilities) {
        self.capabilities = capabilities;
    }

    pub fn issues(&self) -> &[IssueEntry] {
        &self.issues
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn set_roles(&mut self, roles: Vec<Role>) {
        self.roles = roles;
    }

    pub fn families(&self) -> &[IssueFamily] {
        &self.families
    }

    pub fn review_log(&self) -> &[ReviewLogEntry] {
        &self.review_log
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Replaces the criteria and recomputes the filtered view.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.recompute();
    }

    /// Mutates the criteria in place and recomputes the filtered view.
    pub fn update_criteria(&mut self, f: impl FnOnce(&mut FilterCriteria)) {
        f(&mut self.criteria);
        self.recompute();
    }

    pub fn toggle_severity(&mut self, severity: Severity) {
        self.update_criteria(|c| {
            if !c.severities.remove(&severity) {
                c.severities.insert(severity);
            }
        });
    }

    pub fn toggle_category(&mut self, category: &str) {
        self.update_criteria(|c| {
            if !c.categories.remove(category) {
                c.categories.insert(category.to_owned());
            }
        });
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update_criteria(|c| c.search_text = text);
    }

    pub fn set_chart_filter(&mut self, chart: Option<ChartFilter>) {
        self.update_criteria(|c| c.chart_filter = chart);
    }

    pub fn set_validation_filter(&mut self, filter: Option<ValidationFilter>) {
        self.update_criteria(|c| c.validation_filter = filter);
    }

    /// Filtered issues in source order.
    pub fn filtered_issues(&self) -> impl Iterator<Item = &IssueEntry> + '_ {
        self.filtered.iter().map(move |&i| &self.issues[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    fn recompute(&mut self) {
        self.filtered = filter::filtered_positions(&self.issues, &self.criteria);
        self.current_page = 0;
    }

    // -----------------------------------------------------------------------
    // Sort and pagination
    // -----------------------------------------------------------------------

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.current_page = 0;
    }

    /// Filtered issues with the sort step applied. Ties keep source order.
    pub fn display_order(&self) -> Vec<&IssueEntry> {
        let mut items: Vec<&IssueEntry> = self.filtered_issues().collect();
        let descending = self.sort.descending;
        let directed = |ord: Ordering| if descending { ord.reverse() } else { ord };
        match self.sort.key {
            SortKey::Position => {}
            SortKey::Severity => {
                items.sort_by(|a, b| directed(a.issue.severity.cmp(&b.issue.severity)));
            }
            SortKey::Category => {
                items.sort_by(|a, b| directed(a.issue.category.cmp(&b.issue.category)));
            }
        }
        items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.current_page = 0;
    }

    /// Number of pages; an empty view still has one (empty) page.
    pub fn page_count(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Moves to `page`, clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.min(self.page_count() - 1);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    /// The slice of [`display_order`](Self::display_order) on the current page.
    pub fn current_page_items(&self) -> Vec<&IssueEntry> {
        self.display_order()
            .into_iter()
            .skip(self.current_page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle_selected(&mut self, key: &IssueKey) -> bool {
        self.selection.toggle(key)
    }

    /// Selects every issue in the current filtered view.
    pub fn select_all_filtered(&mut self) {
        let visible = self.filtered.iter().map(|&i| &self.issues[i]);
        self.selection.select_all(visible);
    }

    pub fn select_none(&mut self) {
        self.selection.select_none();
    }

    pub fn is_selected(&self, key: &IssueKey) -> bool {
        self.selection.is_selected(key)
    }

    pub fn selection_count(&self) -> usize {
        self.selection.count()
    }

    /// Selected issues in source order, regardless of the current filter.
    pub fn selected_issues(&self) -> impl Iterator<Item = &IssueEntry> + '_ {
        self.issues.iter().filter(move |e| self.selection.is_selected(&e.key))
    }

    // -----------------------------------------------------------------------
    // Adjudication
    // -----------------------------------------------------------------------

    /// Records a decision for `key` and appends it to the review log.
    pub fn adjudicate(&mut self, key: &IssueKey, decision: Adjudication) {
        self.adjudications.insert(key.clone(), decision);
        self.log(decision.label(), key.to_string());
    }

    pub fn clear_adjudication(&mut self, key: &IssueKey) {
        if self.adjudications.remove(key).is_some() {
            self.log("cleared", key.to_string());
        }
    }

    pub fn adjudication(&self, key: &IssueKey) -> Option<Adjudication> {
        self.adjudications.get(key).copied()
    }

    fn log(&mut self, action: &str, detail: String) {
        self.review_log.push(ReviewLogEntry {
            at: now_secs(),
            action: action.to_owned(),
            detail,
        });
    }

    // -----------------------------------------------------------------------
    // Aggregates and export
    // -----------------------------------------------------------------------

    /// Issue counts per severity over all issues, for chart collaborators.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.issues {
            *counts.entry(e.issue.severity).or_insert(0) += 1;
        }
        counts
    }

    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.issues {
            *counts.entry(e.issue.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Rows to export: the selection if any, otherwise the filtered view.
    fn export_rows(&self) -> Vec<ExportRow<'_>> {
        let entries: Vec<&IssueEntry> = if self.selection.is_empty() {
            self.filtered_issues().collect()
        } else {
            self.selected_issues().collect()
        };
        entries
            .into_iter()
            .map(|e| ExportRow::new(e, self.adjudication(&e.key)))
            .collect()
    }

    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialisation fails.
    pub fn export_selected_json(&self) -> Result<String, serde_json::Error> {
        export::to_json(&self.export_rows())
    }

    pub fn export_selected_csv(&self) -> String {
        export::to_csv(&self.export_rows())
    }
}

fn group_families(issues: &[IssueEntry]) -> Vec<IssueFamily> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), IssueFamily> = HashMap::new();
    for e in issues {
        let Some(text) = e.issue.flagged_text.as_deref() else { continue };
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        let group_key = (e.issue.category.clone(), normalized);
        let family = groups.entry(group_key.clone()).or_insert_with(|| {
            order.push(group_key);
            IssueFamily {
                category: e.issue.category.clone(),
                flagged_text: text.trim().to_owned(),
                members: Vec::new(),
            }
        });
        family.members.push(e.key.clone());
    }
    order
        .into_iter()
        .filter_map(|k| groups.remove(&k))
        .filter(|f| f.members.len() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use std::sync::Arc;

    use crate::types::{IssueId, IssueSource};

    fn issue(id: Option<i64>, severity: Severity, category: &str, message: &str) -> Issue {
        Issue {
            id: id.map(IssueId::Number),
            severity,
            category: category.into(),
            message: message.into(),
            flagged_text: None,
            context: None,
            suggestion: None,
            source: None,
        }
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue(Some(1), Severity::Critical, "Grammar", "a"),
            issue(Some(2), Severity::Low, "Style", "b"),
            issue(Some(3), Severity::High, "Grammar", "c"),
            issue(Some(4), Severity::Info, "Acronyms", "d"),
        ]
    }

    fn session() -> SessionState {
        SessionState::new(ServerCapabilities::default(), FilterCriteria::default(), 50)
    }

    struct FlagVis(Arc<AtomicBool>);

    impl Visualization for FlagVis {
        fn stop(&mut self) {
            self.0.store(true, AtomicOrdering::SeqCst);
        }
    }

    #[test]
    fn duplicate_and_missing_ids_get_fingerprint_keys() {
        let entries = assign_keys(vec![
            issue(Some(1), Severity::Low, "X", "m"),
            issue(Some(1), Severity::Low, "X", "m"),
            issue(None, Severity::Low, "X", "m"),
        ]);
        assert_eq!(entries[0].key, IssueKey::Id(IssueId::Number(1)));
        let IssueKey::Fingerprint { hash: h1, occurrence: o1 } = entries[1].key else {
            panic!("expected fingerprint key");
        };
        let IssueKey::Fingerprint { hash: h2, occurrence: o2 } = entries[2].key else {
            panic!("expected fingerprint key");
        };
        assert_eq!(h1, h2);
        assert_eq!((o1, o2), (0, 1));
    }

    #[test]
    fn selection_survives_refiltering() {
        let mut s = session();
        s.ingest_issues(sample());
        let low = s.issues()[1].key.clone();
        s.toggle_selected(&low);

        s.toggle_severity(Severity::Low);
        assert_eq!(s.filtered_len(), 3);
        assert!(s.is_selected(&low));

        s.toggle_severity(Severity::Low);
        assert!(s.filtered_issues().any(|e| e.key == low));
        assert!(s.is_selected(&low));
    }

    #[test]
    fn select_all_covers_only_visible() {
        let mut s = session();
        s.ingest_issues(sample());
        s.set_chart_filter(Some(ChartFilter::Category("Grammar".into())));
        s.select_all_filtered();
        assert_eq!(s.selection_count(), 2);
        s.select_none();
        assert_eq!(s.selection_count(), 0);
    }

    #[test]
    fn new_run_keeps_selection_for_surviving_issues() {
        let mut s = session();
        s.ingest_issues(sample());
        let keys: Vec<IssueKey> = s.issues().iter().map(|e| e.key.clone()).collect();
        s.toggle_selected(&keys[0]);
        s.toggle_selected(&keys[3]);

        s.ingest_issues(sample().into_iter().take(2).collect());
        assert!(s.is_selected(&keys[0]));
        assert!(!s.is_selected(&keys[3]));
        assert_eq!(s.selection_count(), 1);
    }

    #[test]
    fn reset_clears_document_state_but_keeps_preferences() {
        let stopped = Arc::new(AtomicBool::new(false));
        let mut criteria = FilterCriteria::default();
        criteria.severities.remove(&Severity::Info);
        criteria.validation_filter = Some(ValidationFilter::Validated);
        let caps = ServerCapabilities { async_jobs: true, role_extraction: true };
        let mut s = SessionState::new(caps.clone(), criteria, 2);

        s.ingest_issues(sample());
        let first = s.issues()[0].key.clone();
        s.toggle_selected(&first);
        s.adjudicate(&first, Adjudication::Confirm);
        s.set_search_text("gram");
        s.set_chart_filter(Some(ChartFilter::Severity(Severity::High)));
        s.set_sort(SortState { key: SortKey::Severity, descending: true });
        s.attach_visualization(Box::new(FlagVis(stopped.clone())));
        let old_session = s.session_id().to_owned();

        s.reset_for_new_document(Some("next.docx".into()));

        assert!(stopped.load(AtomicOrdering::SeqCst));
        assert_ne!(s.session_id(), old_session);
        assert_eq!(s.document_name(), Some("next.docx"));
        assert!(s.issues().is_empty());
        assert_eq!(s.filtered_len(), 0);
        assert_eq!(s.selection_count(), 0);
        assert_eq!(s.adjudication(&first), None);
        assert!(s.review_log().is_empty());
        assert_eq!(s.current_page(), 0);
        assert_eq!(s.sort(), SortState::default());
        assert!(s.criteria().chart_filter.is_none());
        assert!(s.criteria().search_text.is_empty());
        assert!(!s.criteria().severities.contains(&Severity::Info));
        assert_eq!(s.criteria().validation_filter, Some(ValidationFilter::Validated));
        assert_eq!(s.capabilities(), &caps);
        assert_eq!(s.page_size(), 2);
    }

    #[test]
    fn pagination_clamps_and_resets_on_criteria_change() {
        let mut s = SessionState::new(ServerCapabilities::default(), FilterCriteria::default(), 3);
        s.ingest_issues(sample());
        assert_eq!(s.page_count(), 2);
        s.next_page();
        assert_eq!(s.current_page_items().len(), 1);
        s.next_page();
        assert_eq!(s.current_page(), 1);

        s.set_search_text("a");
        assert_eq!(s.current_page(), 0);

        s.set_search_text("no such text");
        assert_eq!(s.page_count(), 1);
        assert!(s.current_page_items().is_empty());
    }

    #[test]
    fn severity_sort_is_stable_and_directional() {
        let mut s = session();
        let mut issues = sample();
        issues.push(issue(Some(5), Severity::Critical, "Style", "e"));
        s.ingest_issues(issues);
        s.set_sort(SortState { key: SortKey::Severity, descending: true });
        let ids: Vec<String> = s.display_order().iter().map(|e| e.key.to_string()).collect();
        assert_eq!(ids, ["1", "5", "3", "2", "4"]);

        s.set_sort(SortState { key: SortKey::Severity, descending: false });
        let ids: Vec<String> = s.display_order().iter().map(|e| e.key.to_string()).collect();
        assert_eq!(ids, ["4", "2", "3", "1", "5"]);
    }

    #[test]
    fn sort_cycle_returns_to_position() {
        let start = SortState::default();
        let cycled = start.cycled().cycled().cycled();
        assert_eq!(cycled, start);
    }

    #[test]
    fn adjudication_is_logged() {
        let mut s = session();
        s.ingest_issues(sample());
        let key = s.issues()[2].key.clone();
        s.adjudicate(&key, Adjudication::Reject);
        s.clear_adjudication(&key);
        s.clear_adjudication(&key);
        let actions: Vec<&str> = s.review_log().iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, ["ingest", "rejected", "cleared"]);
    }

    #[test]
    fn families_group_same_flagged_text_within_category() {
        let mut a = issue(Some(1), Severity::Low, "Passive", "x");
        a.flagged_text = Some("was done".into());
        let mut b = issue(Some(2), Severity::Low, "Passive", "y");
        b.flagged_text = Some(" Was Done ".into());
        let mut c = issue(Some(3), Severity::Low, "Style", "z");
        c.flagged_text = Some("was done".into());

        let mut s = session();
        s.ingest_issues(vec![a, b, c]);
        let families = s.families();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].category, "Passive");
        assert_eq!(families[0].members.len(), 2);
    }

    #[test]
    fn export_prefers_selection_over_filtered_view() {
        let mut s = session();
        s.ingest_issues(sample());
        assert_eq!(s.export_selected_csv().lines().count(), 5);

        let key = s.issues()[3].key.clone();
        s.toggle_selected(&key);
        s.toggle_severity(Severity::Info);
        let csv = s.export_selected_csv();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("4,Info,Acronyms"));
    }

    #[test]
    fn ingest_result_fills_document_metadata() {
        let mut s = session();
        let mut validated = issue(Some(9), Severity::Medium, "Grammar", "v");
        validated.source = Some(IssueSource { is_validated: true, ..IssueSource::default() });
        s.ingest_result(ReviewResult {
            issues: vec![validated],
            roles: vec![Role { name: "Reviewer".into(), ..Role::default() }],
            document_name: Some("proposal.docx".into()),
            word_count: Some(1200),
        });
        assert_eq!(s.document_name(), Some("proposal.docx"));
        assert_eq!(s.word_count(), Some(1200));
        assert_eq!(s.roles().len(), 1);
        assert_eq!(s.severity_counts().get(&Severity::Medium), Some(&1));
        assert_eq!(s.category_counts().get("Grammar"), Some(&1));
    }
}
