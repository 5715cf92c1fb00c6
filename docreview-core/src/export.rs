//! Serialisation of issue lists for export.

use serde::Serialize;

use crate::types::{Adjudication, IssueEntry};

/// Flat export row. Adjudication is included when the user decided on the issue.
#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    pub key: String,
    pub severity: &'a str,
    pub category: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
}

impl<'a> ExportRow<'a> {
    pub fn new(entry: &'a IssueEntry, decision: Option<Adjudication>) -> Self {
        let issue = &entry.issue;
        Self {
            key: entry.key.to_string(),
            severity: issue.severity.label(),
            category: &issue.category,
            message: &issue.message,
            flagged_text: issue.flagged_text.as_deref(),
            suggestion: issue.suggestion.as_deref(),
            paragraph_index: issue.source.as_ref().and_then(|s| s.paragraph_index),
            decision: decision.map(Adjudication::label),
        }
    }
}

/// Pretty-printed JSON array of rows.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialisation fails.
pub fn to_json(rows: &[ExportRow<'_>]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

const CSV_HEADER: &str = "key,severity,category,message,flagged_text,suggestion,paragraph,decision";

/// CSV with a header row. Fields containing commas, quotes or newlines are quoted.
pub fn to_csv(rows: &[ExportRow<'_>]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let paragraph = row.paragraph_index.map(|p| p.to_string()).unwrap_or_default();
        let fields = [
            row.key.as_str(),
            row.severity,
            row.category,
            row.message,
            row.flagged_text.unwrap_or(""),
            row.suggestion.unwrap_or(""),
            paragraph.as_str(),
            row.decision.unwrap_or(""),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Issue, IssueId, IssueKey, Severity};

    #[test]
    fn csv_quotes_special_fields() {
        let entry = IssueEntry {
            key: IssueKey::Id(IssueId::Text("x1".into())),
            issue: Issue {
                id: Some(IssueId::Text("x1".into())),
                severity: Severity::High,
                category: "Style".into(),
                message: "Use \"shall\", not \"will\"".into(),
                flagged_text: Some("will".into()),
                context: None,
                suggestion: None,
                source: None,
            },
        };
        let rows = [ExportRow::new(&entry, Some(Adjudication::Confirm))];
        let csv = to_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some(r#"x1,High,Style,"Use ""shall"", not ""will""",will,,,confirmed"#)
        );
    }

    #[test]
    fn json_omits_empty_optionals() {
        let entry = IssueEntry {
            key: IssueKey::Id(IssueId::Number(3)),
            issue: Issue {
                id: Some(IssueId::Number(3)),
                severity: Severity::Info,
                category: "Acronyms".into(),
                message: "Undefined acronym".into(),
                flagged_text: None,
                context: None,
                suggestion: None,
                source: None,
            },
        };
        let json = to_json(&[ExportRow::new(&entry, None)]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["key"], "3");
        assert!(v[0].get("decision").is_none());
    }
}
