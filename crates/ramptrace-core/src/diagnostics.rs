//! Data-quality diagnostics collected while cleaning input series.
//!
//! Cleaning never fails on a bad row: the row is dropped and an issue is
//! recorded here instead. Callers that care about completeness compare
//! [`CleaningStats::rows_read`] against [`CleaningStats::rows_kept`].
//!
//! # Example
//!
//! ```
//! use ramptrace_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_at_line("parse", "unparseable timestamp '31/02/2024'", 7);
//! diag.add_error("schema", "missing column 'MW'");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Row dropped or value coerced, processing continued
    Warning,
    /// The whole input could not be used
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "parse", "schema", "order")
    pub category: String,
    pub message: String,
    /// 1-based data line in the source table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Unit or series the issue belongs to (e.g. "S1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            entity: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }

        Ok(())
    }
}

/// Row counters for one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    /// Rows that arrived out of time order and were moved by the sort
    pub rows_reordered: usize,
}

/// Collection of issues plus row counters for one input series.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub stats: CleaningStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_at_line(&mut self, category: &str, message: &str, line: usize) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_line(line));
    }

    /// Record a dropped row; bumps [`CleaningStats::rows_dropped`].
    pub fn drop_row(&mut self, message: &str, line: usize) {
        self.add_warning_at_line("parse", message, line);
        self.stats.rows_dropped += 1;
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    /// Tag every issue that has no entity yet.
    pub fn tag_entity(&mut self, entity: &str) {
        for issue in self.issues.iter_mut().filter(|i| i.entity.is_none()) {
            issue.entity = Some(entity.to_string());
        }
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Merge issues and counters from another pass.
    pub fn merge(&mut self, other: Diagnostics) {
        self.stats.rows_read += other.stats.rows_read;
        self.stats.rows_kept += other.stats.rows_kept;
        self.stats.rows_dropped += other.stats.rows_dropped;
        self.stats.rows_reordered += other.stats.rows_reordered;
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();
        let issue_summary = match (warnings, errors) {
            (0, 0) => "no issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        };

        format!(
            "{} rows read, {} kept, {} dropped | {}",
            self.stats.rows_read, self.stats.rows_kept, self.stats.rows_dropped, issue_summary
        )
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cleaning: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("order", "rows out of order");
        diag.add_error("schema", "missing column");
        diag.drop_row("unparseable MW 'n/a'", 4);

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.stats.rows_dropped, 1);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_merge_keeps_unit_tags() {
        let mut s1 = Diagnostics::new();
        s1.stats.rows_read = 3;
        s1.stats.rows_kept = 3;
        let mut s2 = Diagnostics::new();
        s2.stats.rows_read = 3;
        s2.stats.rows_kept = 2;
        s2.drop_row("unparseable timestamp 'not a time'", 3);
        s2.tag_entity("S2");

        let mut run = Diagnostics::new();
        run.merge(s1);
        run.merge(s2);
        assert_eq!(run.stats.rows_read, 6);
        assert_eq!(run.stats.rows_kept, 5);
        assert_eq!(run.stats.rows_dropped, 1);
        assert_eq!(run.issues[0].entity.as_deref(), Some("S2"));
        assert_eq!(run.summary(), "6 rows read, 5 kept, 1 dropped | 1 warning");
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.drop_row("unparseable timestamp", 47);
        diag.tag_entity("S1");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(json.contains("\"line\": 47"));
        assert!(json.contains("\"entity\": \"S1\""));
        assert!(json.contains("\"rows_dropped\": 1"));
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Warning, "parse", "bad MW")
            .with_entity("S2")
            .with_line(12);

        let display = format!("{}", issue);
        assert!(display.contains("warning"));
        assert!(display.contains("parse"));
        assert!(display.contains("S2"));
        assert!(display.contains("line 12"));
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        diag.stats.rows_read = 10;
        diag.stats.rows_kept = 9;
        assert!(diag.summary().ends_with("no issues"));

        diag.drop_row("bad", 3);
        let summary = diag.summary();
        assert!(summary.starts_with("10 rows read, 9 kept, 1 dropped"));
        assert!(summary.ends_with("1 warning"));
    }

    #[test]
    fn test_diagnostics_merge() {
        let mut first = Diagnostics::new();
        first.stats.rows_read = 3;
        first.add_warning("parse", "w");

        let mut second = Diagnostics::new();
        second.stats.rows_read = 2;
        second.add_error("schema", "e");

        first.merge(second);
        assert_eq!(first.stats.rows_read, 5);
        assert_eq!(first.warning_count(), 1);
        assert_eq!(first.error_count(), 1);
        assert_eq!(first.issues_by_category("schema").count(), 1);
    }
}
