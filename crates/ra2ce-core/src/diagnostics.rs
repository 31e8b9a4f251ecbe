//! Diagnostics collected while loading inputs and running analyses.
//!
//! Numeric edge cases (an edge with no detour, an edge without a usable speed,
//! a link id missing from the intensities table) never abort an analysis. They
//! are recorded here instead so a run can be audited afterwards.
//!
//! # Example
//!
//! ```
//! use ra2ce_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("routing", "no alternative route", "edge 3-4");
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.summary(), "1 warning");
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the operation continued (NaN cell, defaulted value)
    Warning,
    /// Element could not be processed (malformed row)
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping ("routing", "weighing", "input", ...)
    pub category: String,
    pub message: String,
    /// Line number for file-based operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Entity reference such as "edge 3-4" or "link 12"
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

    fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    fn for_entity(mut self, entity: &str) -> Self {
        self.entity = Some(entity.to_string());
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

/// Collection of diagnostic issues for one operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).for_entity(entity));
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.count(Severity::Error);

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Row counters for a table or network import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub rows: usize,
    pub skipped_rows: usize,
    pub defaulted_values: usize,
}

/// Import statistics together with the issues raised while reading.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportDiagnostics {
    pub stats: ImportStats,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a row that could not be read (increments `skipped_rows`).
    pub fn skip_row(&mut self, category: &str, message: &str, line: usize) {
        self.diagnostics
            .issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).at_line(line));
        self.stats.skipped_rows += 1;
    }

    /// Records a defaulted value (increments `defaulted_values`).
    pub fn default_value(&mut self, category: &str, message: &str, line: usize) {
        self.diagnostics
            .issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).at_line(line));
        self.stats.defaulted_values += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows ({} skipped, {} defaulted) | {}",
            self.stats.rows,
            self.stats.skipped_rows,
            self.stats.defaulted_values,
            self.diagnostics.summary()
        )
    }
}
