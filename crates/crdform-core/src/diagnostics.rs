//! Terraform-style diagnostics
//!
//! Lifecycle operations never return `Err`: every failure is reported as a
//! diagnostic whose detail carries the underlying error verbatim.

use serde::Serialize;
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "Error"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute path the diagnostic refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    /// Attach the attribute path this diagnostic refers to
    pub fn at(mut self, attribute: impl ToString) -> Self {
        self.attribute = Some(attribute.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " (at {})", attribute)?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n\n{}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary, detail));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_error_tracking() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_error());

        diagnostics.add_warning("Deprecated version", "use v1");
        assert!(!diagnostics.has_error());

        diagnostics.add_error("Error from Kubernetes API", "connection refused");
        assert!(diagnostics.has_error());
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.errors().count(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic =
            Diagnostic::error("Missing required attribute", "").at("metadata.name");
        insta::assert_snapshot!(
            diagnostic.to_string(),
            @"Error: Missing required attribute (at metadata.name)"
        );
    }

    #[test]
    fn test_diagnostics_serialize() {
        let diagnostics: Diagnostics = Diagnostic::warning("Heads up", "details").into();
        let json = serde_json::to_value(&diagnostics).unwrap();

        assert_eq!(json[0]["severity"], "warning");
        assert_eq!(json[0]["summary"], "Heads up");
        assert!(json[0].get("attribute").is_none());
    }
}
