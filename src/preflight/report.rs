// ABOUTME: Validation issue accumulator for preflight checks.
// ABOUTME: Blocking issues prevent a start; advisory issues are reported only.

use std::fmt;

/// How much an issue matters to starting the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the container from starting.
    Blocking,
    /// Reported but never blocks.
    Advisory,
}

/// A single preflight finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub message: String,
    pub severity: Severity,
    pub fix_hint: Option<String>,
}

impl ValidationIssue {
    pub fn blocking(message: impl Into<String>, fix_hint: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Blocking,
            fix_hint: Some(fix_hint.into()),
        }
    }

    pub fn advisory(message: impl Into<String>, fix_hint: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Advisory,
            fix_hint: Some(fix_hint.into()),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.is_blocking() { "✗" } else { "⚠" };
        write!(f, "{} {}", symbol, self.message)?;
        if let Some(hint) = &self.fix_hint {
            write!(f, "\n  → {}", hint)?;
        }
        Ok(())
    }
}

/// Ordered issues from one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Record an issue, auto-logging it via tracing.
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Blocking => tracing::warn!("blocking: {}", issue.message),
            Severity::Advisory => tracing::info!("advisory: {}", issue.message),
        }
        self.issues.push(issue);
    }

    /// True iff no issue is blocking.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_blocking)
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn blocking_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_blocking()).count()
    }

    /// The `(overall_valid, issues)` pair.
    pub fn into_parts(self) -> (bool, Vec<ValidationIssue>) {
        (self.is_valid(), self.issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_starts_valid_and_empty() {
        let report = ValidationReport::default();
        assert!(report.is_valid());
        assert!(report.issues().is_empty());
    }

    #[test]
    fn advisory_issues_do_not_invalidate() {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::advisory("no audio", "start pulseaudio"));

        assert!(report.is_valid());
        assert_eq!(report.issues().len(), 1);
        assert_eq!(report.blocking_count(), 0);
    }

    #[test]
    fn blocking_issue_invalidates() {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::advisory("no audio", "start pulseaudio"));
        report.push(ValidationIssue::blocking("no runtime", "install podman"));

        let (valid, issues) = report.into_parts();
        assert!(!valid);
        assert_eq!(issues.len(), 2);
        assert!(issues[1].is_blocking());
    }

    #[test]
    fn display_includes_hint() {
        let issue = ValidationIssue::blocking("podman not found", "sudo dnf install podman");
        let text = issue.to_string();
        assert!(text.starts_with("✗ podman not found"));
        assert!(text.contains("→ sudo dnf install podman"));
    }
}
