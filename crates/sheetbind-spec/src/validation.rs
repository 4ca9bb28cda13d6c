use std::fmt;

/// One granular problem found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SpecIssue {
    /// Dotted path into the document (e.g. `records[0].fields[2].binding`).
    pub path: String,
    pub message: String,
}

impl SpecIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SpecIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregated validation failure. Issues are collected, never short-circuited,
/// so a caller sees every problem in one pass.
#[derive(Debug, Clone)]
pub struct ValidationError {
    issues: Vec<SpecIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<SpecIssue>) -> Self {
        debug_assert!(!issues.is_empty(), "validation error without issues");
        Self { issues }
    }

    pub fn issues(&self) -> &[SpecIssue] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document validation failed:")?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
