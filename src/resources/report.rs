//! Change reporter: the structured result of one reconciliation.
use std::path::PathBuf;

use serde::Serialize;

/// Message appended when the attribute post-step changed something.
pub const ATTRIBUTES_CHANGED: &str = "ownership, perms or SE linux context changed";

/// Result of reconciling one resource.
///
/// # Examples
///
/// ```
/// use reconcile_cli::resources::Outcome;
///
/// let added = Outcome::new(true, "line added", 1);
/// assert!(added.changed);
/// assert_eq!(added.message, "line added");
/// assert_eq!(Outcome::unchanged().affected, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Whether anything changed (or would change, in a dry run).
    pub changed: bool,
    /// Human-readable summary; empty when nothing changed.
    pub message: String,
    /// Number of lines (or objects) touched.
    pub affected: usize,
    /// Lines found and removed; set only by absent-mode line edits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<usize>,
    /// Backup copy taken before writing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl Outcome {
    /// Create an outcome without a backup.
    #[must_use]
    pub fn new(changed: bool, message: impl Into<String>, affected: usize) -> Self {
        Self {
            changed,
            message: message.into(),
            affected,
            found: None,
            backup: None,
        }
    }

    /// Outcome of removing `found` matching lines.
    #[must_use]
    pub fn removed(found: usize, message: impl Into<String>) -> Self {
        Self {
            found: Some(found),
            ..Self::new(found > 0, message, found)
        }
    }

    /// A no-op outcome.
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Attach the backup path produced by the writer.
    #[must_use]
    pub fn with_backup(mut self, backup: Option<PathBuf>) -> Self {
        self.backup = backup;
        self
    }

    /// Fold in the attribute post-step result.
    ///
    /// `changed` becomes the logical OR of both steps and the attribute
    /// message is appended, joined with `" and "` when the line step also
    /// changed.
    #[must_use]
    pub fn merge_attributes(mut self, attributes_changed: bool) -> Self {
        if attributes_changed {
            if self.changed {
                self.message.push_str(" and ");
            }
            self.changed = true;
            self.message.push_str(ATTRIBUTES_CHANGED);
        }
        self
    }

    /// One-line rendering for console output.
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        match (self.changed, dry_run) {
            (false, _) => "ok".to_string(),
            (true, true) => format!("would change: {}", self.message),
            (true, false) => format!("changed: {}", self.message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn attributes_only_change_is_reported() {
        let outcome = Outcome::unchanged().merge_attributes(true);
        assert!(outcome.changed);
        assert_eq!(outcome.message, ATTRIBUTES_CHANGED);
    }

    #[test]
    fn both_changes_joined_with_and() {
        let outcome = Outcome::new(true, "line added", 1).merge_attributes(true);
        assert!(outcome.changed);
        assert_eq!(
            outcome.message,
            "line added and ownership, perms or SE linux context changed"
        );
        assert_eq!(outcome.affected, 1);
    }

    #[test]
    fn no_attribute_change_leaves_outcome() {
        let outcome = Outcome::new(true, "line replaced", 1);
        assert_eq!(outcome.clone().merge_attributes(false), outcome);
    }

    #[test]
    fn summary_wording() {
        assert_eq!(Outcome::unchanged().summary(false), "ok");
        assert_eq!(
            Outcome::new(true, "line added", 1).summary(true),
            "would change: line added"
        );
        assert_eq!(
            Outcome::new(true, "2 line(s) removed", 2).summary(false),
            "changed: 2 line(s) removed"
        );
    }

    #[test]
    fn serializes_without_backup_field_when_absent() {
        let json = serde_json::to_string(&Outcome::new(true, "line added", 1)).unwrap();
        insta::assert_snapshot!(json, @r#"{"changed":true,"message":"line added","affected":1}"#);
    }

    #[test]
    fn removal_serializes_found_count() {
        let json = serde_json::to_string(&Outcome::removed(2, "2 line(s) removed")).unwrap();
        insta::assert_snapshot!(json, @r#"{"changed":true,"message":"2 line(s) removed","affected":2,"found":2}"#);
        assert!(!Outcome::removed(0, "").changed);
    }
}
