use std::collections::HashSet;

use super::manifest::{LineEntry, Manifest, VhostEntry};
use crate::resources::Ensure;

/// A validation warning detected while loading a manifest.
///
/// Warnings never stop a run; hard errors come from resource construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The manifest table (`line` or `vhost`).
    pub source: String,
    /// The specific entry that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a new warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for manifest validators.
pub trait ConfigValidator {
    /// Validate the entries and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator (e.g., "line").
    fn name(&self) -> &'static str;
}

/// Validator for `[[line]]` entries.
#[derive(Debug)]
pub struct LineValidator<'a> {
    entries: &'a [LineEntry],
}

impl<'a> LineValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(entries: &'a [LineEntry]) -> Self {
        Self { entries }
    }
}

impl ConfigValidator for LineValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for entry in self.entries {
            let item = format!("{} /{}/", entry.path.display(), entry.regexp);

            if !seen.insert((entry.path.clone(), entry.regexp.clone())) {
                warnings.push(ValidationWarning::new(
                    self.name(),
                    &item,
                    "duplicate entry for the same path and regexp",
                ));
            }

            if entry.state == Ensure::Absent {
                let ignored: Vec<&str> = [
                    ("line", entry.line.is_some()),
                    ("insertafter", entry.insertafter.is_some()),
                    ("insertbefore", entry.insertbefore.is_some()),
                    ("create", entry.create.enabled()),
                ]
                .into_iter()
                .filter_map(|(field, set)| set.then_some(field))
                .collect();
                if !ignored.is_empty() {
                    warnings.push(ValidationWarning::new(
                        self.name(),
                        &item,
                        format!("ignored when state is absent: {}", ignored.join(", ")),
                    ));
                }
            }

            if entry.path.is_relative() {
                warnings.push(ValidationWarning::new(
                    self.name(),
                    &item,
                    "path is relative to the working directory",
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "line"
    }
}

/// Validator for `[[vhost]]` entries.
#[derive(Debug)]
pub struct VhostValidator<'a> {
    entries: &'a [VhostEntry],
}

impl<'a> VhostValidator<'a> {
    /// Create a validator over the given entries.
    #[must_use]
    pub const fn new(entries: &'a [VhostEntry]) -> Self {
        Self { entries }
    }
}

impl ConfigValidator for VhostValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for entry in self.entries {
            let node = entry.node.as_deref().unwrap_or_default();
            if !seen.insert((entry.name.as_str(), node)) {
                warnings.push(ValidationWarning::new(
                    self.name(),
                    &entry.name,
                    "duplicate vhost entry",
                ));
            }

            if entry.state == Ensure::Absent && entry.tracing.enabled() {
                warnings.push(ValidationWarning::new(
                    self.name(),
                    &entry.name,
                    "tracing is ignored when state is absent",
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "vhost"
    }
}

/// Validate the whole manifest and return collected warnings.
#[must_use]
pub fn validate_all(manifest: &Manifest) -> Vec<ValidationWarning> {
    let validators: Vec<Box<dyn ConfigValidator + '_>> = vec![
        Box::new(LineValidator::new(&manifest.line)),
        Box::new(VhostValidator::new(&manifest.vhost)),
    ];

    validators.iter().flat_map(|v| v.validate()).collect()
}
