//! TOML manifest of resources for the `apply` command.
//!
//! ```toml
//! [[line]]
//! path = "/etc/sudoers"
//! regexp = "^%wheel"
//! line = "%wheel ALL=(ALL) NOPASSWD: ALL"
//! insertafter = "^# %wheel"
//! backup = "yes"
//!
//! [[vhost]]
//! name = "/test"
//! tracing = "on"
//! ```
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::flag::Flag;
use super::toml_loader;
use crate::error::{ConfigError, ReconcileError};
use crate::exec::Executor;
use crate::resources::Ensure;
use crate::resources::line_in_file::{LineInFile, LineOptions};
use crate::resources::vhost::Vhost;

/// A parsed manifest.  Entries run in declaration order, lines first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// `[[line]]` entries.
    #[serde(default)]
    pub line: Vec<LineEntry>,
    /// `[[vhost]]` entries.
    #[serde(default)]
    pub vhost: Vec<VhostEntry>,
}

/// One `[[line]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineEntry {
    /// Target file.
    #[serde(alias = "dest")]
    pub path: PathBuf,
    /// Match pattern.
    pub regexp: String,
    /// Desired state.
    #[serde(default)]
    pub state: Ensure,
    /// Desired line.
    pub line: Option<String>,
    /// Insert-after pattern or sentinel.
    pub insertafter: Option<String>,
    /// Insert-before pattern or sentinel.
    pub insertbefore: Option<String>,
    /// Create the file when missing.
    #[serde(default)]
    pub create: Flag,
    /// Back up before writing.
    #[serde(default)]
    pub backup: Flag,
    /// Octal permission mode.
    pub mode: Option<String>,
}

impl LineEntry {
    /// Convert to resource options without validating.
    #[must_use]
    pub fn to_options(&self) -> LineOptions {
        LineOptions {
            path: self.path.clone(),
            regexp: self.regexp.clone(),
            state: self.state,
            line: self.line.clone(),
            insert_after: self.insertafter.clone(),
            insert_before: self.insertbefore.clone(),
            create: self.create.enabled(),
            backup: self.backup.enabled(),
            mode: self.mode.clone(),
        }
    }
}

/// One `[[vhost]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VhostEntry {
    /// Virtual host name.
    pub name: String,
    /// Desired state.
    #[serde(default)]
    pub state: Ensure,
    /// Desired tracing.
    #[serde(default)]
    pub tracing: Flag,
    /// Broker node.
    pub node: Option<String>,
}

impl Manifest {
    /// Load a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file is missing or unreadable and
    /// [`ConfigError::InvalidSyntax`] for bad TOML or unknown fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(path)
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.line.len() + self.vhost.len()
    }

    /// Whether the manifest declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every `[[line]]` entry into a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Entry`] for the first invalid entry.
    pub fn line_resources(&self) -> Result<Vec<LineInFile>, ConfigError> {
        self.line
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                LineInFile::from_options(entry.to_options()).map_err(|source| ConfigError::Entry {
                    kind: "line",
                    index,
                    source,
                })
            })
            .collect()
    }

    /// Validate every `[[vhost]]` entry into a resource bound to `executor`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Entry`] for the first entry with an empty name.
    pub fn vhost_resources<'a>(
        &self,
        executor: &'a dyn Executor,
    ) -> Result<Vec<Vhost<'a>>, ConfigError> {
        self.vhost
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                if entry.name.trim().is_empty() {
                    return Err(ConfigError::Entry {
                        kind: "vhost",
                        index,
                        source: ReconcileError::InvalidConfiguration(
                            "'name' must not be empty".to_string(),
                        ),
                    });
                }
                Ok(Vhost::new(
                    entry.name.clone(),
                    entry.state,
                    entry.tracing.enabled(),
                    entry.node.clone(),
                    executor,
                ))
            })
            .collect()
    }
}
