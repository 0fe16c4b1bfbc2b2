//! Line-in-file resource: keep one line present in the right place, or
//! remove every line matching a pattern.
use std::path::PathBuf;

use anyhow::Result;
use regex::bytes::Regex;

use super::attributes::{AttributeStep, FileMode, KeepAttributes};
use super::document::{Document, LINE_SEPARATOR, Loaded};
use super::helpers::fs::ensure_parent_dir;
use super::{Ensure, Outcome, Reconcile};
use crate::error::ReconcileError;

/// Anchor value meaning "beginning of file".
pub const BOF: &str = "BOF";
/// Anchor value meaning "end of file".
pub const EOF: &str = "EOF";

/// Where to insert the line when the match pattern has no hit.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// After the last line matching the pattern.
    After(Regex),
    /// Before the last line matching the pattern.
    Before(Regex),
    /// At index 0.
    StartOfFile,
    /// Appended at the end.
    EndOfFile,
}

impl Anchor {
    /// Build an anchor from the optional `insertafter` / `insertbefore`
    /// values.  `BOF` and `EOF` are sentinels in either position; neither
    /// value means [`Anchor::EndOfFile`].
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidConfiguration`] if both values are
    /// given or a pattern does not compile.
    pub fn from_options(
        insert_after: Option<&str>,
        insert_before: Option<&str>,
    ) -> Result<Self, ReconcileError> {
        match (insert_after, insert_before) {
            (Some(after), Some(before)) => Err(ReconcileError::InvalidConfiguration(format!(
                "insertafter '{after}' and insertbefore '{before}' are mutually exclusive"
            ))),
            (Some(BOF), None) | (None, Some(BOF)) => Ok(Self::StartOfFile),
            (Some(EOF), None) | (None, Some(EOF)) | (None, None) => Ok(Self::EndOfFile),
            (Some(after), None) => Ok(Self::After(compile("insertafter", after)?)),
            (None, Some(before)) => Ok(Self::Before(compile("insertbefore", before)?)),
        }
    }
}

/// Decision of the ensure-present resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// The last matching line already equals the desired line.
    Unchanged,
    /// Overwrite the line at `index`.
    Replaced {
        /// Index of the last matching line.
        index: usize,
    },
    /// Insert a new line before position `index`.
    Inserted {
        /// Insertion position (`len` appends).
        index: usize,
    },
}

impl Edit {
    /// Whether this edit changes the document.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Message reported for this edit.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unchanged => "",
            Self::Replaced { .. } => "line replaced",
            Self::Inserted { .. } => "line added",
        }
    }

    /// Apply this edit to `doc`, writing `line`.
    pub fn apply(self, doc: &mut Document, line: &str) {
        match self {
            Self::Unchanged => {}
            Self::Replaced { index } => doc.replace(index, line.as_bytes()),
            Self::Inserted { index } => doc.insert(index, line.as_bytes()),
        }
    }
}

/// Decide how to make `line` present in `doc`.
///
/// A single scan records the *last* line matching `regexp` and, for lines
/// that do not match it, the position derived from the *last* line matching
/// a pattern anchor.  A match wins over any anchor; an anchor pattern that
/// never matches falls back to appending.
#[must_use]
pub fn resolve_present(doc: &Document, regexp: &Regex, line: &str, anchor: &Anchor) -> Edit {
    let mut match_index = None;
    let mut anchor_index = None;

    for (i, current) in doc.lines().enumerate() {
        if regexp.is_match(current) {
            match_index = Some(i);
        } else {
            match anchor {
                Anchor::After(re) if re.is_match(current) => anchor_index = Some(i + 1),
                Anchor::Before(re) if re.is_match(current) => anchor_index = Some(i),
                _ => {}
            }
        }
    }

    if let Some(index) = match_index {
        let stored = doc
            .raw_lines()
            .get(index)
            .and_then(|l| l.strip_suffix(LINE_SEPARATOR.as_bytes()));
        return if stored == Some(line.as_bytes()) {
            Edit::Unchanged
        } else {
            Edit::Replaced { index }
        };
    }

    match (anchor, anchor_index) {
        (Anchor::StartOfFile, _) => Edit::Inserted { index: 0 },
        (Anchor::EndOfFile, _) | (_, None) => Edit::Inserted { index: doc.len() },
        (_, Some(index)) => Edit::Inserted { index },
    }
}

/// Remove every line of `doc` matching `regexp`, returning the count.
pub fn resolve_absent(doc: &mut Document, regexp: &Regex) -> usize {
    doc.remove_matching(|l| regexp.is_match(l))
}

/// Raw, unvalidated options for a [`LineInFile`] resource.
#[derive(Debug, Clone, Default)]
pub struct LineOptions {
    /// Target file.
    pub path: PathBuf,
    /// Match pattern.
    pub regexp: String,
    /// Desired state.
    pub state: Ensure,
    /// Desired line (required when present).
    pub line: Option<String>,
    /// Insert-after pattern, or `BOF`/`EOF`.
    pub insert_after: Option<String>,
    /// Insert-before pattern, or `BOF`/`EOF`.
    pub insert_before: Option<String>,
    /// Create the file (and parents) when missing.
    pub create: bool,
    /// Take a timestamped backup before writing.
    pub backup: bool,
    /// Octal permission mode for the attribute post-step.
    pub mode: Option<String>,
}

/// Validated desired state of the managed line.
#[derive(Debug, Clone)]
pub enum LineState {
    /// Keep `line` present, placed by `anchor` when inserted.
    Present {
        /// Desired line text, without terminator.
        line: String,
        /// Placement when no line matches.
        anchor: Anchor,
    },
    /// Remove every matching line.
    Absent,
}

/// A line-in-file resource.
pub struct LineInFile {
    /// Target file.
    pub path: PathBuf,
    /// Pattern locating the managed line(s).
    pub regexp: Regex,
    /// Desired state.
    pub state: LineState,
    /// Create the file when missing (present mode).
    pub create: bool,
    /// Back up the file before writing.
    pub backup: bool,
    attributes: Box<dyn AttributeStep + Send + Sync>,
}

impl std::fmt::Debug for LineInFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineInFile")
            .field("path", &self.path)
            .field("regexp", &self.regexp.as_str())
            .field("state", &self.state)
            .field("create", &self.create)
            .field("backup", &self.backup)
            .field("attributes", &self.attributes.describe())
            .finish()
    }
}

impl LineInFile {
    /// Validate `opts` into a resource.  No file I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidConfiguration`] if a pattern does not
    /// compile, `line` is missing in present mode or does not match
    /// `regexp`, both anchors are set, or `mode` is not octal.
    pub fn from_options(opts: LineOptions) -> Result<Self, ReconcileError> {
        let regexp = compile("regexp", &opts.regexp)?;

        let state = match opts.state {
            Ensure::Absent => LineState::Absent,
            Ensure::Present => {
                let line = opts.line.ok_or_else(|| {
                    ReconcileError::InvalidConfiguration(
                        "'line' is required when state is present".to_string(),
                    )
                })?;
                if !regexp.is_match(line.as_bytes()) {
                    return Err(ReconcileError::InvalidConfiguration(format!(
                        "line '{line}' does not match regexp '{}'",
                        regexp.as_str()
                    )));
                }
                let anchor = Anchor::from_options(
                    opts.insert_after.as_deref(),
                    opts.insert_before.as_deref(),
                )?;
                LineState::Present { line, anchor }
            }
        };

        let attributes: Box<dyn AttributeStep + Send + Sync> = match opts.mode.as_deref() {
            Some(mode) => Box::new(FileMode::parse(mode)?),
            None => Box::new(KeepAttributes),
        };

        Ok(Self {
            path: opts.path,
            regexp,
            state,
            create: opts.create,
            backup: opts.backup,
            attributes,
        })
    }

    /// Replace the attribute post-step.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Box<dyn AttributeStep + Send + Sync>) -> Self {
        self.attributes = attributes;
        self
    }

    fn present(&self, line: &str, anchor: &Anchor, dry_run: bool) -> Result<Outcome> {
        let mut doc = match Document::load(&self.path)? {
            Loaded::Found(doc) => doc,
            Loaded::NotFound if self.create => {
                if !dry_run {
                    ensure_parent_dir(&self.path)?;
                }
                Document::default()
            }
            Loaded::NotFound => {
                return Err(ReconcileError::TargetMissing {
                    path: self.path.clone(),
                }
                .into());
            }
        };

        let edit = resolve_present(&doc, &self.regexp, line, anchor);
        tracing::debug!("{}: {edit:?}", self.path.display());

        let mut outcome = Outcome::new(edit.is_change(), edit.message(), usize::from(edit.is_change()));
        if edit.is_change() {
            edit.apply(&mut doc, line);
            if !dry_run {
                outcome = outcome.with_backup(doc.write(&self.path, self.backup)?);
            }
        }

        self.finish(outcome, dry_run)
    }

    fn absent(&self, dry_run: bool) -> Result<Outcome> {
        let mut doc = match Document::load(&self.path)? {
            Loaded::Found(doc) => doc,
            Loaded::NotFound => return Ok(Outcome::removed(0, "file not present")),
        };

        let found = resolve_absent(&mut doc, &self.regexp);
        let message = if found > 0 {
            format!("{found} line(s) removed")
        } else {
            String::new()
        };
        let mut outcome = Outcome::removed(found, message);
        if found > 0 && !dry_run {
            outcome = outcome.with_backup(doc.write(&self.path, self.backup)?);
        }

        self.finish(outcome, dry_run)
    }

    fn finish(&self, outcome: Outcome, dry_run: bool) -> Result<Outcome> {
        let attributes_changed = self.attributes.apply(&self.path, dry_run)?;
        Ok(outcome.merge_attributes(attributes_changed))
    }
}

impl Reconcile for LineInFile {
    fn description(&self) -> String {
        match &self.state {
            LineState::Present { line, .. } => format!("{}: present '{line}'", self.path.display()),
            LineState::Absent => format!("{}: absent /{}/", self.path.display(), self.regexp.as_str()),
        }
    }

    fn reconcile(&self, dry_run: bool) -> Result<Outcome> {
        match &self.state {
            LineState::Present { line, anchor } => self.present(line, anchor, dry_run),
            LineState::Absent => self.absent(dry_run),
        }
    }
}

fn compile(field: &str, pattern: &str) -> Result<Regex, ReconcileError> {
    Regex::new(pattern).map_err(|e| {
        ReconcileError::InvalidConfiguration(format!("{field} '{pattern}' is not a valid pattern: {e}"))
    })
}
