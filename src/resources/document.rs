//! File loader/writer: a file's content as an ordered sequence of lines.
//!
//! Lines are raw bytes; no encoding is assumed, so files in any
//! ASCII-compatible encoding round-trip unchanged.
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::ReconcileError;

/// Platform line separator appended to inserted and re-terminated lines.
pub const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

const MAX_LINK_HOPS: usize = 40;

/// Full content of a target file.
///
/// Each stored line keeps the terminator it was read with, so a final line
/// without a trailing newline is distinguishable from one with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Vec<u8>>,
}

/// Outcome of [`Document::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    /// The file exists and was read.
    Found(Document),
    /// Nothing exists at the path.
    NotFound,
}

impl Document {
    /// Split `content` into lines, keeping each line's terminator.
    #[must_use]
    pub fn parse(content: &[u8]) -> Self {
        Self {
            lines: content
                .split_inclusive(|b| *b == b'\n')
                .map(<[u8]>::to_vec)
                .collect(),
        }
    }

    /// Build a document from unterminated lines, terminating each one.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            lines: lines.into_iter().map(|l| terminate(l.as_ref())).collect(),
        }
    }

    /// Read `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::TargetIsDirectory`] if `path` is a directory,
    /// or [`ReconcileError::Io`] if it exists but cannot be read.
    pub fn load(path: &Path) -> Result<Loaded, ReconcileError> {
        if path.is_dir() {
            return Err(ReconcileError::TargetIsDirectory {
                path: path.to_path_buf(),
            });
        }
        match std::fs::read(path) {
            Ok(content) => Ok(Loaded::Found(Self::parse(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Loaded::NotFound),
            Err(e) => Err(ReconcileError::io(path, e)),
        }
    }

    /// Lines as stored, terminators included.
    #[must_use]
    pub fn raw_lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    /// Lines with their terminators stripped.
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(|l| strip_terminator(l))
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Replace the line at `index` with `text` plus the line separator.
    ///
    /// Out-of-range indices are ignored.
    pub fn replace(&mut self, index: usize, text: &[u8]) {
        if let Some(slot) = self.lines.get_mut(index) {
            *slot = terminate(text);
        }
    }

    /// Insert `text` plus the line separator before position `index`
    /// (clamped to the end).
    ///
    /// When inserting after an unterminated final line, that line is
    /// terminated first so the two never run together.
    pub fn insert(&mut self, index: usize, text: &[u8]) {
        let index = index.min(self.lines.len());
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.lines.get_mut(i))
            && !prev.ends_with(b"\n")
        {
            prev.extend_from_slice(LINE_SEPARATOR.as_bytes());
        }
        self.lines.insert(index, terminate(text));
    }

    /// Drop every line for which `remove` returns `true`, returning how many
    /// were dropped.  `remove` sees the line without its terminator.
    pub fn remove_matching(&mut self, mut remove: impl FnMut(&[u8]) -> bool) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| !remove(strip_terminator(l)));
        before - self.lines.len()
    }

    /// Render the document, terminating any unterminated line.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.lines.iter().fold(Vec::new(), |mut out, line| {
            out.extend_from_slice(line);
            if !line.ends_with(b"\n") {
                out.extend_from_slice(LINE_SEPARATOR.as_bytes());
            }
            out
        })
    }

    /// Replace the full content of `path` with this document.
    ///
    /// A symlink at `path` is followed and the file it points to is
    /// rewritten; the link itself stays in place.  When `backup` is set and
    /// the file exists, the current content is first copied to a
    /// timestamped sibling of `path` and the backup path is returned.  The
    /// new content goes to a temporary file next to the real target which
    /// is then renamed over it, carrying over the old file's permissions
    /// and (where allowed) ownership.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Io`] if resolving the target, the backup,
    /// the temporary file, copying attributes or the rename fails.
    pub fn write(&self, path: &Path, backup: bool) -> Result<Option<PathBuf>, ReconcileError> {
        let target = resolve_target(path)?;

        let backup_path = if backup && target.is_file() {
            let dest = backup_path(path);
            std::fs::copy(&target, &dest).map_err(|e| ReconcileError::io(&dest, e))?;
            tracing::debug!("backed up {} to {}", target.display(), dest.display());
            Some(dest)
        } else {
            None
        };

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| ReconcileError::io(parent, e))?;
        temp.write_all(&self.to_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| ReconcileError::io(temp.path(), e))?;
        preserve_attributes(&target, temp.as_file())?;
        temp.persist(&target)
            .map_err(|e| ReconcileError::io(&target, e.error))?;

        Ok(backup_path)
    }
}

/// Timestamped backup location for `path`: `<path>.<YYYY-MM-DD@HH:MM:SS>~`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d@%H:%M:%S~");
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{stamp}"));
    PathBuf::from(name)
}

/// The file a write to `path` must replace: the canonical path when it
/// exists, the end of the link chain for a dangling symlink, else `path`.
fn resolve_target(path: &Path) -> Result<PathBuf, ReconcileError> {
    match dunce::canonicalize(path) {
        Ok(real) => return Ok(real),
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(ReconcileError::io(path, e));
        }
        Err(_) => {}
    }

    let mut current = path.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        let Ok(next) = std::fs::read_link(&current) else {
            return Ok(current);
        };
        current = match current.parent() {
            Some(dir) => dir.join(next),
            None => next,
        };
    }
    Err(ReconcileError::io(
        path,
        std::io::Error::other("too many levels of symbolic links"),
    ))
}

/// Copy the existing file's permission bits and ownership onto the
/// replacement so the rename does not reset them to the temp file's.
///
/// Ownership is best effort: an unprivileged caller cannot give a file
/// away, and that refusal is not an error.
fn preserve_attributes(target: &Path, replacement: &std::fs::File) -> Result<(), ReconcileError> {
    let meta = match std::fs::metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ReconcileError::io(target, e)),
    };
    replacement
        .set_permissions(meta.permissions())
        .map_err(|e| ReconcileError::io(target, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt as _;

        if let Err(e) = std::os::unix::fs::fchown(replacement, Some(meta.uid()), Some(meta.gid()))
            && e.kind() != std::io::ErrorKind::PermissionDenied
        {
            return Err(ReconcileError::io(target, e));
        }
    }
    Ok(())
}

fn terminate(text: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(text.len() + LINE_SEPARATOR.len());
    line.extend_from_slice(text);
    line.extend_from_slice(LINE_SEPARATOR.as_bytes());
    line
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn lines(doc: &Document) -> Vec<String> {
        doc.lines().map(|l| String::from_utf8_lossy(l).into_owned()).collect()
    }

    fn raw(doc: &Document) -> Vec<String> {
        doc.raw_lines()
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }

    #[test]
    fn parse_keeps_terminators() {
        let doc = Document::parse(b"a\nb\nc");
        assert_eq!(raw(&doc), ["a\n", "b\n", "c"]);
        assert_eq!(lines(&doc), ["a", "b", "c"]);
    }

    #[test]
    fn parse_empty_is_empty() {
        assert!(Document::parse(b"").is_empty());
    }

    #[test]
    fn strip_handles_crlf() {
        let doc = Document::parse(b"a\r\nb\r\n");
        assert_eq!(lines(&doc), ["a", "b"]);
    }

    #[cfg(not(windows))]
    #[test]
    fn to_bytes_terminates_final_line() {
        assert_eq!(Document::parse(b"a\nb").to_bytes(), b"a\nb\n");
    }

    #[cfg(not(windows))]
    #[test]
    fn insert_after_unterminated_line_terminates_it() {
        let mut doc = Document::parse(b"a");
        doc.insert(1, b"b");
        assert_eq!(raw(&doc), ["a\n", "b\n"]);
    }

    #[test]
    fn insert_clamps_index() {
        let mut doc = Document::from_lines(["a"]);
        doc.insert(99, b"z");
        assert_eq!(lines(&doc).last().map(String::as_str), Some("z"));
    }

    #[test]
    fn remove_matching_counts() {
        let mut doc = Document::from_lines(["x=1", "y=2", "x=3"]);
        let removed = doc.remove_matching(|l| l.starts_with(b"x="));
        assert_eq!(removed, 2);
        assert_eq!(lines(&doc), ["y=2"]);
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Document::load(&dir.path().join("missing")).unwrap();
        assert_eq!(loaded, Loaded::NotFound);
    }

    #[test]
    fn load_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::load(dir.path()).unwrap_err();
        assert!(matches!(err, ReconcileError::TargetIsDirectory { .. }));
    }

    #[test]
    fn load_keeps_non_utf8_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.conf");
        std::fs::write(&path, b"caf\xe9\nx=1\n").unwrap();

        let Loaded::Found(doc) = Document::load(&path).unwrap() else {
            panic!("file should load");
        };
        assert_eq!(doc.raw_lines()[0], b"caf\xe9\n");
        doc.write(&path, false).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"caf\xe9\nx=1\n");
    }

    #[test]
    fn write_replaces_content_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.conf");
        std::fs::write(&path, "old\n").unwrap();

        let backup = Document::from_lines(["new"]).write(&path, false).unwrap();

        assert!(backup.is_none());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("new{LINE_SEPARATOR}")
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_with_backup_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.conf");
        std::fs::write(&path, "old\n").unwrap();

        let backup = Document::from_lines(["new"])
            .write(&path, true)
            .unwrap()
            .expect("backup path");

        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old\n");
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("f.conf."), "unexpected backup name {name}");
        assert!(name.ends_with('~'));
    }

    #[test]
    fn backup_skipped_for_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.conf");
        let backup = Document::from_lines(["x"]).write(&path, true).unwrap();
        assert!(backup.is_none());
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.conf");
        std::fs::write(&path, "old\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        Document::from_lines(["new"]).write(&path, false).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn write_through_symlink_updates_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.conf");
        let link = dir.path().join("link.conf");
        std::fs::write(&real, "old\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        Document::from_lines(["new"]).write(&link, false).unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&real).unwrap(), "new\n");
    }

    #[cfg(unix)]
    #[test]
    fn write_through_dangling_symlink_creates_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.conf");
        let link = dir.path().join("link.conf");
        std::os::unix::fs::symlink("real.conf", &link).unwrap();

        Document::from_lines(["new"]).write(&link, false).unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&real).unwrap(), "new\n");
    }

    #[cfg(unix)]
    #[test]
    fn write_keeps_ownership() {
        use std::os::unix::fs::MetadataExt as _;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.conf");
        std::fs::write(&path, "old\n").unwrap();
        let before = std::fs::metadata(&path).unwrap();

        Document::from_lines(["new"]).write(&path, false).unwrap();

        let after = std::fs::metadata(&path).unwrap();
        assert_eq!((after.uid(), after.gid()), (before.uid(), before.gid()));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_target_attributes_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "x\n").unwrap();
        let replacement = tempfile::tempfile().unwrap();

        // A path through a regular file fails with ENOTDIR, not NotFound.
        let err = preserve_attributes(&file.join("child"), &replacement).unwrap_err();
        assert!(matches!(err, ReconcileError::Io { .. }), "unexpected: {err:?}");
    }
}
