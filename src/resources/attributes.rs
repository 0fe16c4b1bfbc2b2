//! Ownership/permission post-step run after a line edit.
//!
//! The line resources treat this step as opaque: they only learn whether it
//! changed anything and fold that into their [`Outcome`](super::Outcome).
use std::path::Path;

use crate::error::ReconcileError;

/// Post-step reconciling file attributes (permissions, ownership, ...).
#[cfg_attr(test, mockall::automock)]
pub trait AttributeStep {
    /// Converge the attributes of `path`, returning whether they changed
    /// (or would change, with `dry_run`).
    ///
    /// A path that does not exist (e.g. a dry run that would have created
    /// it) reports no change.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Io`] if attributes cannot be read or set.
    fn apply(&self, path: &Path, dry_run: bool) -> Result<bool, ReconcileError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Attribute step that never changes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepAttributes;

impl AttributeStep for KeepAttributes {
    fn apply(&self, _path: &Path, _dry_run: bool) -> Result<bool, ReconcileError> {
        Ok(false)
    }

    fn describe(&self) -> String {
        "unchanged attributes".to_string()
    }
}

/// Permission-mode post-step (Unix only; a no-op elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode {
    mode: u32,
}

impl FileMode {
    /// Parse an octal mode such as `"644"` or `"0600"`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidConfiguration`] if `mode` is not an
    /// octal number up to `7777`.
    pub fn parse(mode: &str) -> Result<Self, ReconcileError> {
        u32::from_str_radix(mode, 8)
            .ok()
            .filter(|m| *m <= 0o7777)
            .map(|mode| Self { mode })
            .ok_or_else(|| ReconcileError::InvalidConfiguration(format!("invalid octal mode: {mode}")))
    }

    /// The permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.mode
    }
}

impl AttributeStep for FileMode {
    fn apply(&self, path: &Path, dry_run: bool) -> Result<bool, ReconcileError> {
        if !path.exists() {
            return Ok(false);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let current = std::fs::metadata(path)
                .map_err(|e| ReconcileError::io(path, e))?
                .permissions()
                .mode()
                & 0o7777;
            if current == self.mode {
                return Ok(false);
            }
            if !dry_run {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.mode))
                    .map_err(|e| ReconcileError::io(path, e))?;
            }
            Ok(true)
        }

        #[cfg(not(unix))]
        {
            let _ = dry_run;
            Ok(false)
        }
    }

    fn describe(&self) -> String {
        format!("mode {:o}", self.mode)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_octal() {
        assert_eq!(FileMode::parse("644").unwrap().bits(), 0o644);
        assert_eq!(FileMode::parse("0600").unwrap().bits(), 0o600);
    }

    #[test]
    fn parse_rejects_non_octal() {
        assert!(matches!(
            FileMode::parse("rw-r--r--"),
            Err(ReconcileError::InvalidConfiguration(_))
        ));
        assert!(FileMode::parse("999").is_err());
        assert!(FileMode::parse("17777").is_err());
    }

    #[test]
    fn missing_path_reports_no_change() {
        let dir = tempfile::tempdir().unwrap();
        let step = FileMode::parse("600").unwrap();
        assert!(!step.apply(&dir.path().join("missing"), false).unwrap());
    }

    #[test]
    fn keep_attributes_never_changes() {
        assert!(!KeepAttributes.apply(Path::new("/"), false).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn applies_and_then_reports_correct() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, "test").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        let step = FileMode::parse("600").unwrap();
        assert!(step.apply(&file, false).unwrap());
        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o600);
        assert!(!step.apply(&file, false).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn dry_run_reports_without_changing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        std::fs::write(&file, "test").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        let step = FileMode::parse("600").unwrap();
        assert!(step.apply(&file, true).unwrap());
        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o644);
    }
}
