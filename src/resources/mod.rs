//! Idempotent resource primitives (reconcile current state to desired state).
pub mod attributes;
pub mod document;
pub mod helpers;
pub mod line_in_file;
pub mod report;
pub mod vhost;

use anyhow::Result;

pub use report::Outcome;

/// Whether a resource should exist.
///
/// # Examples
///
/// ```
/// use reconcile_cli::resources::Ensure;
///
/// assert_eq!("present".parse::<Ensure>(), Ok(Ensure::Present));
/// assert_eq!("Absent".parse::<Ensure>(), Ok(Ensure::Absent));
/// assert!("gone".parse::<Ensure>().is_err());
/// assert_eq!(Ensure::default(), Ensure::Present);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The resource must exist in the desired form.
    #[default]
    Present,
    /// The resource must not exist.
    Absent,
}

impl std::str::FromStr for Ensure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(format!("invalid state '{other}': expected present or absent")),
        }
    }
}

impl std::fmt::Display for Ensure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// A resource that can be converged to its desired state in one call.
///
/// Implementations validate their configuration at construction time, so
/// `reconcile` only fails on conditions of the environment (filesystem,
/// external commands).
pub trait Reconcile {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Bring the resource to its desired state.
    ///
    /// With `dry_run` set nothing is mutated; the returned [`Outcome`]
    /// reports what would have changed.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError`](crate::error::ReconcileError) (wrapped in
    /// [`anyhow::Error`]) when the target cannot be read, written or queried.
    fn reconcile(&self, dry_run: bool) -> Result<Outcome>;
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Fixed(bool);

    impl Reconcile for Fixed {
        fn description(&self) -> String {
            "fixed".to_string()
        }

        fn reconcile(&self, _dry_run: bool) -> Result<Outcome> {
            Ok(Outcome::new(self.0, "done", usize::from(self.0)))
        }
    }

    #[test]
    fn reconcile_is_object_safe() {
        let resources: Vec<Box<dyn Reconcile>> = vec![Box::new(Fixed(true)), Box::new(Fixed(false))];
        let changed: Vec<bool> = resources
            .iter()
            .map(|r| r.reconcile(true).unwrap().changed)
            .collect();
        assert_eq!(changed, [true, false]);
    }

    #[test]
    fn ensure_display_round_trips() {
        for ensure in [Ensure::Present, Ensure::Absent] {
            assert_eq!(ensure.to_string().parse::<Ensure>(), Ok(ensure));
        }
    }
}
