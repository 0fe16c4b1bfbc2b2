//! Message-broker virtual host resource driven through `rabbitmqctl`.
use anyhow::Result;

use super::{Ensure, Outcome, Reconcile};
use crate::exec::Executor;

/// Control-plane binary.
pub const RABBITMQCTL: &str = "rabbitmqctl";

/// Default broker node name.
pub const DEFAULT_NODE: &str = "rabbit";

/// A virtual host that can be checked and converged.
#[derive(Debug)]
pub struct Vhost<'a> {
    /// Virtual host name (e.g. `/test`).
    pub name: String,
    /// Whether the vhost should exist.
    pub state: Ensure,
    /// Desired value of the `tracing` attribute.
    pub tracing: bool,
    /// Broker node passed with `-n`.
    pub node: String,
    /// Executor for running `rabbitmqctl`.
    executor: &'a dyn Executor,
}

/// Current state of an existing vhost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VhostStatus {
    /// Whether tracing is currently enabled.
    pub tracing: bool,
}

impl<'a> Vhost<'a> {
    /// Create a new vhost resource.
    #[must_use]
    pub fn new(
        name: String,
        state: Ensure,
        tracing: bool,
        node: Option<String>,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            name,
            state,
            tracing,
            node: node.unwrap_or_else(|| DEFAULT_NODE.to_string()),
            executor,
        }
    }

    /// Query the broker for this vhost.
    ///
    /// The listing is read-only and runs even in a dry run.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ExternalCommandFailed`](crate::error::ReconcileError::ExternalCommandFailed)
    /// if `rabbitmqctl` exits non-zero.
    pub fn current_state(&self) -> Result<Option<VhostStatus>> {
        let result = self.executor.run(
            RABBITMQCTL,
            &self.args(&["list_vhosts", "name", "tracing"]),
        )?;
        Ok(parse_listing(&result.stdout, &self.name))
    }

    fn args<'b>(&'b self, rest: &[&'b str]) -> Vec<&'b str> {
        let mut args = vec!["-q", "-n", self.node.as_str()];
        args.extend_from_slice(rest);
        args
    }

    /// Run a mutating command unless `dry_run` is set.
    fn ctl(&self, rest: &[&str], dry_run: bool) -> Result<()> {
        if dry_run {
            tracing::debug!("skipping in dry run: {RABBITMQCTL} {}", rest.join(" "));
            return Ok(());
        }
        self.executor.run(RABBITMQCTL, &self.args(rest))?;
        Ok(())
    }

    fn set_tracing(&self, dry_run: bool) -> Result<()> {
        let toggle = if self.tracing { "trace_on" } else { "trace_off" };
        self.ctl(&[toggle, "-p", &self.name], dry_run)
    }

    const fn tracing_word(&self) -> &'static str {
        if self.tracing { "enabled" } else { "disabled" }
    }
}

impl Reconcile for Vhost<'_> {
    fn description(&self) -> String {
        format!("vhost {} ({})", self.name, self.state)
    }

    fn reconcile(&self, dry_run: bool) -> Result<Outcome> {
        match (self.current_state()?, self.state) {
            (None, Ensure::Absent) => Ok(Outcome::unchanged()),
            (None, Ensure::Present) => {
                self.ctl(&["add_vhost", &self.name], dry_run)?;
                self.set_tracing(dry_run)?;
                Ok(Outcome::new(
                    true,
                    format!("vhost {} created, tracing {}", self.name, self.tracing_word()),
                    1,
                ))
            }
            (Some(_), Ensure::Absent) => {
                self.ctl(&["delete_vhost", &self.name], dry_run)?;
                Ok(Outcome::new(true, format!("vhost {} deleted", self.name), 1))
            }
            (Some(status), Ensure::Present) if status.tracing != self.tracing => {
                self.set_tracing(dry_run)?;
                Ok(Outcome::new(
                    true,
                    format!("vhost {} tracing {}", self.name, self.tracing_word()),
                    1,
                ))
            }
            (Some(_), Ensure::Present) => Ok(Outcome::unchanged()),
        }
    }
}

/// Find `name` in `list_vhosts name tracing` output (tab-separated rows).
fn parse_listing(stdout: &str, name: &str) -> Option<VhostStatus> {
    stdout.lines().find_map(|row| {
        let mut fields = row.split('\t');
        (fields.next()? == name).then(|| VhostStatus {
            tracing: fields.next().is_some_and(|t| t.trim() == "true"),
        })
    })
}
