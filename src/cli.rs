use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Flag;
use crate::resources::Ensure;
use crate::resources::line_in_file::LineOptions;

/// Top-level CLI entry point for the reconciliation engine.
#[derive(Parser, Debug)]
#[command(
    name = "reconcile",
    about = "Idempotent line-in-file and message-broker vhost reconciliation",
    version
)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Report what would change without applying it
    #[arg(short = 'd', long, visible_alias = "check", global = true)]
    pub dry_run: bool,

    /// Print task results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ensure a line is present in, or absent from, a file
    Line(LineOpts),
    /// Ensure a message-broker virtual host exists with the desired tracing
    Vhost(VhostOpts),
    /// Reconcile every resource declared in a TOML manifest
    Apply(ApplyOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Vhost(_) => "vhost",
            Self::Apply(_) => "apply",
            Self::Version => "version",
        }
    }
}

/// Options for the `line` subcommand.
#[derive(Args, Debug, Clone)]
pub struct LineOpts {
    /// File to modify
    #[arg(long, visible_alias = "dest")]
    pub path: PathBuf,

    /// Regular expression locating the managed line(s)
    #[arg(long, visible_alias = "regex")]
    pub regexp: String,

    /// Whether the line should be present or absent
    #[arg(long, default_value_t = Ensure::Present)]
    pub state: Ensure,

    /// Line to insert or replace (required when present)
    #[arg(long)]
    pub line: Option<String>,

    /// Insert after the last line matching this pattern (or BOF/EOF)
    #[arg(long, conflicts_with = "insertbefore")]
    pub insertafter: Option<String>,

    /// Insert before the last line matching this pattern (or BOF/EOF)
    #[arg(long)]
    pub insertbefore: Option<String>,

    /// Create the file if it does not exist (yes/no)
    #[arg(long, default_value = "no")]
    pub create: Flag,

    /// Keep a timestamped backup of the original file (yes/no)
    #[arg(long, default_value = "no")]
    pub backup: Flag,

    /// Octal permission mode enforced after the edit
    #[arg(long)]
    pub mode: Option<String>,
}

impl LineOpts {
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

/// Options for the `vhost` subcommand.
#[derive(Args, Debug, Clone)]
pub struct VhostOpts {
    /// Virtual host name
    pub name: String,

    /// Whether the vhost should exist
    #[arg(long, default_value_t = Ensure::Present)]
    pub state: Ensure,

    /// Enable message tracing on the vhost (yes/no)
    #[arg(long, default_value = "no")]
    pub tracing: Flag,

    /// Broker node name
    #[arg(long)]
    pub node: Option<String>,
}

/// Options for the `apply` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ApplyOpts {
    /// TOML manifest with [[line]] and [[vhost]] entries
    pub manifest: PathBuf,
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
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_line_defaults() {
        let cli = Cli::parse_from([
            "reconcile", "line", "--path", "/etc/hosts", "--regexp", "^127", "--line",
            "127.0.0.1 localhost",
        ]);
        let Command::Line(opts) = cli.command else {
            panic!("expected line command");
        };
        let options = opts.to_options();
        assert_eq!(options.state, Ensure::Present);
        assert!(!options.create);
        assert!(!options.backup);
        assert_eq!(options.line.as_deref(), Some("127.0.0.1 localhost"));
    }

    #[test]
    fn parse_line_flags_accept_words() {
        let cli = Cli::parse_from([
            "reconcile", "line", "--dest", "/tmp/x", "--regex", "^x=", "--state", "absent",
            "--backup", "yes", "--create", "on",
        ]);
        let Command::Line(opts) = cli.command else {
            panic!("expected line command");
        };
        assert_eq!(opts.state, Ensure::Absent);
        assert!(opts.backup.enabled());
        assert!(opts.create.enabled());
    }

    #[test]
    fn parse_line_rejects_bad_flag() {
        let result = Cli::try_parse_from([
            "reconcile", "line", "--path", "/x", "--regexp", "a", "--backup", "maybe",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_line_rejects_both_anchors() {
        let result = Cli::try_parse_from([
            "reconcile", "line", "--path", "/x", "--regexp", "a", "--line", "a",
            "--insertafter", "BOF", "--insertbefore", "EOF",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_vhost() {
        let cli = Cli::parse_from(["reconcile", "vhost", "/test", "--tracing", "yes"]);
        let Command::Vhost(opts) = cli.command else {
            panic!("expected vhost command");
        };
        assert_eq!(opts.name, "/test");
        assert!(opts.tracing.enabled());
        assert_eq!(opts.state, Ensure::Present);
        assert_eq!(opts.node, None);
    }

    #[test]
    fn parse_check_alias_and_json() {
        let cli = Cli::parse_from(["reconcile", "--check", "--json", "apply", "site.toml"]);
        assert!(cli.global.dry_run);
        assert!(cli.global.json);
        assert!(matches!(cli.command, Command::Apply(_)));
    }

    #[test]
    fn parse_dry_run_short_after_subcommand() {
        let cli = Cli::parse_from(["reconcile", "vhost", "/t", "-d"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_version_and_verbose() {
        let cli = Cli::parse_from(["reconcile", "-v", "version"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Version));
        assert_eq!(cli.command.name(), "version");
    }
}
