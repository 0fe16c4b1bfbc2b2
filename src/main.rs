//! `reconcile` command-line entry point.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use reconcile_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, args.global.json, args.command.name());
    let log = Arc::new(logging::Logger::new(args.command.name()));

    match &args.command {
        cli::Command::Line(opts) => commands::line::run(&args.global, opts, &log),
        cli::Command::Vhost(opts) => commands::vhost::run(&args.global, opts, &log),
        cli::Command::Apply(opts) => commands::apply::run(&args.global, opts, &log),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
