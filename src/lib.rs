//! Declarative reconciliation engine.
//!
//! Converges two kinds of resources to a desired state, idempotently and with
//! a dry-run mode: a single line inside a text file, and a message-broker
//! virtual host with its tracing flag.
//!
//! The public API is organised into four layers:
//!
//! - **[`resources`]** - the engines: line resolver, file loader, vhost convergence
//! - **[`config`]** - boolean flags, TOML manifests and their validation
//! - **[`tasks`]** - run a resource in a [`tasks::Context`] and record the result
//! - **[`commands`]** - top-level subcommand orchestration (`line`, `vhost`, `apply`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

/// Command-line argument definitions.
pub mod cli;
/// Top-level subcommand orchestration.
pub mod commands;
/// Flags, TOML manifests and their validation.
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod resources;
pub mod tasks;
