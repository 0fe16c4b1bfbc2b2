//! Command: print version information.

/// Version string embedded by the build script.
#[must_use]
pub fn version() -> &'static str {
    option_env!("RECONCILE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("reconcile {}", version());
}
