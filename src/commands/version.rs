//! Command: print version information.

/// Version string baked in at build time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("HOMEBUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
pub fn run() {
    println!("homebuild {}", version());
}
