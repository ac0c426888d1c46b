//! Command: print version information.

/// Print the modlink version to stdout.
pub fn run() {
    let version = option_env!("MODLINK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    println!("modlink {version}");
}
