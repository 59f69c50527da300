//! Version command

/// Run the version command.
pub fn run() {
    println!("ignite {}", env!("CARGO_PKG_VERSION"));
}
