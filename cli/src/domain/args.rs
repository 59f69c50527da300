//! Argument file composition for the main application.
//!
//! The argument file is user-editable text: one or more arguments per line,
//! `#` comment lines ignored. Fixed arguments are always prepended and never
//! merged by key, so file content cannot override the bind address or port.

/// Content written when the argument file does not exist yet.
pub const ARGS_FILE_TEMPLATE: &str = "# Add custom arguments for the main application here, one per line\n";

/// Required arguments: bind address and port.
#[must_use]
pub fn fixed_arguments(listen: &str, port: u16) -> Vec<String> {
    vec![
        "--listen".to_string(),
        listen.to_string(),
        "--port".to_string(),
        port.to_string(),
    ]
}

/// Arguments declared in the file, in file order.
///
/// Lines whose first non-whitespace character is `#` are dropped; every
/// other line is split on whitespace, so `--bar 1` yields two arguments.
#[must_use]
pub fn custom_arguments(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(ToString::to_string)
        .collect()
}

/// Effective argument list: fixed arguments followed by file arguments.
#[must_use]
pub fn compose_arguments(fixed: &[String], content: &str) -> Vec<String> {
    let mut args = fixed.to_vec();
    args.extend(custom_arguments(content));
    args
}
