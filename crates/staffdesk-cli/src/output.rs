//! Terminal output helpers.

/// Print a success line.
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print an error line to stderr.
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}
