//! Plain text output for CLI commands.

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print a labelled value
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:<16} {}", format!("{label}:"), value);
}

/// Print hook output, if any
pub fn print_output(output: &[u8]) {
    if output.is_empty() {
        return;
    }
    println!("--- hook output ---");
    println!("{}", String::from_utf8_lossy(output).trim_end());
}
