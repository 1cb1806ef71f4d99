//! Color helpers for terminal output

use console::style;

/// Format a success message (green)
pub fn success(msg: &str) -> String {
    style(msg).green().to_string()
}

/// Format an error message (red)
pub fn error(msg: &str) -> String {
    style(msg).red().to_string()
}

/// Format a warning message (yellow)
pub fn warning(msg: &str) -> String {
    style(msg).yellow().to_string()
}

/// Format a status/info message (dim)
pub fn status(msg: &str) -> String {
    style(msg).dim().to_string()
}

/// Format a header (bold)
pub fn header(msg: &str) -> String {
    style(msg).bold().to_string()
}

/// Format a model or command name (cyan)
pub fn name(msg: &str) -> String {
    style(msg).cyan().to_string()
}

/// Enable or disable styling globally (`--no-color`, `NO_COLOR`)
pub fn set_enabled(enabled: bool) {
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}
