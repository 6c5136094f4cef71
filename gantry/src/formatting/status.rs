//! Status indicators and message formatting.

use owo_colors::OwoColorize;

/// Status types for consistent formatting.
#[derive(Debug, Clone, Copy)]
pub enum Status {
    Success,
    Error,
    Warning,
}

impl Status {
    /// Returns the symbol for this status.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Error => "✗",
            Status::Warning => "⚠",
        }
    }

    /// Returns the colored symbol for this status.
    pub fn colored_symbol(&self) -> String {
        match self {
            Status::Success => self.symbol().green().to_string(),
            Status::Error => self.symbol().red().to_string(),
            Status::Warning => self.symbol().yellow().to_string(),
        }
    }

    /// Formats a status message with symbol and color.
    pub fn format(&self, message: &str) -> String {
        let text = match self {
            Status::Success => message.green().bold().to_string(),
            Status::Error => message.red().bold().to_string(),
            Status::Warning => message.yellow().bold().to_string(),
        };
        format!("{} {}", self.colored_symbol(), text)
    }
}

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("  {}", Status::Success.format(message));
}

/// Prints an error message.
pub fn print_error(message: &str) {
    println!("  {}", Status::Error.format(message));
}

/// Prints a warning message.
pub fn print_warning(message: &str) {
    println!("  {}", Status::Warning.format(message));
}
