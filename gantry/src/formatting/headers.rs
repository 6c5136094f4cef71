//! Section header formatting.

use owo_colors::OwoColorize;

/// Style options for section headers.
#[derive(Debug, Clone, Copy)]
pub enum SectionStyle {
    Primary,
    Success,
}

impl SectionStyle {
    fn colorize(&self, text: &str) -> String {
        match self {
            SectionStyle::Primary => text.cyan().bold().to_string(),
            SectionStyle::Success => text.green().bold().to_string(),
        }
    }
}

/// Prints a section header.
pub fn print_section_header(title: &str, style: SectionStyle) {
    println!("{}", style.colorize(title));
    println!();
}
