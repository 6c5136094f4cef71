//! Table formatting utilities using comfy-table.

use comfy_table::{Cell, Table};

/// Prints a table of tasks with their dependencies and commands.
pub fn print_task_table(rows: &[(String, String, String)]) {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Task").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Dependencies").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Command").add_attribute(comfy_table::Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    for (name, deps, command) in rows {
        let deps_cell = if deps.is_empty() {
            Cell::new("-").fg(comfy_table::Color::DarkGrey)
        } else {
            Cell::new(deps).fg(comfy_table::Color::Cyan)
        };
        table.add_row(vec![
            Cell::new(name).fg(comfy_table::Color::White),
            deps_cell,
            Cell::new(command).fg(comfy_table::Color::DarkGrey),
        ]);
    }

    println!("{}", table);
}
