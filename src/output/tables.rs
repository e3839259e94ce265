use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::providers::azure::ValidationLevel;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_level_cell(level: ValidationLevel) -> Cell {
    match level {
        ValidationLevel::Ok => Cell::new("ok").fg(TableColor::Green),
        ValidationLevel::Warning => Cell::new("warning").fg(TableColor::Yellow),
        ValidationLevel::Error => Cell::new("error").fg(TableColor::Red),
        ValidationLevel::Unknown => Cell::new("unknown"),
    }
}
