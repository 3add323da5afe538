use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use timdex_cli::pipeline::TransformResult;

pub fn print_summary(result: &TransformResult) {
    println!("Source: {} ({})", result.source_name, result.run.source);
    println!(
        "Run: {} {} {}",
        result.run.run_id,
        result.run.run_date_string(),
        result.run.run_type
    );
    for file in &result.output.files {
        println!("Output: {}", file.display());
    }

    let stats = &result.stats;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Processed"),
        header_cell("Indexed"),
        header_cell("Deleted"),
        header_cell("Skipped"),
        header_cell("Errored"),
        header_cell("Elapsed"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(stats.processed).add_attribute(Attribute::Bold),
        count_cell(stats.indexed, Color::Green),
        count_cell(stats.deleted, Color::Blue),
        count_cell(stats.skipped, Color::Yellow),
        count_cell(stats.errored, Color::Red),
        Cell::new(format!("{:.2}s", result.elapsed.as_secs_f64())),
    ]);
    for index in 0..5 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
