use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::commands::RunOutcome;

pub fn print_summary(outcome: &RunOutcome) {
    if let Some(dir) = &outcome.output_dir {
        println!("Output: {}", dir.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Processed"),
        header_cell("Created"),
        header_cell("Updated"),
        header_cell("Skipped"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut totals = (0usize, 0usize, 0usize, 0usize);
    for phase in &outcome.report.phases {
        totals.0 += phase.processed;
        totals.1 += phase.created;
        totals.2 += phase.updated;
        totals.3 += phase.skipped_total();
        table.add_row(vec![
            Cell::new(&phase.label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(phase.processed),
            count_cell(phase.created, Color::Green),
            count_cell(phase.updated, Color::Cyan),
            count_cell(phase.skipped_total(), Color::Yellow),
        ]);
        for (reason, count) in &phase.skipped {
            table.add_row(vec![
                Cell::new(format!("  -> {reason}")).fg(Color::DarkGrey),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                Cell::new(*count).fg(Color::DarkGrey),
            ]);
        }
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(totals.0).add_attribute(Attribute::Bold),
        Cell::new(totals.1).add_attribute(Attribute::Bold),
        Cell::new(totals.2).add_attribute(Attribute::Bold),
        Cell::new(totals.3).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_outcome_table(outcome);

    let counts = &outcome.counts;
    println!(
        "Store: {} customers, {} submissions, {} brands, {} products, {} orders, {} vouchers",
        counts.customers,
        counts.submissions,
        counts.brands,
        counts.products,
        counts.orders,
        counts.vouchers,
    );
}

fn print_outcome_table(outcome: &RunOutcome) {
    let tally = &outcome.report.outcomes;
    if tally.orders_total() == 0
        && tally.published == 0
        && tally.withdrawn_total() == 0
        && tally.order_skips == 0
    {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Outcome"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("Paid orders"),
        count_cell(tally.paid_orders, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Unpaid orders"),
        count_cell(tally.unpaid_orders, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Orders already present"),
        count_cell(tally.order_skips, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Still-available copies"),
        count_cell(tally.copies, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Copies already present"),
        count_cell(tally.copy_skips, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Published"),
        count_cell(tally.published, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Withdrawn"),
        count_cell(tally.withdrawn_total(), Color::Red),
    ]);
    for (reason, count) in &tally.withdrawn {
        table.add_row(vec![
            Cell::new(format!("  -> {reason}")).fg(Color::DarkGrey),
            Cell::new(*count).fg(Color::DarkGrey),
        ]);
    }
    println!();
    println!("Outcomes:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
