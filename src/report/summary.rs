//! Run summary report generation

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{DerivationAudit, RecodeAudit, SummaryTable};

/// Per-sheet counts shown in the summary
#[derive(Debug, Default)]
struct SheetLine {
    name: String,
    kept: usize,
    suppressed: usize,
    suppressed_rows: usize,
}

/// Summary of one pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows: usize,
    pub columns: usize,
    pub recoded_cells: usize,
    pub recoded_columns: usize,
    pub derived_columns: usize,
    pub dummy_collisions: usize,
    pub non_positive_durations: usize,
    pub zero_remittances: usize,
    pub implausible_remittances: usize,
    sheets: Vec<SheetLine>,
    load_time: Duration,
    derive_time: Duration,
    aggregate_time: Duration,
    save_time: Duration,
}

impl RunSummary {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            ..Default::default()
        }
    }

    pub fn add_recode(&mut self, audit: &RecodeAudit) {
        self.recoded_cells = audit.total();
        self.recoded_columns = audit.replaced_cells.len();
    }

    pub fn add_derivation(&mut self, audit: &DerivationAudit) {
        self.derived_columns = audit.derived_columns.len();
        self.dummy_collisions = audit.dummy_collisions.len();
        self.non_positive_durations = audit.non_positive_durations;
        self.zero_remittances = audit.remittances.zero_amounts;
        self.implausible_remittances = audit.remittances.implausible_amounts;
    }

    pub fn add_sheets(&mut self, tables: &[SummaryTable]) {
        self.sheets = tables
            .iter()
            .map(|t| SheetLine {
                name: t.sheet_name.clone(),
                kept: t.rows.len(),
                suppressed: t.suppressed_groups,
                suppressed_rows: t.suppressed_rows,
            })
            .collect();
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = elapsed;
    }

    pub fn set_derive_time(&mut self, elapsed: Duration) {
        self.derive_time = elapsed;
    }

    pub fn set_aggregate_time(&mut self, elapsed: Duration) {
        self.aggregate_time = elapsed;
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = elapsed;
    }

    pub fn total_suppressed_groups(&self) -> usize {
        self.sheets.iter().map(|s| s.suppressed).sum()
    }

    pub fn total_time(&self) -> Duration {
        self.load_time + self.derive_time + self.aggregate_time + self.save_time
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Respondents"), Cell::new(self.rows)]);
        table.add_row(vec![Cell::new("📐 Source Columns"), Cell::new(self.columns)]);
        table.add_row(vec![
            Cell::new("🔁 Recoded Cells"),
            Cell::new(format!(
                "{} in {} column(s)",
                self.recoded_cells, self.recoded_columns
            )),
        ]);
        table.add_row(vec![
            Cell::new("➕ Derived Columns"),
            Cell::new(self.derived_columns),
        ]);
        table.add_row(vec![
            Cell::new("🔀 Dummy Name Collisions"),
            count_cell(self.dummy_collisions),
        ]);
        table.add_row(vec![
            Cell::new("⏳ Non-positive Durations"),
            count_cell(self.non_positive_durations),
        ]);
        table.add_row(vec![
            Cell::new("💸 Zero Remittances"),
            count_cell(self.zero_remittances),
        ]);
        table.add_row(vec![
            Cell::new("⚠️  Implausible Remittances"),
            count_cell(self.implausible_remittances),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Suppressed Groups"),
            count_cell(self.total_suppressed_groups()),
        ]);
        table.add_row(vec![
            Cell::new("⏱️  Total Time"),
            Cell::new(format!("{:.2}s", self.total_time().as_secs_f64())),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if self.sheets.is_empty() {
            return;
        }

        println!();
        println!(
            "    {} {}",
            style("📝").cyan(),
            style("SHEETS").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut sheets = Table::new();
        sheets.load_preset(UTF8_FULL_CONDENSED);
        sheets.set_header(vec![
            Cell::new("Sheet").add_attribute(Attribute::Bold),
            Cell::new("Groups Kept").add_attribute(Attribute::Bold),
            Cell::new("Suppressed").add_attribute(Attribute::Bold),
            Cell::new("Rows Suppressed").add_attribute(Attribute::Bold),
        ]);
        for sheet in &self.sheets {
            sheets.add_row(vec![
                Cell::new(&sheet.name),
                Cell::new(sheet.kept).fg(Color::Green),
                count_cell(sheet.suppressed),
                count_cell(sheet.suppressed_rows),
            ]);
        }
        for line in sheets.to_string().lines() {
            println!("    {}", line);
        }
    }
}

fn count_cell(count: usize) -> Cell {
    Cell::new(count).fg(if count == 0 { Color::White } else { Color::Yellow })
}
