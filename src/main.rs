//! fsagg: Survey Aggregation CLI Tool
//!
//! Reads one worksheet of a displacement-survey export, recodes sentinel
//! answers, derives food-security, remittance and livelihood indicators and
//! writes grouped summaries to a multi-sheet workbook.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use fsagg::cli::{Cli, RunSettings};
use fsagg::pipeline::{
    default_sentinels, derive_all, load_dataset_with_progress, recode, summarize_all,
    MIN_GROUP_SIZE,
};
use fsagg::report::{
    export_run_audit, export_summary_workbook, AuditParams, RunAudit, RunSummary,
};
use fsagg::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let settings = RunSettings::from_cli(&cli)?;
    let schema = &settings.schema;

    // Print styled banner
    print_banner(env!("CARGO_PKG_VERSION"));

    // Print configuration card
    print_config(
        &settings.input,
        &settings.sheet,
        &settings.output,
        MIN_GROUP_SIZE,
    );

    // Step 1: Load dataset
    print_step_header(1, "Load Survey");

    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(&settings.input, &settings.sheet)
        .with_context(|| format!("Failed to load {}", settings.input.display()))?;
    print_success("Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);

    let mut summary = RunSummary::new(rows, cols);
    let load_elapsed = step_start.elapsed();
    summary.set_load_time(load_elapsed);
    print_step_time(load_elapsed);

    // Step 2: Recode sentinel answers
    print_step_header(2, "Recode Sentinel Values");

    let step_start = Instant::now();
    let sentinels = default_sentinels();
    let spinner = create_spinner("Replacing sentinel values...");
    let (mut df, recode_audit) = recode(&df, &sentinels)?;
    finish_with_success(&spinner, "Recoding complete");

    if recode_audit.total() == 0 {
        print_info("No sentinel values found");
    } else {
        print_count(
            "sentinel cell(s)",
            recode_audit.total(),
            Some(&format!("in {} column(s)", recode_audit.replaced_cells.len())),
        );
    }
    summary.add_recode(&recode_audit);

    // Step 3: Derived variables
    print_step_header(3, "Derive Indicators");

    let spinner = create_spinner("Deriving time, age, FCS, remittance and livelihood variables...");
    let derivation_audit = derive_all(&mut df, schema)?;
    finish_with_success(
        &spinner,
        &format!("Derived {} column(s)", derivation_audit.derived_columns.len()),
    );

    if derivation_audit.non_positive_durations > 0 {
        print_count(
            "row(s) with arrival on or after assessment",
            derivation_audit.non_positive_durations,
            Some("(time in location left empty)"),
        );
    }
    if !derivation_audit.dummy_collisions.is_empty() {
        print_count(
            "dummy column name collision(s)",
            derivation_audit.dummy_collisions.len(),
            Some("(see log for how each was resolved)"),
        );
    }
    if derivation_audit.remittances.implausible_amounts > 0 {
        print_count(
            "implausible remittance amount(s)",
            derivation_audit.remittances.implausible_amounts,
            None,
        );
    }
    summary.add_derivation(&derivation_audit);
    let derive_elapsed = step_start.elapsed();
    summary.set_derive_time(derive_elapsed);
    print_step_time(derive_elapsed);

    // Step 4: Group and aggregate
    print_step_header(4, "Aggregate Groups");

    let step_start = Instant::now();
    let spinner = create_spinner("Computing group statistics...");
    let tables = summarize_all(
        &df,
        &schema.groupings(),
        &schema.aggregation_spec(),
        MIN_GROUP_SIZE,
    )?;
    finish_with_success(
        &spinner,
        &format!("Aggregated {} grouping(s)", tables.len()),
    );
    summary.add_sheets(&tables);

    let suppressed = summary.total_suppressed_groups();
    if suppressed == 0 {
        print_info("No groups suppressed");
    } else {
        print_count(
            "group(s) suppressed",
            suppressed,
            Some(&format!("(n <= {})", MIN_GROUP_SIZE)),
        );
    }
    let aggregate_elapsed = step_start.elapsed();
    summary.set_aggregate_time(aggregate_elapsed);
    print_step_time(aggregate_elapsed);

    // Step 5: Save output
    print_step_header(5, "Save Results");

    let step_start = Instant::now();
    let spinner = create_spinner("Writing workbook...");
    export_summary_workbook(&tables, &settings.output)?;
    finish_with_success(
        &spinner,
        &format!("Saved to {}", settings.output.display()),
    );

    if let Some(audit_path) = &settings.audit {
        let audit = RunAudit::new(
            &AuditParams {
                input_file: &settings.input,
                sheet: &settings.sheet,
                output_file: &settings.output,
                min_group_size: MIN_GROUP_SIZE,
                rows,
                columns: cols,
            },
            &recode_audit,
            &derivation_audit,
            &tables,
        );
        export_run_audit(&audit, audit_path)?;
        print_success(&format!("Audit written to {}", audit_path.display()));
    }
    let save_elapsed = step_start.elapsed();
    summary.set_save_time(save_elapsed);
    print_step_time(save_elapsed);

    // Display summary
    summary.display();

    // Final completion message
    print_completion();

    Ok(())
}
