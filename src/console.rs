use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tiforge::evaluator::CandidateMetrics;
use tiforge::montage::MontageCandidate;
use tiforge::reports::{AggregateReport, MetricRange, ResultRow};

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

fn range_cells(name: &str, range: Option<MetricRange>) -> Vec<Cell> {
    match range {
        Some(r) => vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.4}", r.min)),
            Cell::new(format!("{:.4}", r.max)),
            Cell::new(r.count),
        ],
        None => vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(0),
        ],
    }
}

fn right_align(table: &mut Table, columns: std::ops::RangeInclusive<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn print_summary(report: &AggregateReport) {
    let stats = &report.stats;
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Min"),
        Cell::new("Max"),
        Cell::new("Count"),
    ]);
    table.add_row(range_cells("TImax ROI", stats.ti_max));
    table.add_row(range_cells("TImean ROI", stats.ti_mean));
    table.add_row(range_cells("Focality", stats.focality));
    table.add_row(range_cells("Composite", stats.composite));
    right_align(&mut table, 1..=3);
    println!("\n{}", table);

    if let Some(run) = &report.run {
        let state_color = if run.evaluated == run.total_candidates {
            Color::Green
        } else {
            Color::Yellow
        };
        println!(
            "State: {} | Evaluated {}/{} | Skipped {} | Empty ROI {}",
            run.state, run.evaluated, run.total_candidates, run.skipped, stats.empty_roi_candidates
        );
        let mut notes = Table::new();
        notes.load_preset(ASCII_FULL);
        notes.add_row(vec![Cell::new(format!("Run {}", run.state)).fg(state_color)]);
        for warning in &run.warnings {
            notes.add_row(vec![Cell::new(warning).fg(Color::Yellow)]);
        }
        println!("{}", notes);
    }
}

pub fn print_top(rows: &[ResultRow], n: usize) {
    if rows.is_empty() || n == 0 {
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("#"),
        Cell::new("Montage").add_attribute(Attribute::Bold),
        Cell::new("TImax"),
        Cell::new("TImean"),
        Cell::new("TIpct"),
        Cell::new("Ref mean"),
        Cell::new("Focality"),
        Cell::new("Composite").fg(Color::Cyan),
    ]);

    for (rank, row) in rows.iter().take(n).enumerate() {
        let montage = if rank == 0 {
            Cell::new(&row.montage)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(&row.montage).add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            montage,
            Cell::new(fmt_opt(row.ti_max_roi)),
            Cell::new(fmt_opt(row.ti_mean_roi)),
            Cell::new(fmt_opt(row.ti_percentile_roi)),
            Cell::new(fmt_opt(row.ti_mean_reference)),
            Cell::new(fmt_opt(row.focality)),
            Cell::new(fmt_opt(row.composite_index)).fg(Color::Cyan),
        ]);
    }
    right_align(&mut table, 2..=7);
    println!("\n=== 🏆 TOP {} MONTAGES ===\n{}", n.min(rows.len()), table);
}

pub fn print_metrics(candidate: &MontageCandidate, metrics: &CandidateMetrics) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    table.add_row(vec![
        Cell::new(candidate.signature()).add_attribute(Attribute::Bold),
        Cell::new("Value"),
    ]);
    let rows = [
        ("TImax ROI", metrics.ti_max_roi),
        ("TImean ROI", metrics.ti_mean_roi),
        ("TIpct ROI", metrics.ti_percentile_roi),
        ("TImean Reference", metrics.ti_mean_reference),
        ("Focality", metrics.focality),
        ("Composite", metrics.composite_index()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(fmt_opt(value))]);
    }
    table.add_row(vec![Cell::new("ROI elements"), Cell::new(metrics.n_elements)]);
    right_align(&mut table, 1..=1);
    println!("\n{}", table);
}
