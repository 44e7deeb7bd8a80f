pub mod plots;
pub mod summary;
pub mod table;

pub use self::summary::{MetricRange, RunSummary, SummaryStats};
pub use self::table::{
    build_rows, rank_order, read_results_json, read_table, top_n, write_results_json,
    write_table, ResultRow,
};

use crate::error::ReportError;
use crate::search::{ResultsCollection, SearchOutcome};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RESULTS_JSON: &str = "analysis_results.json";
pub const TABLE_CSV: &str = "final_output.csv";
pub const SUMMARY_JSON: &str = "summary.json";

/// Paths of everything one aggregation wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub results_json: PathBuf,
    pub table_csv: PathBuf,
    pub summary_json: Option<PathBuf>,
    pub plots: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AggregateReport {
    /// Ranked best first.
    pub rows: Vec<ResultRow>,
    pub stats: SummaryStats,
    pub run: Option<RunSummary>,
    pub artifacts: Artifacts,
}

/// Turns a results collection into the on-disk report set.
#[derive(Debug, Clone)]
pub struct ResultsAggregator {
    output_dir: PathBuf,
    plots: bool,
}

impl ResultsAggregator {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            plots: true,
        }
    }

    pub fn without_plots(mut self) -> Self {
        self.plots = false;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full report for a finished (or cancelled) search, including `summary.json`.
    pub fn aggregate(&self, outcome: &SearchOutcome) -> Result<AggregateReport, ReportError> {
        let mut report = self.aggregate_results(&outcome.results)?;

        let run = RunSummary::new(outcome, report.stats.clone());
        let path = self.output_dir.join(SUMMARY_JSON);
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &run)?;
        info!("📝 Summary written to {}", path.display());

        report.artifacts.summary_json = Some(path);
        report.run = Some(run);
        Ok(report)
    }

    /// Writes the results mapping, the ranked table and any plots.
    pub fn aggregate_results(
        &self,
        results: &ResultsCollection,
    ) -> Result<AggregateReport, ReportError> {
        fs::create_dir_all(&self.output_dir)?;

        let results_json = self.output_dir.join(RESULTS_JSON);
        write_results_json(&results_json, results)?;

        let rows = build_rows(results);
        let table_csv = self.output_dir.join(TABLE_CSV);
        write_table(&table_csv, &rows)?;
        info!(
            "💾 {} rows written to {}",
            rows.len(),
            table_csv.display()
        );

        let stats = SummaryStats::from_rows(&rows);

        let plots = if self.plots && !rows.is_empty() {
            plots::render_all(&self.output_dir, &rows)
        } else {
            Vec::new()
        };

        Ok(AggregateReport {
            rows,
            stats,
            run: None,
            artifacts: Artifacts {
                results_json,
                table_csv,
                summary_json: None,
                plots,
            },
        })
    }
}
