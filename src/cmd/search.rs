use crate::console;
use clap::Args;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tiforge::config::RawConfig;
use tiforge::error::TiResult;
use tiforge::reports::ResultsAggregator;
use tiforge::search::{ProgressCallback, SearchDriver};
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: RawConfig,

    /// Stop after this many seconds and report the partial run.
    #[arg(short = 'T', long)]
    pub time: Option<u64>,

    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// Logs throughput periodically and enforces the optional time limit.
struct CliLogger {
    start: Instant,
    limit: Option<Duration>,
    last_report: Mutex<Instant>,
}

impl CliLogger {
    const REPORT_INTERVAL: Duration = Duration::from_secs(2);

    fn new(limit: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            limit,
            last_report: Mutex::new(now),
        }
    }
}

impl ProgressCallback for CliLogger {
    fn on_progress(&self, done: usize, total: usize) -> bool {
        let elapsed = self.start.elapsed();

        if let Ok(mut last) = self.last_report.lock() {
            if last.elapsed() >= Self::REPORT_INTERVAL || done == total {
                let rate = done as f64 / elapsed.as_secs_f64().max(1e-9);
                info!(
                    "⏳ {:>10}/{} ({:5.1}%) | {:.0} candidates/s",
                    done,
                    total,
                    100.0 * done as f64 / total.max(1) as f64,
                    rate
                );
                *last = Instant::now();
            }
        }

        match self.limit {
            Some(limit) if elapsed >= limit && done < total => {
                warn!("⏱️  Time limit of {}s reached; stopping", limit.as_secs());
                false
            }
            _ => true,
        }
    }
}

pub fn run(args: SearchArgs, config: RawConfig) -> TiResult<()> {
    info!(
        "📂 Loading leadfield: {}",
        config.leadfield_path()?.display()
    );
    // 1. Resolve config, load the leadfield and map both regions
    let mut driver = SearchDriver::from_raw_config(&config)?;
    info!(
        "🎯 ROI: {} elements | Reference: {} elements",
        driver.roi().len(),
        driver.reference().map_or(0, |r| r.len())
    );

    // 2. Evaluate every candidate
    let logger = CliLogger::new(args.time.map(Duration::from_secs));
    let outcome = driver.run(&logger)?;

    // 3. Write tables, summary and plots (partial results too, if cancelled)
    let report = ResultsAggregator::new(&config.output_dir).aggregate(&outcome)?;

    // 4. Report
    console::print_summary(&report);
    console::print_top(&report.rows, args.top);

    info!("📁 Artifacts:");
    info!("   {}", report.artifacts.results_json.display());
    info!("   {}", report.artifacts.table_csv.display());
    if let Some(path) = &report.artifacts.summary_json {
        info!("   {}", path.display());
    }
    for path in &report.artifacts.plots {
        info!("   {}", path.display());
    }
    Ok(())
}
