pub mod results;

pub use self::results::ResultsCollection;

use crate::config::{RawConfig, SearchConfig};
use crate::currents::{self, CurrentRatios};
use crate::error::{ConfigError, TiResult};
use crate::evaluator::{CandidateEvaluator, EvaluationOptions};
use crate::leadfield::{LeadfieldStore, RegionSelection};
use crate::montage::{MontageCandidate, MontageEnumerator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum_macros::Display;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum SearchState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Aborted,
}

/// Called between candidate batches. Returning `false` cancels the search.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, done: usize, total: usize) -> bool;
}

pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&self, _done: usize, _total: usize) -> bool {
        true
    }
}

/// Cooperative cancellation flag, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub signature: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub state: SearchState,
    pub results: ResultsCollection,
    pub skipped: Vec<SkippedCandidate>,
    pub total_candidates: usize,
    pub evaluated: usize,
    pub channel_limit_exceeded: bool,
    /// Empty-region and similar non-fatal notices for the summary.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub threads: Option<usize>,
    pub batch_size: usize,
    pub evaluation: EvaluationOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: 4096,
            evaluation: EvaluationOptions::default(),
        }
    }
}

impl SearchOptions {
    pub fn from_raw(raw: &RawConfig) -> Result<Self, ConfigError> {
        if raw.threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "threads",
                value: "0".to_string(),
            });
        }
        Ok(Self {
            threads: raw.threads,
            batch_size: raw.batch_size.max(1),
            evaluation: EvaluationOptions {
                percentile: raw.percentile()?,
            },
        })
    }
}

/// Runs every candidate of a search through the evaluator.
pub struct SearchDriver {
    config: SearchConfig,
    leadfield: Arc<LeadfieldStore>,
    roi: RegionSelection,
    reference: Option<RegionSelection>,
    options: SearchOptions,
    state: SearchState,
    cancel: CancelToken,
}

impl SearchDriver {
    pub fn new(
        config: SearchConfig,
        leadfield: Arc<LeadfieldStore>,
        roi: RegionSelection,
        reference: Option<RegionSelection>,
        options: SearchOptions,
    ) -> Self {
        Self {
            config,
            leadfield,
            roi,
            reference,
            options,
            state: SearchState::Idle,
            cancel: CancelToken::default(),
        }
    }

    /// Resolves the configuration, loads the leadfield and maps both regions.
    /// Any failure here is fatal and happens before candidate work starts.
    pub fn from_raw_config(raw: &RawConfig) -> TiResult<Self> {
        let config = raw.resolve()?;
        let options = SearchOptions::from_raw(raw)?;
        let roi_spec = raw.roi_spec()?;
        let reference_tags = raw.reference_tag_set()?;

        let leadfield = LeadfieldStore::load(raw.leadfield_path()?)?;
        let roi = leadfield.select_sphere(&roi_spec);
        let reference = leadfield.select_tags(&reference_tags);

        Ok(Self::new(
            config,
            Arc::new(leadfield),
            roi,
            Some(reference),
            options,
        ))
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn leadfield(&self) -> &LeadfieldStore {
        &self.leadfield
    }

    pub fn roi(&self) -> &RegionSelection {
        &self.roi
    }

    pub fn reference(&self) -> Option<&RegionSelection> {
        self.reference.as_ref()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn evaluator(&self) -> CandidateEvaluator<'_> {
        CandidateEvaluator::new(&self.leadfield, &self.roi, self.reference.as_ref())
            .with_options(self.options.evaluation)
    }

    pub fn ratios(&self) -> CurrentRatios {
        currents::generate(
            self.config.total_current,
            self.config.current_step,
            self.config.channel_limit,
        )
    }

    pub fn enumerator(&self, ratios: &CurrentRatios) -> MontageEnumerator {
        MontageEnumerator::new(&self.config, &ratios.pairs)
    }

    pub fn run<CB: ProgressCallback>(&mut self, callback: &CB) -> TiResult<SearchOutcome> {
        let ratios = self.ratios();
        if ratios.is_empty() {
            self.state = SearchState::Aborted;
            return Err(ConfigError::NoCurrentRatios {
                total: self.config.total_current,
                step: self.config.current_step,
                limit: self.config.channel_limit,
            }
            .into());
        }

        let enumerator = self.enumerator(&ratios);
        let total = enumerator.count();
        if total == 0 {
            self.state = SearchState::Aborted;
            return Err(ConfigError::NoCandidates(format!(
                "{} enumeration over the given pools yields nothing",
                enumerator.policy()
            ))
            .into());
        }

        let warnings = self.preflight_warnings();

        info!(
            "🔍 Searching {} candidates ({} policy, {} current ratios)",
            total,
            enumerator.policy(),
            ratios.len()
        );

        let pool = match self.options.threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ConfigError::InvalidValue {
                        field: "threads",
                        value: e.to_string(),
                    })?,
            ),
            None => None,
        };

        self.state = SearchState::Running;
        let mut outcome = match &pool {
            Some(pool) => {
                pool.install(|| self.drive(&enumerator, ratios.decimals, total, callback))
            }
            None => self.drive(&enumerator, ratios.decimals, total, callback),
        };
        outcome.channel_limit_exceeded = ratios.channel_limit_exceeded;
        outcome.warnings = warnings;

        self.state = outcome.state;
        info!(
            "Search {}: {} evaluated, {} skipped, {} of {} candidates",
            outcome.state,
            outcome.results.len(),
            outcome.skipped.len(),
            outcome.evaluated,
            total
        );
        Ok(outcome)
    }

    fn drive<CB: ProgressCallback>(
        &self,
        enumerator: &MontageEnumerator,
        decimals: usize,
        total: usize,
        callback: &CB,
    ) -> SearchOutcome {
        let evaluator = self.evaluator();
        let cancel = &self.cancel;
        let batch_size = self.options.batch_size.max(1);

        let mut results = ResultsCollection::new();
        let mut skipped = Vec::new();
        let mut done = 0usize;
        let mut candidates = enumerator.iter();

        loop {
            if cancel.is_cancelled() {
                break;
            }
            let batch: Vec<MontageCandidate> = candidates.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            let evaluated: Vec<_> = batch
                .par_iter()
                .map(|candidate| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some((
                        candidate.signature_with_decimals(decimals),
                        evaluator.evaluate(candidate),
                    ))
                })
                .collect();

            for (signature, result) in evaluated.into_iter().flatten() {
                done += 1;
                match result {
                    Ok(metrics) => {
                        if let Err(signature) = results.try_insert(signature, metrics) {
                            skipped.push(SkippedCandidate {
                                signature,
                                reason: "duplicate signature".to_string(),
                            });
                        }
                    }
                    Err(e) => {
                        warn!("Skipping candidate {}: {}", signature, e);
                        skipped.push(SkippedCandidate {
                            signature,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            debug!("Progress {}/{}", done, total);
            if !callback.on_progress(done, total) {
                cancel.cancel();
            }
        }

        let state = if done < total {
            SearchState::Cancelled
        } else {
            SearchState::Completed
        };

        SearchOutcome {
            state,
            results,
            skipped,
            total_candidates: total,
            evaluated: done,
            channel_limit_exceeded: false,
            warnings: Vec::new(),
        }
    }

    fn preflight_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let unknown: Vec<&str> = self
            .config
            .pools
            .all_names()
            .into_iter()
            .filter(|name| !self.leadfield.contains(name))
            .collect();
        if !unknown.is_empty() {
            warn!(
                "⚠️  Electrodes not in the leadfield (their candidates will be skipped): {}",
                unknown.join(", ")
            );
        }

        if self.roi.is_empty() {
            let msg = "ROI selection contains no elements; ROI metrics are missing".to_string();
            warn!("⚠️  {}", msg);
            warnings.push(msg);
        }
        match &self.reference {
            Some(reference) if reference.is_empty() => {
                let msg = "Reference selection contains no elements; focality is missing"
                    .to_string();
                warn!("⚠️  {}", msg);
                warnings.push(msg);
            }
            _ => {}
        }
        warnings
    }
}
