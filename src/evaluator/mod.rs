pub mod envelope;
pub mod stats;

use crate::currents::CurrentPair;
use crate::error::EvaluationError;
use crate::leadfield::{FieldColumn, LeadfieldStore, RegionSelection};
use crate::montage::MontageCandidate;
use serde::{Deserialize, Serialize};

/// Scores of one candidate. Reference-dependent metrics are `None` without a reference region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetrics {
    pub ti_max_roi: Option<f64>,
    pub ti_mean_roi: Option<f64>,
    pub ti_percentile_roi: Option<f64>,
    pub ti_mean_reference: Option<f64>,
    pub focality: Option<f64>,
    pub n_elements: usize,
    /// Exact split the candidate was scored with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currents: Option<CurrentPair>,
}

impl CandidateMetrics {
    /// Record for an ROI that selected no elements.
    pub fn empty() -> Self {
        Self {
            ti_max_roi: None,
            ti_mean_roi: None,
            ti_percentile_roi: None,
            ti_mean_reference: None,
            focality: None,
            n_elements: 0,
            currents: None,
        }
    }

    pub fn composite_index(&self) -> Option<f64> {
        Some(self.ti_mean_roi? * self.focality?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    /// Percentile of the ROI envelope reported as `ti_percentile_roi`.
    pub percentile: f64,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self { percentile: 99.9 }
    }
}

/// Field columns of the four electrodes of a candidate.
struct ChannelColumns<'a> {
    plus1: FieldColumn<'a>,
    minus1: FieldColumn<'a>,
    plus2: FieldColumn<'a>,
    minus2: FieldColumn<'a>,
    i1: f64,
    i2: f64,
}

impl ChannelColumns<'_> {
    #[inline(always)]
    fn envelope_at(&self, element: usize) -> f64 {
        let e1 = envelope::pair_field(self.plus1.at(element), self.minus1.at(element), self.i1);
        let e2 = envelope::pair_field(self.plus2.at(element), self.minus2.at(element), self.i2);
        envelope::max_ti_amplitude(e1, e2)
    }
}

/// Scores candidates against a fixed leadfield and region pair.
pub struct CandidateEvaluator<'a> {
    leadfield: &'a LeadfieldStore,
    roi: &'a RegionSelection,
    reference: Option<&'a RegionSelection>,
    options: EvaluationOptions,
}

impl<'a> CandidateEvaluator<'a> {
    pub fn new(
        leadfield: &'a LeadfieldStore,
        roi: &'a RegionSelection,
        reference: Option<&'a RegionSelection>,
    ) -> Self {
        Self {
            leadfield,
            roi,
            reference,
            options: EvaluationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn evaluate(&self, candidate: &MontageCandidate) -> Result<CandidateMetrics, EvaluationError> {
        if self.roi.is_empty() {
            return Ok(CandidateMetrics {
                currents: Some(candidate.currents),
                ..CandidateMetrics::empty()
            });
        }

        let columns = self.columns(candidate)?;

        let roi_env = self.region_envelope(&columns, self.roi)?;
        let ti_max_roi = stats::max_value(&roi_env);
        let ti_mean_roi = stats::weighted_average(&roi_env, &self.roi.weights)
            .ok_or(EvaluationError::DegenerateWeights)?;
        let ti_percentile_roi =
            stats::weighted_percentile(&roi_env, &self.roi.weights, self.options.percentile);

        let (ti_mean_reference, focality) = match self.reference {
            Some(reference) if !reference.is_empty() => {
                let ref_env = self.region_envelope(&columns, reference)?;
                let mean = stats::weighted_average(&ref_env, &reference.weights)
                    .ok_or(EvaluationError::DegenerateWeights)?;
                let focality = if mean == 0.0 { 0.0 } else { ti_mean_roi / mean };
                (Some(mean), Some(focality))
            }
            _ => (None, None),
        };

        Ok(CandidateMetrics {
            ti_max_roi,
            ti_mean_roi: Some(ti_mean_roi),
            ti_percentile_roi,
            ti_mean_reference,
            focality,
            n_elements: self.roi.len(),
            currents: Some(candidate.currents),
        })
    }

    /// Envelope at every element of the leadfield.
    pub fn full_envelope(&self, candidate: &MontageCandidate) -> Result<Vec<f64>, EvaluationError> {
        let columns = self.columns(candidate)?;
        Ok((0..self.leadfield.n_elements())
            .map(|e| columns.envelope_at(e))
            .collect())
    }

    fn columns(&self, candidate: &MontageCandidate) -> Result<ChannelColumns<'a>, EvaluationError> {
        let lookup = |name: &str| {
            self.leadfield
                .column(name)
                .ok_or_else(|| EvaluationError::UnknownElectrode(name.to_string()))
        };
        Ok(ChannelColumns {
            plus1: lookup(candidate.e1_plus.as_str())?,
            minus1: lookup(candidate.e1_minus.as_str())?,
            plus2: lookup(candidate.e2_plus.as_str())?,
            minus2: lookup(candidate.e2_minus.as_str())?,
            i1: candidate.currents.ch1,
            i2: candidate.currents.ch2,
        })
    }

    fn region_envelope(
        &self,
        columns: &ChannelColumns<'_>,
        region: &RegionSelection,
    ) -> Result<Vec<f64>, EvaluationError> {
        let n_elements = self.leadfield.n_elements();
        region
            .indices
            .iter()
            .map(|&index| {
                if index >= n_elements {
                    return Err(EvaluationError::ElementOutOfRange { index, n_elements });
                }
                let value = columns.envelope_at(index);
                if !value.is_finite() {
                    return Err(EvaluationError::NonFinite(index));
                }
                Ok(value)
            })
            .collect()
    }
}

/// One-shot form of [`CandidateEvaluator::evaluate`].
pub fn evaluate(
    candidate: &MontageCandidate,
    leadfield: &LeadfieldStore,
    roi: &RegionSelection,
    reference: Option<&RegionSelection>,
) -> Result<CandidateMetrics, EvaluationError> {
    CandidateEvaluator::new(leadfield, roi, reference).evaluate(candidate)
}
