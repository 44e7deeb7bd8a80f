use crate::error::ReportError;
use crate::evaluator::CandidateMetrics;
use crate::montage::MontageCandidate;
use crate::search::ResultsCollection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One line of the tabular summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Montage")]
    pub montage: String,
    #[serde(rename = "Current_Ch1_mA")]
    pub current_ch1: Option<f64>,
    #[serde(rename = "Current_Ch2_mA")]
    pub current_ch2: Option<f64>,
    #[serde(rename = "TImax_ROI")]
    pub ti_max_roi: Option<f64>,
    #[serde(rename = "TImean_ROI")]
    pub ti_mean_roi: Option<f64>,
    #[serde(rename = "TIpct_ROI")]
    pub ti_percentile_roi: Option<f64>,
    #[serde(rename = "TImean_Reference")]
    pub ti_mean_reference: Option<f64>,
    #[serde(rename = "Focality")]
    pub focality: Option<f64>,
    #[serde(rename = "Composite_Index")]
    pub composite_index: Option<f64>,
    #[serde(rename = "n_elements")]
    pub n_elements: usize,
}

impl ResultRow {
    pub fn from_metrics(signature: &str, metrics: &CandidateMetrics) -> Self {
        let currents = metrics
            .currents
            .or_else(|| MontageCandidate::parse_signature(signature).map(|c| c.currents));
        Self {
            montage: signature.to_string(),
            current_ch1: currents.map(|c| c.ch1),
            current_ch2: currents.map(|c| c.ch2),
            ti_max_roi: metrics.ti_max_roi,
            ti_mean_roi: metrics.ti_mean_roi,
            ti_percentile_roi: metrics.ti_percentile_roi,
            ti_mean_reference: metrics.ti_mean_reference,
            focality: metrics.focality,
            composite_index: metrics.composite_index(),
            n_elements: metrics.n_elements,
        }
    }
}

/// Composite index descending, missing values last, ties by montage name.
pub fn rank_order(a: &ResultRow, b: &ResultRow) -> Ordering {
    match (a.composite_index, b.composite_index) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.montage.cmp(&b.montage))
}

pub fn build_rows(results: &ResultsCollection) -> Vec<ResultRow> {
    let mut rows: Vec<ResultRow> = results
        .iter()
        .map(|(sig, m)| ResultRow::from_metrics(sig, m))
        .collect();
    rows.sort_by(rank_order);
    rows
}

/// The best `n` rows. Sorts explicitly rather than trusting input order.
pub fn top_n(rows: &[ResultRow], n: usize) -> Vec<ResultRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(rank_order);
    ranked.truncate(n);
    ranked
}

pub fn write_table<P: AsRef<Path>>(path: P, rows: &[ResultRow]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<ResultRow>, ReportError> {
    let mut rdr = csv::Reader::from_reader(BufReader::new(File::open(path)?));
    let rows = rdr.deserialize().collect::<Result<Vec<ResultRow>, _>>()?;
    Ok(rows)
}

pub fn write_results_json<P: AsRef<Path>>(
    path: P,
    results: &ResultsCollection,
) -> Result<(), ReportError> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

pub fn read_results_json<P: AsRef<Path>>(path: P) -> Result<ResultsCollection, ReportError> {
    let file = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(file)?)
}
