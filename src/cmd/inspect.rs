use crate::console;
use clap::Args;
use tiforge::config::{is_valid_electrode_name, RawConfig};
use tiforge::currents::CurrentPair;
use tiforge::error::{ConfigError, TiResult};
use tiforge::evaluator::{CandidateEvaluator, EvaluationOptions};
use tiforge::leadfield::LeadfieldStore;
use tiforge::montage::MontageCandidate;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub config: RawConfig,

    /// Four electrodes: e1+,e1-,e2+,e2-
    #[arg(long)]
    pub montage: String,

    /// Channel currents in mA: i1,i2
    #[arg(long)]
    pub currents: String,
}

fn parse_montage(s: &str) -> Result<[String; 4], ConfigError> {
    let names: Vec<&str> = s.split(',').map(str::trim).collect();
    if let Some(bad) = names.iter().find(|n| !is_valid_electrode_name(n)) {
        return Err(ConfigError::InvalidElectrode(bad.to_string()));
    }
    match names.as_slice() {
        [a, b, c, d] => Ok([a.to_string(), b.to_string(), c.to_string(), d.to_string()]),
        _ => Err(ConfigError::InvalidValue {
            field: "montage",
            value: s.to_string(),
        }),
    }
}

fn parse_currents(s: &str) -> Result<CurrentPair, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        field: "currents",
        value: s.to_string(),
    };
    let values: Vec<f64> = s
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;
    match values.as_slice() {
        [i1, i2] if *i1 > 0.0 && *i2 > 0.0 => Ok(CurrentPair::new(*i1, *i2)),
        _ => Err(invalid()),
    }
}

pub fn run(args: InspectArgs, config: RawConfig) -> TiResult<()> {
    let [e1_plus, e1_minus, e2_plus, e2_minus] = parse_montage(&args.montage)?;
    let currents = parse_currents(&args.currents)?;
    let candidate = MontageCandidate::new(&e1_plus, &e1_minus, &e2_plus, &e2_minus, currents);

    let roi_spec = config.roi_spec()?;
    let reference_tags = config.reference_tag_set()?;
    let options = EvaluationOptions {
        percentile: config.percentile()?,
    };

    info!(
        "📂 Loading leadfield: {}",
        config.leadfield_path()?.display()
    );
    let leadfield = LeadfieldStore::load(config.leadfield_path()?)?;
    let roi = leadfield.select_sphere(&roi_spec);
    let reference = leadfield.select_tags(&reference_tags);

    info!("🔎 Inspecting {}", candidate.signature());
    let metrics = CandidateEvaluator::new(&leadfield, &roi, Some(&reference))
        .with_options(options)
        .evaluate(&candidate)?;

    console::print_metrics(&candidate, &metrics);
    Ok(())
}
