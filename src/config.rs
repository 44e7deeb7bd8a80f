use crate::error::ConfigError;
use crate::leadfield::region::RoiSphere;
use clap::{parser::ValueSource, ArgMatches, Args};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

/// Tissue tag of grey matter in the head models the leadfields are built from.
pub const GREY_MATTER_TAG: i32 = 2;

static ELECTRODE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("static pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum EnumerationPolicy {
    /// Independent pool per channel role.
    Bucketed,
    /// One shared pool, four pairwise distinct electrodes.
    AllDistinct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ChannelRole {
    Plus1,
    Minus1,
    Plus2,
    Minus2,
}

/// Parameters as supplied from the command line or a JSON file.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    // === ELECTRODES ===
    #[arg(long, default_value = "")]
    pub plus1: String,
    #[arg(long, default_value = "")]
    pub minus1: String,
    #[arg(long, default_value = "")]
    pub plus2: String,
    #[arg(long, default_value = "")]
    pub minus2: String,

    // === CURRENTS (mA) ===
    #[arg(long, default_value_t = 2.0)]
    pub total_current: f64,
    #[arg(long, default_value_t = 0.1)]
    pub current_step: f64,
    #[arg(long)]
    pub channel_limit: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub all_combinations: bool,

    // === INPUTS ===
    #[arg(long)]
    pub leadfield: Option<PathBuf>,
    #[arg(long)]
    pub roi_file: Option<PathBuf>,
    /// Inline ROI centre as "x,y,z"; takes precedence over --roi-file.
    #[arg(long)]
    pub roi_center: Option<String>,
    #[arg(long, default_value_t = 3.0)]
    pub roi_radius: f64,
    #[arg(long, default_value = "2")]
    pub reference_tags: String,
    #[arg(long, default_value_t = 99.9)]
    pub roi_percentile: f64,

    // === EXECUTION ===
    #[arg(long, default_value = "tiforge_output")]
    pub output_dir: PathBuf,
    #[arg(long)]
    pub threads: Option<usize>,
    #[arg(long, default_value_t = 4096)]
    pub batch_size: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            plus1: String::new(),
            minus1: String::new(),
            plus2: String::new(),
            minus2: String::new(),
            total_current: 2.0,
            current_step: 0.1,
            channel_limit: None,
            all_combinations: false,
            leadfield: None,
            roi_file: None,
            roi_center: None,
            roi_radius: 3.0,
            reference_tags: GREY_MATTER_TAG.to_string(),
            roi_percentile: 99.9,
            output_dir: PathBuf::from("tiforge_output"),
            threads: None,
            batch_size: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectrodePools {
    pub plus1: Vec<String>,
    pub minus1: Vec<String>,
    pub plus2: Vec<String>,
    pub minus2: Vec<String>,
}

impl ElectrodePools {
    pub fn role(&self, role: ChannelRole) -> &[String] {
        match role {
            ChannelRole::Plus1 => &self.plus1,
            ChannelRole::Minus1 => &self.minus1,
            ChannelRole::Plus2 => &self.plus2,
            ChannelRole::Minus2 => &self.minus2,
        }
    }

    /// Every distinct electrode name across all four roles.
    pub fn all_names(&self) -> BTreeSet<&str> {
        ChannelRole::iter()
            .flat_map(|role| self.role(role))
            .map(String::as_str)
            .collect()
    }
}

/// Validated search parameters. Built once by [`RawConfig::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub pools: ElectrodePools,
    pub total_current: f64,
    pub current_step: f64,
    pub channel_limit: Option<f64>,
    pub policy: EnumerationPolicy,
}

impl SearchConfig {
    /// The pool shared by all roles under [`EnumerationPolicy::AllDistinct`].
    pub fn shared_pool(&self) -> &[String] {
        &self.pools.plus1
    }
}

impl RawConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))
    }

    pub fn policy(&self) -> EnumerationPolicy {
        if self.all_combinations {
            EnumerationPolicy::AllDistinct
        } else {
            EnumerationPolicy::Bucketed
        }
    }

    pub fn resolve(&self) -> Result<SearchConfig, ConfigError> {
        let plus1 = parse_pool(&self.plus1, ChannelRole::Plus1)?;
        let minus1 = parse_pool(&self.minus1, ChannelRole::Minus1)?;
        let plus2 = parse_pool(&self.plus2, ChannelRole::Plus2)?;
        let minus2 = parse_pool(&self.minus2, ChannelRole::Minus2)?;

        let total = self.total_current;
        if !total.is_finite() || total <= 0.0 {
            return Err(ConfigError::NonPositiveCurrent(total));
        }
        let step = self.current_step;
        if !step.is_finite() || step <= 0.0 || step > total {
            return Err(ConfigError::StepOutOfRange { step, total });
        }
        if let Some(limit) = self.channel_limit {
            if !limit.is_finite() || limit <= 0.0 || limit > total {
                return Err(ConfigError::LimitOutOfRange { limit, total });
            }
        }

        let policy = self.policy();
        let pools = match policy {
            EnumerationPolicy::Bucketed => ElectrodePools {
                plus1,
                minus1,
                plus2,
                minus2,
            },
            EnumerationPolicy::AllDistinct => {
                let reference: BTreeSet<&String> = plus1.iter().collect();
                let same = [&minus1, &plus2, &minus2]
                    .iter()
                    .all(|pool| pool.iter().collect::<BTreeSet<_>>() == reference);
                if !same {
                    warn!(
                        "⚠️  All-combinations mode expects one shared pool; the role pools differ. Using the plus1 pool ({} electrodes) for all four roles.",
                        plus1.len()
                    );
                }
                ElectrodePools {
                    minus1: plus1.clone(),
                    plus2: plus1.clone(),
                    minus2: plus1.clone(),
                    plus1,
                }
            }
        };

        Ok(SearchConfig {
            pools,
            total_current: total,
            current_step: step,
            channel_limit: self.channel_limit,
            policy,
        })
    }

    pub fn leadfield_path(&self) -> Result<&Path, ConfigError> {
        self.leadfield
            .as_deref()
            .ok_or(ConfigError::MissingField("leadfield"))
    }

    /// Resolves the ROI sphere from an inline centre or the first coordinate row of `roi_file`.
    pub fn roi_spec(&self) -> Result<RoiSphere, ConfigError> {
        let radius = self.roi_radius;
        if !radius.is_finite() || radius < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "roi_radius",
                value: radius.to_string(),
            });
        }

        let center = if let Some(inline) = &self.roi_center {
            parse_point(inline).ok_or_else(|| ConfigError::InvalidValue {
                field: "roi_center",
                value: inline.clone(),
            })?
        } else if let Some(path) = &self.roi_file {
            read_roi_csv(path)?
        } else {
            return Err(ConfigError::MissingField("roi_center or roi_file"));
        };

        Ok(RoiSphere { center, radius })
    }

    pub fn reference_tag_set(&self) -> Result<BTreeSet<i32>, ConfigError> {
        let tokens = split_tokens(&self.reference_tags);
        if tokens.is_empty() {
            return Ok(BTreeSet::from([GREY_MATTER_TAG]));
        }
        tokens
            .into_iter()
            .map(|t| {
                t.parse::<i32>().map_err(|_| ConfigError::InvalidValue {
                    field: "reference_tags",
                    value: t.to_string(),
                })
            })
            .collect()
    }

    pub fn percentile(&self) -> Result<f64, ConfigError> {
        let p = self.roi_percentile;
        if !p.is_finite() || !(0.0..=100.0).contains(&p) {
            return Err(ConfigError::InvalidValue {
                field: "roi_percentile",
                value: p.to_string(),
            });
        }
        Ok(p)
    }

    /// Overwrites fields that were given explicitly on the command line.
    pub fn merge_from_cli(&mut self, cli: &RawConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(plus1);
        update_if_present!(minus1);
        update_if_present!(plus2);
        update_if_present!(minus2);
        update_if_present!(total_current);
        update_if_present!(current_step);
        update_if_present!(channel_limit);
        update_if_present!(all_combinations);
        update_if_present!(leadfield);
        update_if_present!(roi_file);
        update_if_present!(roi_center);
        update_if_present!(roi_radius);
        update_if_present!(reference_tags);
        update_if_present!(roi_percentile);
        update_if_present!(output_dir);
        update_if_present!(threads);
        update_if_present!(batch_size);
    }
}

pub fn is_valid_electrode_name(name: &str) -> bool {
    ELECTRODE_NAME.is_match(name)
}

fn split_tokens(s: &str) -> Vec<&str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_pool(s: &str, role: ChannelRole) -> Result<Vec<String>, ConfigError> {
    let mut pool: Vec<String> = Vec::new();
    for token in split_tokens(s) {
        if !is_valid_electrode_name(token) {
            return Err(ConfigError::InvalidElectrode(token.to_string()));
        }
        if pool.iter().any(|e| e == token) {
            debug!("Dropping duplicate electrode '{}' from {} pool", token, role);
            continue;
        }
        pool.push(token.to_string());
    }
    if pool.is_empty() {
        return Err(ConfigError::EmptyPool(role.to_string()));
    }
    Ok(pool)
}

fn parse_point(s: &str) -> Option<[f64; 3]> {
    let values: Vec<f64> = split_tokens(s)
        .iter()
        .map(|t| t.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [x, y, z] if values.iter().all(|v| v.is_finite()) => Some([*x, *y, *z]),
        _ => None,
    }
}

fn read_roi_csv(path: &Path) -> Result<[f64; 3], ConfigError> {
    let roi_err = |reason: String| ConfigError::RoiFile {
        path: path.to_path_buf(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| roi_err(e.to_string()))?;

    for record in rdr.records() {
        let record = record.map_err(|e| roi_err(e.to_string()))?;
        let coords: Vec<f64> = record
            .iter()
            .take(3)
            .filter_map(|f| f.parse::<f64>().ok())
            .collect();
        // Rows that do not parse as three numbers are headers.
        if let [x, y, z] = coords.as_slice() {
            return Ok([*x, *y, *z]);
        }
    }

    Err(roi_err("no x,y,z coordinate row found".to_string()))
}
