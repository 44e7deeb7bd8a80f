use crate::config::{EnumerationPolicy, SearchConfig};
use crate::currents::{format_current_to, CurrentPair, SIGNATURE_DECIMALS};
use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// Four electrodes in channel-role order plus a current split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MontageCandidate {
    pub e1_plus: String,
    pub e1_minus: String,
    pub e2_plus: String,
    pub e2_minus: String,
    pub currents: CurrentPair,
}

impl MontageCandidate {
    pub fn new(
        e1_plus: &str,
        e1_minus: &str,
        e2_plus: &str,
        e2_minus: &str,
        currents: CurrentPair,
    ) -> Self {
        Self {
            e1_plus: e1_plus.to_string(),
            e1_minus: e1_minus.to_string(),
            e2_plus: e2_plus.to_string(),
            e2_minus: e2_minus.to_string(),
            currents,
        }
    }

    pub fn electrodes(&self) -> [&str; 4] {
        [&self.e1_plus, &self.e1_minus, &self.e2_plus, &self.e2_minus]
    }

    pub fn has_distinct_electrodes(&self) -> bool {
        let e = self.electrodes();
        (0..4).all(|i| (i + 1..4).all(|j| e[i] != e[j]))
    }

    /// Display key, e.g. `E1_E2_and_E3_E4_I1-1.2mA_I2-0.8mA`.
    pub fn signature(&self) -> String {
        self.signature_with_decimals(SIGNATURE_DECIMALS)
    }

    /// Signature with currents printed to at most `decimals` places.
    /// Searches pass [`CurrentRatios::decimals`](crate::currents::CurrentRatios) so
    /// fine current steps keep distinct keys.
    pub fn signature_with_decimals(&self, decimals: usize) -> String {
        format!(
            "{}_{}_and_{}_{}_I1-{}mA_I2-{}mA",
            self.e1_plus,
            self.e1_minus,
            self.e2_plus,
            self.e2_minus,
            format_current_to(self.currents.ch1, decimals),
            format_current_to(self.currents.ch2, decimals)
        )
    }

    pub fn parse_signature(signature: &str) -> Option<Self> {
        let (first, rest) = signature.split_once("_and_")?;
        let (e1_plus, e1_minus) = first.split_once('_')?;
        let parts: Vec<&str> = rest.split('_').collect();
        let [e2_plus, e2_minus, i1, i2] = parts.as_slice() else {
            return None;
        };
        let current = |s: &str, prefix: &str| -> Option<f64> {
            s.strip_prefix(prefix)?.strip_suffix("mA")?.parse().ok()
        };
        Some(Self::new(
            e1_plus,
            e1_minus,
            e2_plus,
            e2_minus,
            CurrentPair::new(current(*i1, "I1-")?, current(*i2, "I2-")?),
        ))
    }
}

/// Lazy, restartable generator of every candidate of a search.
#[derive(Debug, Clone)]
pub struct MontageEnumerator {
    policy: EnumerationPolicy,
    plus1: Vec<String>,
    minus1: Vec<String>,
    plus2: Vec<String>,
    minus2: Vec<String>,
    ratios: Vec<CurrentPair>,
}

pub struct MontageIter<'a> {
    inner: Box<dyn Iterator<Item = MontageCandidate> + Send + 'a>,
}

impl Iterator for MontageIter<'_> {
    type Item = MontageCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl MontageEnumerator {
    pub fn new(config: &SearchConfig, ratios: &[CurrentPair]) -> Self {
        match config.policy {
            EnumerationPolicy::Bucketed => Self::bucketed(
                &config.pools.plus1,
                &config.pools.minus1,
                &config.pools.plus2,
                &config.pools.minus2,
                ratios,
            ),
            EnumerationPolicy::AllDistinct => Self::all_distinct(config.shared_pool(), ratios),
        }
    }

    pub fn bucketed(
        plus1: &[String],
        minus1: &[String],
        plus2: &[String],
        minus2: &[String],
        ratios: &[CurrentPair],
    ) -> Self {
        Self {
            policy: EnumerationPolicy::Bucketed,
            plus1: plus1.to_vec(),
            minus1: minus1.to_vec(),
            plus2: plus2.to_vec(),
            minus2: minus2.to_vec(),
            ratios: ratios.to_vec(),
        }
    }

    pub fn all_distinct(pool: &[String], ratios: &[CurrentPair]) -> Self {
        let pool = dedup_preserving_order(pool);
        Self {
            policy: EnumerationPolicy::AllDistinct,
            plus1: pool.clone(),
            minus1: pool.clone(),
            plus2: pool.clone(),
            minus2: pool,
            ratios: ratios.to_vec(),
        }
    }

    pub fn policy(&self) -> EnumerationPolicy {
        self.policy
    }

    pub fn ratio_count(&self) -> usize {
        self.ratios.len()
    }

    /// Number of candidates `iter()` yields.
    pub fn count(&self) -> usize {
        let quads = match self.policy {
            EnumerationPolicy::Bucketed => self
                .plus1
                .len()
                .saturating_mul(self.minus1.len())
                .saturating_mul(self.plus2.len())
                .saturating_mul(self.minus2.len()),
            EnumerationPolicy::AllDistinct => {
                let n = self.plus1.len();
                if n < 4 {
                    0
                } else {
                    n.saturating_mul(n - 1)
                        .saturating_mul(n - 2)
                        .saturating_mul(n - 3)
                }
            }
        };
        quads.saturating_mul(self.ratios.len())
    }

    /// Candidates in deterministic order: `plus1` slowest, then `minus1`, `plus2`,
    /// `minus2`, with current ratios innermost.
    pub fn iter(&self) -> MontageIter<'_> {
        let product = iproduct!(
            self.plus1.iter(),
            self.minus1.iter(),
            self.plus2.iter(),
            self.minus2.iter(),
            self.ratios.iter()
        )
        .map(|(a, b, c, d, &r)| MontageCandidate::new(a, b, c, d, r));

        let inner: Box<dyn Iterator<Item = MontageCandidate> + Send + '_> = match self.policy {
            EnumerationPolicy::Bucketed => Box::new(product),
            EnumerationPolicy::AllDistinct => {
                Box::new(product.filter(MontageCandidate::has_distinct_electrodes))
            }
        };
        MontageIter { inner }
    }
}

fn dedup_preserving_order(pool: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(pool.len());
    for name in pool {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}
