use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Minimum chunk-count gap between the most- and least-loaded eligible shard
/// that justifies a load-driven move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImbalanceThreshold {
    Fixed(u32),
    /// Scales with how many chunks the most-loaded shard holds, so small
    /// namespaces are kept tightly balanced and large ones are not churned
    /// over a handful of chunks.
    #[default]
    Adaptive,
}

impl ImbalanceThreshold {
    pub fn resolve(&self, max_donor_chunks: usize, balanced_last_round: bool) -> u32 {
        match self {
            ImbalanceThreshold::Fixed(n) => *n,
            ImbalanceThreshold::Adaptive => {
                if balanced_last_round || max_donor_chunks < 20 {
                    2
                } else if max_donor_chunks < 80 {
                    4
                } else {
                    8
                }
            }
        }
    }
}

impl FromStr for ImbalanceThreshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("adaptive") {
            return Ok(ImbalanceThreshold::Adaptive);
        }
        s.parse::<u32>()
            .map(ImbalanceThreshold::Fixed)
            .map_err(|_| Error::InvalidThreshold(s.to_string()))
    }
}

impl fmt::Display for ImbalanceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImbalanceThreshold::Fixed(n) => write!(f, "{n}"),
            ImbalanceThreshold::Adaptive => f.write_str("adaptive"),
        }
    }
}
