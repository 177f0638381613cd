//! Configuration types deserialized from `tessera.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// The top-level placer configuration parsed from `tessera.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlacerConfig {
    /// Run-wide placement options.
    #[serde(default)]
    pub placer: PlacerSection,
    /// Simulated annealing schedule for both placement levels.
    #[serde(default)]
    pub anneal: AnnealConfig,
    /// Local worker pool settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Remote detailed-placement endpoint.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// The `[placer]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlacerSection {
    /// Seed for every random draw of the run.
    pub seed: u64,
    /// Whether a register block may share a compute cell with a compute block.
    pub fold_registers: bool,
    /// Initial cluster count.
    pub clusters: ClusterCount,
}

impl Default for PlacerSection {
    fn default() -> Self {
        Self {
            seed: 0,
            fold_registers: true,
            clusters: ClusterCount::Auto,
        }
    }
}

/// Initial cluster count for the clustering retry loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClusterCount {
    /// `ceil(movable / 40) + 1`, capped at the movable block count.
    #[default]
    Auto,
    /// One cluster per kernel named in the design, or [`ClusterCount::Auto`]
    /// when the design names no kernels.
    Kernels,
    /// An explicit starting count; 0 goes straight to flat placement.
    Fixed(usize),
}

impl ClusterCount {
    /// Movable blocks per cluster assumed by [`ClusterCount::Auto`].
    pub const BLOCKS_PER_CLUSTER: usize = 40;

    /// Resolves the starting cluster count for `movable` blocks.
    ///
    /// `kernels` is the number of distinct kernels the design names; only
    /// [`ClusterCount::Kernels`] looks at it.
    pub fn resolve(self, movable: usize, kernels: usize) -> usize {
        let auto = movable.div_ceil(Self::BLOCKS_PER_CLUSTER) + 1;
        let k = match self {
            ClusterCount::Auto => auto,
            ClusterCount::Kernels if kernels == 0 => auto,
            ClusterCount::Kernels => kernels,
            ClusterCount::Fixed(k) => k,
        };
        k.min(movable)
    }
}

impl FromStr for ClusterCount {
    type Err = String;

    /// Parses `auto`, `kernels` or a non-negative integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(ClusterCount::Auto)
        } else if s.eq_ignore_ascii_case("kernels") {
            Ok(ClusterCount::Kernels)
        } else {
            s.parse::<usize>().map(ClusterCount::Fixed).map_err(|_| {
                format!("invalid cluster count '{s}': expected \"auto\", \"kernels\" or an integer")
            })
        }
    }
}

impl<'de> Deserialize<'de> for ClusterCount {
    /// Accepts the strings `"auto"` and `"kernels"` or a non-negative integer.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CountVisitor;

        impl<'de> Visitor<'de> for CountVisitor {
            type Value = ClusterCount;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("\"auto\", \"kernels\" or a cluster count")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v.parse() {
                    Ok(ClusterCount::Fixed(_)) | Err(_) => {
                        Err(E::invalid_value(de::Unexpected::Str(v), &self))
                    }
                    Ok(count) => Ok(count),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(ClusterCount::Fixed)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                usize::try_from(v)
                    .map(ClusterCount::Fixed)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }
        }

        deserializer.deserialize_any(CountVisitor)
    }
}

/// The `[anneal]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnnealConfig {
    /// Step budget of the coarse (cluster-level) anneal.
    pub coarse_steps: usize,
    /// Detailed anneal steps per member block.
    pub steps_per_block: usize,
    /// Lower bound on a detailed anneal's step budget.
    pub min_steps: usize,
    /// Geometric cooling factor applied every `moves_per_temperature` steps.
    pub cooling_rate: f64,
    /// Steps taken at each temperature.
    pub moves_per_temperature: usize,
    /// Step budget multiplier on the flat-fallback path.
    pub fallback_multiplier: usize,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            coarse_steps: 5_000,
            steps_per_block: 200,
            min_steps: 2_000,
            cooling_rate: 0.95,
            moves_per_temperature: 100,
            fallback_multiplier: 5,
        }
    }
}

/// The `[dispatch]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Worker pool size; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

/// The `[remote]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Endpoint URL; when set, detailed jobs are sent there instead of the local pool.
    pub url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transport fault.
    pub retries: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 300,
            retries: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_cluster_count() {
        assert_eq!(ClusterCount::Auto.resolve(0, 0), 0);
        assert_eq!(ClusterCount::Auto.resolve(1, 0), 1);
        assert_eq!(ClusterCount::Auto.resolve(40, 0), 2);
        assert_eq!(ClusterCount::Auto.resolve(41, 0), 3);
        assert_eq!(ClusterCount::Auto.resolve(400, 7), 11);
    }

    #[test]
    fn fixed_cluster_count_is_capped() {
        assert_eq!(ClusterCount::Fixed(8).resolve(100, 0), 8);
        assert_eq!(ClusterCount::Fixed(8).resolve(5, 0), 5);
    }

    #[test]
    fn kernel_cluster_count() {
        assert_eq!(ClusterCount::Kernels.resolve(100, 4), 4);
        assert_eq!(ClusterCount::Kernels.resolve(3, 4), 3);
        // No kernels named: same as auto.
        assert_eq!(ClusterCount::Kernels.resolve(100, 0), 4);
    }

    #[test]
    fn parse_cluster_count() {
        assert_eq!("auto".parse::<ClusterCount>(), Ok(ClusterCount::Auto));
        assert_eq!("Kernels".parse::<ClusterCount>(), Ok(ClusterCount::Kernels));
        assert_eq!("12".parse::<ClusterCount>(), Ok(ClusterCount::Fixed(12)));
        let err = "-1".parse::<ClusterCount>().unwrap_err();
        assert!(err.contains("kernels"));
    }

    #[test]
    fn defaults() {
        let config = PlacerConfig::default();
        assert!(config.placer.fold_registers);
        assert_eq!(config.anneal.fallback_multiplier, 5);
        assert_eq!(config.remote.timeout_secs, 300);
        assert_eq!(config.remote.retries, 2);
        assert!(config.remote.url.is_none());
    }
}
