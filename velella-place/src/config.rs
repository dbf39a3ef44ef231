//! Runtime configuration for a placement run.

use velella_core::{Result, VelellaError};
use velella_phylo::Policy;
use velella_seq::SpacedPattern;

/// How a read is assigned to a tree edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentMode {
    /// Leaf with the most filtered spaced-word matches.
    BestCount,
    /// Leaf with the smallest Jukes-Cantor distance.
    BestDistance,
    /// LCA of the two leaves with the most matches.
    #[default]
    LcaCount,
    /// LCA of the two leaves with the smallest distances.
    LcaDistance,
    /// Best-count leaf if it dominates the runner-up, otherwise their LCA.
    LcaDominant,
}

/// All knobs of a placement run, with the stock defaults.
#[derive(Debug, Clone)]
pub struct PlaceConfig {
    /// Number of match positions per pattern (`W`), 2..=32.
    pub weight: usize,
    /// Number of don't-care positions per pattern (`S`), 2..=32.
    pub spaces: usize,
    /// The spaced-seed patterns, as `{0,1}` strings from the external
    /// generator. All must have shape (`weight`, `spaces`).
    pub patterns: Vec<String>,
    pub assignment_mode: AssignmentMode,
    /// Dominance divisor for [`AssignmentMode::LcaDominant`], >= 1.
    pub dominance_x: f64,
    /// The filtering threshold is `spaces * filtering_threshold_multiplicator`.
    pub filtering_threshold_multiplicator: i64,
    /// Enable min-hash word sampling.
    pub sampling: bool,
    /// With sampling, keep words whose CRC-32 is strictly below this.
    pub min_hash_lower_limit: u32,
    /// Queries per block, 1..=200000.
    pub read_block_size: usize,
    /// Distance reported for unmatched or saturated pairs.
    pub default_distance: f64,
    /// Pendant branch length for LCA and root placements.
    pub default_pendant: f64,
    /// Worker threads for the match stage, >= 1.
    pub threads: usize,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            weight: 12,
            spaces: 32,
            patterns: Vec::new(),
            assignment_mode: AssignmentMode::default(),
            dominance_x: 2.0,
            filtering_threshold_multiplicator: 0,
            sampling: false,
            min_hash_lower_limit: 10000,
            read_block_size: 1000,
            default_distance: 10.0,
            default_pendant: 0.001,
            threads: 1,
        }
    }
}

impl PlaceConfig {
    /// Check every knob against its allowed range and compile the patterns.
    pub fn compile_patterns(&self) -> Result<Vec<SpacedPattern>> {
        self.validate()?;
        self.patterns
            .iter()
            .map(|p| SpacedPattern::parse_with_shape(p, self.weight, self.spaces))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if !(2..=32).contains(&self.weight) {
            return Err(VelellaError::InvalidInput(format!(
                "weight must be in 2..=32, got {}",
                self.weight
            )));
        }
        if !(2..=32).contains(&self.spaces) {
            return Err(VelellaError::InvalidInput(format!(
                "spaces must be in 2..=32, got {}",
                self.spaces
            )));
        }
        if self.patterns.is_empty() {
            return Err(VelellaError::InvalidInput(
                "at least one pattern is required".into(),
            ));
        }
        if self.dominance_x < 1.0 {
            return Err(VelellaError::InvalidInput(format!(
                "dominance_x must be >= 1, got {}",
                self.dominance_x
            )));
        }
        if !(1..=200_000).contains(&self.read_block_size) {
            return Err(VelellaError::InvalidInput(format!(
                "read_block_size must be in 1..=200000, got {}",
                self.read_block_size
            )));
        }
        if self.threads == 0 {
            return Err(VelellaError::InvalidInput("threads must be >= 1".into()));
        }
        Ok(())
    }

    /// The score a match must strictly exceed to be accepted.
    pub fn filtering_threshold(&self) -> i64 {
        self.spaces as i64 * self.filtering_threshold_multiplicator
    }

    /// The policy value handed to the tree layer.
    pub fn policy(&self) -> Policy {
        match self.assignment_mode {
            AssignmentMode::BestCount => Policy::BestCount,
            AssignmentMode::BestDistance => Policy::BestDistance,
            AssignmentMode::LcaCount => Policy::LcaCount,
            AssignmentMode::LcaDistance => Policy::LcaDistance,
            AssignmentMode::LcaDominant => Policy::LcaDominant {
                x: self.dominance_x,
            },
        }
    }

    /// Min-hash limit for the indexer, if sampling is on.
    pub fn min_hash_limit(&self) -> Option<u32> {
        self.sampling.then_some(self.min_hash_lower_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PlaceConfig {
        PlaceConfig {
            weight: 2,
            spaces: 2,
            patterns: vec!["1001".to_string()],
            ..PlaceConfig::default()
        }
    }

    #[test]
    fn default_config_needs_patterns() {
        assert!(PlaceConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn ranges_enforced() {
        let mut cfg = valid();
        cfg.weight = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.spaces = 33;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.dominance_x = 0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.read_block_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.threads = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn pattern_shapes_checked() {
        let mut cfg = valid();
        cfg.patterns = vec!["1001".into(), "10001".into()]; // second has 3 spaces
        assert!(cfg.compile_patterns().is_err());

        cfg.patterns = vec!["1001".into(), "1010".into()];
        // malformed end
        assert!(cfg.compile_patterns().is_err());

        cfg.patterns = vec!["1001".into(), "1101".into()];
        // second has weight 3
        assert!(cfg.compile_patterns().is_err());

        cfg.patterns = vec!["1001".into()];
        assert_eq!(cfg.compile_patterns().unwrap().len(), 1);
    }

    #[test]
    fn threshold_is_spaces_times_multiplicator() {
        let mut cfg = valid();
        assert_eq!(cfg.filtering_threshold(), 0);
        cfg.filtering_threshold_multiplicator = 3;
        assert_eq!(cfg.filtering_threshold(), 6);
    }

    #[test]
    fn policy_mapping() {
        let mut cfg = valid();
        cfg.assignment_mode = AssignmentMode::LcaDominant;
        cfg.dominance_x = 4.0;
        assert_eq!(cfg.policy(), Policy::LcaDominant { x: 4.0 });
        cfg.assignment_mode = AssignmentMode::BestCount;
        assert_eq!(cfg.policy(), Policy::BestCount);
    }

    #[test]
    fn sampling_limit_only_when_enabled() {
        let mut cfg = valid();
        assert_eq!(cfg.min_hash_limit(), None);
        cfg.sampling = true;
        cfg.min_hash_lower_limit = 5000;
        assert_eq!(cfg.min_hash_limit(), Some(5000));
    }
}
