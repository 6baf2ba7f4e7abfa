use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CARDINALITY_SLACK: usize = 500;
/// Upper bound on the elution window half-width, in seconds (one day).
pub const MAX_RT_WIDTH: u32 = 86_400;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Parameters shaping the constraint model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Maximum number of selected peptides covering any second of the gradient.
    pub targets_per_cycle: usize,
    /// A protein counts as targeted when exactly this many of its peptides are selected.
    pub peptides_per_protein: usize,
    /// Half-width of every elution window, in seconds.
    pub rt_width: u32,
    /// Added to the computed global cardinality hint. Only affects solver performance.
    pub cardinality_slack: usize,
    /// Skip emitting a capacity constraint when a slot covers the same peptides as the
    /// previous slot.
    pub dedup_slots: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Wall-clock budget for the whole search. `None` means unlimited.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderingConfig {
    pub shuffle: bool,
    pub group_by_size: bool,
    /// Seed for every randomized choice. `None` draws one from the OS.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetingConfig {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub ordering: OrderingConfig,
}

#[derive(Default)]
pub struct TargetingConfigBuilder {
    targets_per_cycle: Option<usize>,
    peptides_per_protein: Option<usize>,
    rt_width: Option<u32>,
    cardinality_slack: Option<usize>,
    dedup_slots: Option<bool>,
    timeout: Option<Duration>,
    shuffle: Option<bool>,
    group_by_size: Option<bool>,
    seed: Option<u64>,
}

impl TargetingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets_per_cycle(mut self, n: usize) -> Self {
        self.targets_per_cycle = Some(n);
        self
    }
    pub fn peptides_per_protein(mut self, n: usize) -> Self {
        self.peptides_per_protein = Some(n);
        self
    }
    pub fn rt_width(mut self, seconds: u32) -> Self {
        self.rt_width = Some(seconds);
        self
    }
    pub fn cardinality_slack(mut self, slack: usize) -> Self {
        self.cardinality_slack = Some(slack);
        self
    }
    pub fn dedup_slots(mut self, enabled: bool) -> Self {
        self.dedup_slots = Some(enabled);
        self
    }
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
    /// Non-positive values mean no limit.
    pub fn timeout_seconds(self, seconds: i64) -> Self {
        let timeout = u64::try_from(seconds)
            .ok()
            .filter(|&s| s > 0)
            .map(Duration::from_secs);
        self.timeout(timeout)
    }
    pub fn shuffle(mut self, enabled: bool) -> Self {
        self.shuffle = Some(enabled);
        self
    }
    pub fn group_by_size(mut self, enabled: bool) -> Self {
        self.group_by_size = Some(enabled);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<TargetingConfig, ConfigError> {
        let peptides_per_protein = self
            .peptides_per_protein
            .ok_or(ConfigError::MissingParameter("peptides_per_protein"))?;
        if peptides_per_protein == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "peptides_per_protein",
                reason: "must be at least 1".to_string(),
            });
        }

        let rt_width = self
            .rt_width
            .ok_or(ConfigError::MissingParameter("rt_width"))?;
        if rt_width > MAX_RT_WIDTH {
            return Err(ConfigError::InvalidParameter {
                name: "rt_width",
                reason: format!("must not exceed {MAX_RT_WIDTH} seconds"),
            });
        }

        let model = ModelConfig {
            targets_per_cycle: self
                .targets_per_cycle
                .ok_or(ConfigError::MissingParameter("targets_per_cycle"))?,
            peptides_per_protein,
            rt_width,
            cardinality_slack: self
                .cardinality_slack
                .unwrap_or(DEFAULT_CARDINALITY_SLACK),
            dedup_slots: self.dedup_slots.unwrap_or(true),
        };
        Ok(TargetingConfig {
            model,
            search: SearchConfig {
                timeout: self.timeout,
            },
            ordering: OrderingConfig {
                shuffle: self.shuffle.unwrap_or(false),
                group_by_size: self.group_by_size.unwrap_or(false),
                seed: self.seed,
            },
        })
    }
}
