use needler::engine::config::DEFAULT_CARDINALITY_SLACK;

/// Values used when neither the config file, `--set`, nor a flag provides one.
///
/// `rt_width` has no default and must always be supplied.
pub struct DefaultsConfig {
    pub targets_per_cycle: usize,
    pub peptides_per_protein: usize,
    pub cardinality_slack: usize,
    pub dedup_slots: bool,
    pub timeout_seconds: i64,
    pub shuffle: bool,
    pub group_by_size: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            targets_per_cycle: 10,
            peptides_per_protein: 2,
            cardinality_slack: DEFAULT_CARDINALITY_SLACK,
            dedup_slots: true,
            timeout_seconds: -1,
            shuffle: false,
            group_by_size: false,
        }
    }
}
