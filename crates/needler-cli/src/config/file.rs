use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileModelConfig {
    pub targets_per_cycle: Option<usize>,
    pub peptides_per_protein: Option<usize>,
    pub rt_width: Option<u32>,
    pub cardinality_slack: Option<usize>,
    pub dedup_slots: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSearchConfig {
    /// Seconds; zero or negative means unlimited.
    pub timeout: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOrderingConfig {
    pub shuffle: Option<bool>,
    pub group_by_size: Option<bool>,
    pub seed: Option<u64>,
}

/// Mirror of the TOML configuration file. Every field is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<FileModelConfig>,
    pub search: Option<FileSearchConfig>,
    pub ordering: Option<FileOrderingConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_is_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("needler.toml");
        fs::write(
            &path,
            r#"
            [model]
            targets-per-cycle = 25
            peptides-per-protein = 3
            rt-width = 60
            cardinality-slack = 100
            dedup-slots = false

            [search]
            timeout = 3600

            [ordering]
            shuffle = true
            group-by-size = true
            seed = 7
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let model = config.model.unwrap();
        assert_eq!(model.targets_per_cycle, Some(25));
        assert_eq!(model.peptides_per_protein, Some(3));
        assert_eq!(model.rt_width, Some(60));
        assert_eq!(model.cardinality_slack, Some(100));
        assert_eq!(model.dedup_slots, Some(false));
        assert_eq!(config.search.unwrap().timeout, Some(3600));
        let ordering = config.ordering.unwrap();
        assert_eq!(ordering.shuffle, Some(true));
        assert_eq!(ordering.group_by_size, Some(true));
        assert_eq!(ordering.seed, Some(7));
    }

    #[test]
    fn empty_file_gives_empty_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "").unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert!(config.model.is_none());
        assert!(config.search.is_none());
        assert!(config.ordering.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        fs::write(&path, "[model]\ntargets-per-cylce = 3\n").unwrap();

        let err = FileConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = FileConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
