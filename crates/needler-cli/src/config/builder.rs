use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::OptimizeArgs;
use crate::error::{CliError, Result};
use needler::engine::config as core_config;
use std::str::FromStr;

/// Layers defaults, the optional config file, `--set` values and explicit flags, in that
/// order of increasing precedence.
pub fn build_config(args: &OptimizeArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let model_file = file_config.model.take().unwrap_or_default();
    let targets_per_cycle = args
        .targets_per_cycle
        .or(model_file.targets_per_cycle)
        .unwrap_or(defaults.targets_per_cycle);
    let peptides_per_protein = args
        .peptides_per_protein
        .or(model_file.peptides_per_protein)
        .unwrap_or(defaults.peptides_per_protein);
    let rt_width = args.rt_width.or(model_file.rt_width).ok_or_else(|| {
        CliError::Config(
            "A value for 'rt-width' is required either in the config file or via --rt-width."
                .to_string(),
        )
    })?;
    let cardinality_slack = args
        .cardinality_slack
        .or(model_file.cardinality_slack)
        .unwrap_or(defaults.cardinality_slack);
    let dedup_slots = if args.no_dedup_slots {
        false
    } else {
        model_file.dedup_slots.unwrap_or(defaults.dedup_slots)
    };

    let search_file = file_config.search.take().unwrap_or_default();
    let timeout_seconds = args
        .timeout
        .or(search_file.timeout)
        .unwrap_or(defaults.timeout_seconds);

    let ordering_file = file_config.ordering.take().unwrap_or_default();
    let shuffle = args.shuffle || ordering_file.shuffle.unwrap_or(defaults.shuffle);
    let group_by_size =
        args.group_by_size || ordering_file.group_by_size.unwrap_or(defaults.group_by_size);
    let seed = args.seed.or(ordering_file.seed);

    let core_config = core_config::TargetingConfigBuilder::new()
        .targets_per_cycle(targets_per_cycle)
        .peptides_per_protein(peptides_per_protein)
        .rt_width(rt_width)
        .cardinality_slack(cardinality_slack)
        .dedup_slots(dedup_slots)
        .timeout_seconds(timeout_seconds)
        .shuffle(shuffle)
        .group_by_size(group_by_size)
        .seed(seed)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        destination: args.destination.clone(),
        core_config,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "model.targets-per-cycle" => {
                config
                    .model
                    .get_or_insert_with(Default::default)
                    .targets_per_cycle = Some(parse_value(key, value_str, "integer")?);
            }
            "model.peptides-per-protein" => {
                config
                    .model
                    .get_or_insert_with(Default::default)
                    .peptides_per_protein = Some(parse_value(key, value_str, "integer")?);
            }
            "model.rt-width" => {
                config.model.get_or_insert_with(Default::default).rt_width =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "model.cardinality-slack" => {
                config
                    .model
                    .get_or_insert_with(Default::default)
                    .cardinality_slack = Some(parse_value(key, value_str, "integer")?);
            }
            "model.dedup-slots" => {
                config.model.get_or_insert_with(Default::default).dedup_slots =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "search.timeout" => {
                config.search.get_or_insert_with(Default::default).timeout =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "ordering.shuffle" => {
                config.ordering.get_or_insert_with(Default::default).shuffle =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "ordering.group-by-size" => {
                config
                    .ordering
                    .get_or_insert_with(Default::default)
                    .group_by_size = Some(parse_value(key, value_str, "boolean")?);
            }
            "ordering.seed" => {
                config.ordering.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
