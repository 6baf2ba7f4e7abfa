use needler::engine::config as core_config;
use std::path::PathBuf;

pub struct AppConfig {
    pub input_path: PathBuf,
    pub destination: PathBuf,
    pub core_config: core_config::TargetingConfig,
}
