use super::config::TargetingConfig;
use super::progress::ProgressReporter;
use crate::core::models::catalog::Catalog;

/// Read-only inputs shared by the model-building and search tasks.
#[derive(Clone, Copy)]
pub struct OptimizationContext<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a TargetingConfig,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> OptimizationContext<'a> {
    pub fn new(
        catalog: &'a Catalog,
        config: &'a TargetingConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            catalog,
            config,
            reporter,
        }
    }
}
