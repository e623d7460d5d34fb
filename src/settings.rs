use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::factory::FactoryOptions;
use crate::timeaxis::TimeAxisDefinition;

pub const ENV_PREFIX: &str = "TIMECOURSE";

/// Everything the command line tool reads from its config file and environment.
///
/// ```toml
/// log_filter = "timecourse=debug"
///
/// [factory]
/// legacy_maps_allowed = true
/// serial_number_required = false
///
/// [time_axis]
/// units = "hpf"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub factory: FactoryOptions,
    pub time_axis: TimeAxisDefinition,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            factory: FactoryOptions::default(),
            time_axis: TimeAxisDefinition::default(),
            log_filter: String::from("info"),
        }
    }
}

impl Settings {
    /// Merges the optional file with `TIMECOURSE__*` variables, the latter
    /// winning (`TIMECOURSE__FACTORY__LEGACY_GRAMMAR=true`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
