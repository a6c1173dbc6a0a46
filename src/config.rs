// Policy configuration for pvreplace
//
// A YAML file can carry several fuzzing configurations, each resolved into
// one or more MutationPolicy values before any input is read:
//
//   version: 1
//   configurations:
//     - fuzzing-part: param-value
//       fuzzing-type: replace
//       fuzzing-mode: multiple
//     - fuzzing-part: all
//       fuzzing-type: postfix
//       fuzzing-mode: single
//       ignore: true

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CombineMode, MutationPolicy, OccurrenceMode, PartSelector};

pub const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Root of the YAML config file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub configurations: Vec<FuzzingConfig>,
}

/// One entry of the config file, still in its textual form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FuzzingConfig {
    pub fuzzing_part: String,
    pub fuzzing_type: String,
    pub fuzzing_mode: String,
    #[serde(default)]
    pub ignore: bool,
}

impl FuzzingConfig {
    /// Resolve into policies; `all` expands to one policy per URL part.
    pub fn policies(&self) -> Result<Vec<MutationPolicy>> {
        resolve_policies(&self.fuzzing_part, &self.fuzzing_type, &self.fuzzing_mode)
    }
}

/// Turn textual part/type/mode values into policies.
pub fn resolve_policies(part: &str, combine: &str, occurrence: &str) -> Result<Vec<MutationPolicy>> {
    let selector: PartSelector = part.parse()?;
    if selector == PartSelector::Headers {
        warn!("fuzzing-part headers is deprecated for URLs and is skipped; use --raw");
    }
    let combine: CombineMode = combine.parse()?;
    let occurrence: OccurrenceMode = occurrence.parse()?;
    Ok(selector
        .parts()
        .into_iter()
        .map(|part| MutationPolicy::new(part, combine, occurrence))
        .collect())
}

impl Config {
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.version != CONFIG_VERSION {
            return Err(Error::UnsupportedConfigVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// Policies of every non-ignored configuration, in file order.
    pub fn active_policies(&self) -> Result<Vec<MutationPolicy>> {
        let mut policies = Vec::new();
        for cfg in self.configurations.iter().filter(|c| !c.ignore) {
            policies.extend(cfg.policies()?);
        }
        Ok(policies)
    }
}

/// Load a config file and resolve its active policies.
pub fn load_policies(path: &Path) -> Result<Vec<MutationPolicy>> {
    let yaml = fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let policies = Config::from_yaml(&yaml, path)?.active_policies()?;
    if policies.is_empty() {
        return Err(Error::EmptyConfig {
            path: path.to_path_buf(),
        });
    }
    debug!("loaded {} policies from {}", policies.len(), path.display());
    Ok(policies)
}
