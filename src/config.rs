//! Runtime settings of a [`Project`](crate::project::Project).

use serde::{Deserialize, Serialize};

/// What to do when a class fails to decompile during export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompileErrorStrategy {
    /// Abort the export with the error.
    #[default]
    Propagate,
    /// Leave the class out of the export.
    Ignore,
    /// Export the error message in place of the source.
    TraceAsSource,
}

/// Settings controlling renaming and export.
///
/// # Examples
///
/// ```
/// use jvm_remap::config::{DecompileErrorStrategy, ProjectConfig};
///
/// let config = ProjectConfig::from_json(r#"{"map_locals": true, "decompile_error_strategy": "ignore"}"#).unwrap();
/// assert!(config.map_locals);
/// assert_eq!(config.obfuscated_method_prefix, "m_");
/// assert_eq!(config.decompile_error_strategy, DecompileErrorStrategy::Ignore);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Whether local variables other than parameters may be renamed.
    pub map_locals: bool,
    /// Methods whose names do not start with this prefix keep their names.
    /// An empty prefix makes every method renamable.
    pub obfuscated_method_prefix: String,
    /// How export handles decompiler failures.
    pub decompile_error_strategy: DecompileErrorStrategy,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            map_locals: false,
            obfuscated_method_prefix: "m_".to_owned(),
            decompile_error_strategy: DecompileErrorStrategy::default(),
        }
    }
}

impl ProjectConfig {
    /// Reads settings from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ProjectConfig::from_json("{}").unwrap(), ProjectConfig::default());
        assert!(ProjectConfig::from_json(r#"{"decompile_error_strategy": "explode"}"#).is_err());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            serde_json::to_string(&DecompileErrorStrategy::TraceAsSource).unwrap(),
            r#""trace_as_source""#
        );
    }
}
