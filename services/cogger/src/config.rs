//! Settings for queue-triggered runs, read from the environment.

use std::env;

use sst_common::product::JPL_SENTINEL;

pub const DEFAULT_OUTPUT_LOCATION: &str = "s3://files.auspatious.com/ghrsst/";

/// How each date from a queue event is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    pub output_location: String,
    pub input_location: String,
    pub overwrite: bool,
    pub cache_local: bool,
}

impl EventConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            output_location: lookup("OUTPUT_LOCATION")
                .unwrap_or_else(|| DEFAULT_OUTPUT_LOCATION.to_string()),
            input_location: JPL_SENTINEL.to_string(),
            overwrite: flag(lookup("OVERWRITE")),
            cache_local: flag(lookup("CACHE_LOCAL")),
        }
    }
}

/// `true` in any case is on; anything else, including unset, is off.
fn flag(value: Option<String>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EventConfig::from_lookup(|_| None);
        assert_eq!(config.output_location, DEFAULT_OUTPUT_LOCATION);
        assert_eq!(config.input_location, "JPL");
        assert!(!config.overwrite);
        assert!(!config.cache_local);
    }

    #[test]
    fn test_flags_are_case_insensitive() {
        let vars: HashMap<&str, &str> = [
            ("OUTPUT_LOCATION", "/data/out"),
            ("OVERWRITE", "True"),
            ("CACHE_LOCAL", "yes"),
        ]
        .into_iter()
        .collect();
        let config = EventConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.output_location, "/data/out");
        assert!(config.overwrite);
        assert!(!config.cache_local);
    }
}
