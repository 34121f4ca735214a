//! Scoped environment-variable overrides.
//!
//! Object storage clients read their endpoint and credentials from the
//! process environment. Writing to an alternate endpoint means swapping those
//! variables for the duration of one pipeline run and putting the previous
//! values back afterwards, whether the run succeeded or not.

use std::env;
use std::ffi::OsString;

use tracing::debug;

/// Alternate endpoint variables and the standard names they map onto.
pub const ALTERNATE_STORAGE_VARS: [(&str, &str); 3] = [
    ("SOURCECOOP_AWS_ENDPOINT_URL", "AWS_ENDPOINT_URL"),
    ("SOURCECOOP_AWS_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"),
    ("SOURCECOOP_AWS_SECRET_ACCESS_KEY", "AWS_SECRET_ACCESS_KEY"),
];

/// Guard holding the values that were replaced. Dropping it restores them,
/// removing variables that did not exist before.
#[must_use = "the override is undone as soon as the scope is dropped"]
pub struct EnvScope {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvScope {
    /// Apply `overrides` and remember what they replaced.
    pub fn apply<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OsString>,
    {
        let mut saved = Vec::new();
        for (key, value) in overrides {
            let key = key.into();
            saved.push((key.clone(), env::var_os(&key)));
            env::set_var(&key, value.into());
        }

        if !saved.is_empty() {
            debug!(
                keys = ?saved.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                "Applied environment override"
            );
        }

        Self { saved }
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        // Reverse order so a key overridden twice ends at its original value.
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(v) => env::set_var(&key, v),
                None => env::remove_var(&key),
            }
        }
    }
}

/// Overrides for the alternate storage endpoint, if all of its variables
/// are configured. Partial configuration yields no override.
pub fn alternate_storage_overrides() -> Vec<(String, String)> {
    alternate_storage_overrides_from(|key| env::var(key).ok())
}

/// Same as [`alternate_storage_overrides`], reading from `lookup`.
pub fn alternate_storage_overrides_from<F>(lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let values: Option<Vec<(String, String)>> = ALTERNATE_STORAGE_VARS
        .iter()
        .map(|(source, target)| lookup(source).map(|v| (target.to_string(), v)))
        .collect();
    values.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_scope_restores_previous_value() {
        env::set_var("SST_ENV_TEST_RESTORE", "before");
        {
            let _scope = EnvScope::apply([("SST_ENV_TEST_RESTORE", "during")]);
            assert_eq!(env::var("SST_ENV_TEST_RESTORE").unwrap(), "during");
        }
        assert_eq!(env::var("SST_ENV_TEST_RESTORE").unwrap(), "before");
        env::remove_var("SST_ENV_TEST_RESTORE");
    }

    #[test]
    fn test_scope_removes_new_variable() {
        env::remove_var("SST_ENV_TEST_NEW");
        {
            let _scope = EnvScope::apply([("SST_ENV_TEST_NEW", "value")]);
            assert!(env::var("SST_ENV_TEST_NEW").is_ok());
        }
        assert!(env::var_os("SST_ENV_TEST_NEW").is_none());
    }

    #[test]
    fn test_scope_restores_on_error_path() {
        fn failing() -> Result<(), String> {
            let _scope = EnvScope::apply([("SST_ENV_TEST_FAIL", "during")]);
            Err("pipeline failed".to_string())
        }

        env::remove_var("SST_ENV_TEST_FAIL");
        assert!(failing().is_err());
        assert!(env::var_os("SST_ENV_TEST_FAIL").is_none());
    }

    #[test]
    fn test_alternate_overrides_need_all_three() {
        let mut vars = HashMap::new();
        vars.insert("SOURCECOOP_AWS_ENDPOINT_URL", "https://data.source.coop");
        vars.insert("SOURCECOOP_AWS_ACCESS_KEY_ID", "key");
        let partial = alternate_storage_overrides_from(|k| vars.get(k).map(|v| v.to_string()));
        assert!(partial.is_empty());

        vars.insert("SOURCECOOP_AWS_SECRET_ACCESS_KEY", "secret");
        let full = alternate_storage_overrides_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(full.len(), 3);
        assert!(full.contains(&("AWS_ENDPOINT_URL".to_string(), "https://data.source.coop".to_string())));
    }
}
