//! Environment snapshot used to resolve `env:` references.
//!
//! The resolver never reads process state directly; callers capture an
//! [`Environment`] once at startup and pass it in.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::{Error, Result};

/// Immutable set of environment variables.
#[derive(Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("keys", &self.vars.len())
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Build an environment from explicit key-value pairs.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Merge variables from a dotenv file.
    ///
    /// Variables already present win over the file, matching `dotenvy`'s
    /// non-overriding behaviour. The process environment is not modified.
    pub fn with_env_file(mut self, path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path).map_err(|source| Error::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut added = 0usize;
        for item in iter {
            let (key, value) = item.map_err(|source| Error::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            if !self.vars.contains_key(&key) {
                self.vars.insert(key, value);
                added += 1;
            }
        }

        debug!(path = %path.display(), added, "Loaded env file");
        Ok(self)
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
