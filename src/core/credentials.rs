//! Provider API keys.

use super::quote::ProviderId;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Secrets per provider. A provider without a key is disabled.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, String>,
}

impl Credentials {
    /// Reads keys from the process environment, falling back to a dotenv file.
    ///
    /// Without an explicit path `.env` is searched for from the working directory up.
    /// A missing or unreadable file is ignored. The process environment is never modified.
    pub fn load(env_file: Option<&Path>) -> Self {
        Self::load_with(env_file, |name| std::env::var(name).ok())
    }

    /// Like [`Credentials::load`], with `lookup` standing in for the process environment.
    pub fn load_with<F>(env_file: Option<&Path>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_dotenv(env_file);
        Self::from_lookup(|name| lookup(name).or_else(|| file_vars.get(name).cloned()))
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys = ProviderId::ALL
            .into_iter()
            .filter_map(|id| {
                lookup(id.env_var())
                    .filter(|key| !key.trim().is_empty())
                    .map(|key| (id, key))
            })
            .collect();
        Self { keys }
    }

    pub fn with_key(mut self, id: ProviderId, key: impl Into<String>) -> Self {
        self.keys.insert(id, key.into());
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<&str> {
        self.keys.get(&id).map(String::as_str)
    }

    pub fn enabled(&self) -> Vec<ProviderId> {
        self.keys.keys().copied().collect()
    }
}

fn read_dotenv(env_file: Option<&Path>) -> HashMap<String, String> {
    let vars = match env_file {
        Some(path) => dotenvy::from_path_iter(path),
        None => dotenvy::from_filename_iter(".env"),
    }
    .and_then(|iter| iter.collect::<Result<HashMap<_, _>, _>>());

    match vars {
        Ok(vars) => {
            debug!(count = vars.len(), "Loaded dotenv file");
            vars
        }
        Err(e) => {
            debug!("No dotenv file loaded: {e}");
            HashMap::new()
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("enabled", &self.enabled())
            .finish()
    }
}
