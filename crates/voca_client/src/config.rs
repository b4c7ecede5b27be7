//! Connection settings read from the environment.

use crate::{database::RestDatabase, mnemonic::GeminiGenerator};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub anon_key: String,
    /// Bypasses row level security, only needed by the upload scripts.
    pub service_role_key: Option<String>,
    pub vertex_api_key: Option<String>,
}

impl Config {
    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_SERVICE_ROLE_KEY` and `VERTEX_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let config = Self {
            supabase_url: var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
            anon_key: var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            service_role_key: var("SUPABASE_SERVICE_ROLE_KEY"),
            vertex_api_key: var("VERTEX_API_KEY"),
        };
        tracing::info!("Using database at {}", config.supabase_url);
        Ok(config)
    }

    /// A database client using the public key.
    pub fn database(&self) -> RestDatabase {
        RestDatabase::new(&self.supabase_url, &self.anon_key)
    }

    /// A database client using the service role key, falling back to the public key.
    pub fn admin_database(&self) -> RestDatabase {
        match &self.service_role_key {
            Some(key) => RestDatabase::new(&self.supabase_url, key),
            None => {
                tracing::warn!("SUPABASE_SERVICE_ROLE_KEY is not set, using the public key");
                self.database()
            }
        }
    }

    pub fn mnemonic_generator(&self) -> Result<GeminiGenerator, ConfigError> {
        let key = self
            .vertex_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("VERTEX_API_KEY"))?;
        Ok(GeminiGenerator::new(key))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn reads_required_and_optional_keys() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("VERTEX_API_KEY", ""),
        ]))
        .unwrap();
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.service_role_key, None);
        assert_eq!(config.vertex_api_key, None);
        assert!(config.mnemonic_generator().is_err());
    }

    #[test]
    fn missing_url() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing SUPABASE_URL");
    }
}
