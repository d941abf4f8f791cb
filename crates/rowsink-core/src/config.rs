//! Configuration loader, writer options and path expansion.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! The `[writer]` section holds the batching options of a partition writer and
//! the `[store]` section tells the binary where the target store lives.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::RoleMapping;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// `[writer]` section, validated. Missing keys take their defaults.
    pub fn writer_options(&self) -> anyhow::Result<WriterOptions> {
        let options: WriterOptions = self.get("writer")?;
        options.validate()?;
        Ok(options)
    }

    pub fn store_options(&self) -> anyhow::Result<StoreOptions> {
        let options: StoreOptions = self.get("store")?;
        if options.vector_dim == 0 {
            return Err(Error::InvalidConfig("store.vector_dim must be positive".into()).into());
        }
        Ok(options)
    }
}

/// Options of one partition writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterOptions {
    /// Target collection (class) name.
    pub class_name: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retries_backoff_secs")]
    pub retries_backoff_secs: u64,
    /// Field supplying the object id.
    #[serde(default)]
    pub id: Option<String>,
    /// Field supplying the object vector.
    #[serde(default)]
    pub vector: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
    /// Fail `commit` when objects were rejected or left unsubmitted.
    #[serde(default)]
    pub fail_on_incomplete: bool,
}

fn default_batch_size() -> usize { 100 }
fn default_max_retries() -> u32 { 2 }
fn default_retries_backoff_secs() -> u64 { 2 }

impl WriterOptions {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retries_backoff_secs: default_retries_backoff_secs(),
            id: None,
            vector: None,
            tenant: None,
            fail_on_incomplete: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.class_name.trim().is_empty() {
            return Err(Error::InvalidConfig("writer.class_name must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("writer.batch_size must be positive".into()));
        }
        if self.id.is_some() && self.id == self.vector {
            return Err(Error::InvalidConfig("writer.id and writer.vector must name different fields".into()));
        }
        Ok(())
    }

    pub fn roles(&self) -> RoleMapping {
        RoleMapping { id: self.id.clone(), vector: self.vector.clone() }
    }

    pub fn backoff(&self) -> Duration { Duration::from_secs(self.retries_backoff_secs) }
}

/// Location and shape of the target store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    pub uri: String,
    pub vector_dim: usize,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
