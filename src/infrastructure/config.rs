use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::snapshot::BackendRef;

/// Prefix for environment overrides, e.g. `CLIENTDIFF__OUTPUT__DIR=/tmp/out`.
const ENV_PREFIX: &str = "CLIENTDIFF";

/// Config file looked up in the working directory when no path is given.
const LOCAL_CONFIG: &str = "clientdiff.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What kind of inventory a backend exposes.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Panel database file with an `inbounds` table.
    Sqlite,
    /// Inbound-list export (`{ "obj": [...] }` or a bare array).
    Json,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Json => "json",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Stamped as `serverId` on every entry from this backend.
    pub id: String,
    /// Display name; defaults to `id`.
    #[serde(default)]
    pub name: Option<String>,
    pub kind: BackendKind,
    pub path: PathBuf,
}

impl BackendConfig {
    pub fn backend_ref(&self) -> BackendRef {
        BackendRef {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            kind: self.kind.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

fn default_output_dir() -> String {
    "reports".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Load `path` (TOML) and layer `CLIENTDIFF__*` environment overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the config path when none was given on the command line:
    /// `./clientdiff.toml` if present, else `<config dir>/clientdiff/config.toml`.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|d| d.join("clientdiff").join("config.toml"))
            .unwrap_or(local)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for b in &self.backends {
            if b.id.trim().is_empty() {
                bail!("backend with path {} has an empty id", b.path.display());
            }
            if !seen.insert(b.id.as_str()) {
                bail!("duplicate backend id: {}", b.id);
            }
        }
        Ok(())
    }
}
