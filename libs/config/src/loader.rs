//! Generic layered loader: base TOML file, optional `{environment}.toml`
//! overlay, then `LIVERMORE_`-prefixed environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

/// Load `T` by layering `base_path`, an optional `config/environments/
/// {environment}.toml` overlay, and `LIVERMORE_`-prefixed env vars
/// (`LIVERMORE_REDIS_URL` etc., double-underscore-separated for nesting).
///
/// If `base_path` does not exist, returns `T::default()` layered only with
/// environment variable overrides — service binaries are expected to run
/// with sane defaults out of the box (spec's ambient-stack configuration
/// requirement, not a hard external-file dependency).
pub fn load<T>(base_path: &Path, environment: Option<&str>) -> Result<T>
where
    T: DeserializeOwned + Default + serde::Serialize,
{
    let mut builder = Config::builder();

    if base_path.exists() {
        info!(path = %base_path.display(), "loading base config");
        builder = builder.add_source(File::from(base_path));
    } else {
        warn!(path = %base_path.display(), "base config not found, using defaults");
        let defaults = T::default();
        let as_toml = toml::to_string(&defaults).context("serializing default config")?;
        builder = builder.add_source(File::from_str(&as_toml, config_crate::FileFormat::Toml));
    }

    if let Some(env) = environment {
        let overlay = base_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("environments")
            .join(format!("{env}.toml"));
        if overlay.exists() {
            info!(path = %overlay.display(), "loading environment overlay");
            builder = builder.add_source(File::from(overlay));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("LIVERMORE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build().context("building layered config")?;
    config.try_deserialize().context("deserializing config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
    struct SampleConfig {
        #[serde(default)]
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn falls_back_to_defaults_when_file_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let cfg: SampleConfig = load(&path, None).unwrap();
        assert_eq!(cfg, SampleConfig::default());
    }

    #[test]
    fn loads_base_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "name = \"test\"\ncount = 5\n").unwrap();
        let cfg: SampleConfig = load(&path, None).unwrap();
        assert_eq!(cfg.name, "test");
        assert_eq!(cfg.count, 5);
    }
}
