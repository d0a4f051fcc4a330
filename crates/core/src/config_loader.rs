use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";
pub const ENV_PREFIX: &str = "INSTFLOW_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default TOML file, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration with `path` as the TOML source.
    ///
    /// Section defaults are overridden by the TOML file, then by `INSTFLOW_`-prefixed
    /// environment variables (`__` separates nested keys, e.g.
    /// `INSTFLOW_ANALYSIS__GAP_POLICY`). A JSON file next to the TOML file is
    /// joined last and only fills keys that are still unset.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed, or
    /// if a setting fails [`AppConfig::validate`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Self::figment(path).extract()?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(path.with_extension("json")))
    }
}
