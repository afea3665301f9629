//! INI file configuration adapter with environment overrides.
//!
//! `EDGETRADER_<SECTION>_<KEY>` (upper-cased) takes precedence over the
//! file, e.g. `EDGETRADER_RISK_RISK_FRACTION=0.02`.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::collections::HashMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "EDGETRADER";

pub struct FileConfigAdapter {
    config: Ini,
    overrides: HashMap<String, String>,
}

impl FileConfigAdapter {
    /// Loads `path` and captures overrides from the process environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self {
            config,
            overrides: HashMap::new(),
        }
        .with_env_overrides(std::env::vars()))
    }

    /// Parses INI text without consulting the environment.
    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self {
            config,
            overrides: HashMap::new(),
        })
    }

    /// Keeps the variables carrying [`ENV_PREFIX`]; the rest are ignored.
    pub fn with_env_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{ENV_PREFIX}_");
        self.overrides.extend(
            vars.into_iter()
                .filter(|(name, _)| name.starts_with(&prefix)),
        );
        self
    }

    fn env_name(section: &str, key: &str) -> String {
        format!("{ENV_PREFIX}_{section}_{key}").to_uppercase()
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .get(&Self::env_name(section, key))
            .cloned()
            .or_else(|| self.config.get(section, key))
    }
}
