use crate::core::db::{ConnectionDescriptor, DriverKind};
use crate::core::{KebabError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "KEBAB_CONFIG";

/// Top-level configuration structure parsed from a TOML file.
///
/// Keep one file per environment/machine.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub environment: Option<String>,
    pub database: DatabaseConfig,
}

/// Database connection configuration.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub driver: DriverKind,
    pub connection_string: String,
}

impl Config {
    /// Environment name, `dev` when unset.
    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or("dev")
    }

    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(self.database.driver, self.database.connection_string.clone())
    }

    /// Finds the configuration file: `$KEBAB_CONFIG`, then `./kebab.toml`,
    /// then `<config dir>/kebab/kebab.toml`.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from("kebab.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("kebab").join("kebab.toml"))
            .filter(|path| path.exists())
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = kebab::config::load_config("kebab.toml").expect("Failed to load config");
/// println!("{:?}", config.descriptor());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| KebabError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}
