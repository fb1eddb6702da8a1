//! Layered configuration
//!
//! Values are merged from lowest to highest precedence:
//! 1. built-in defaults
//! 2. user config: `<config dir>/rebundle/rebundle.toml`
//! 3. project config: `rebundle.toml` in the working directory, or `--config`
//! 4. environment variables (`REBUNDLE_MINIFY`, `REBUNDLE_TREESHAKE`)
//! 5. command-line flags, applied by the CLI on top of the loaded value

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use etcetera::BaseStrategy;
use log::debug;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "rebundle.toml";
const ENV_MINIFY: &str = "REBUNDLE_MINIFY";
const ENV_TREESHAKE: &str = "REBUNDLE_TREESHAKE";

/// Options the bundling core consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    pub minify: bool,
    pub treeshake: bool,
    /// Extensions tried, in order, when a relative specifier has no file
    pub extensions: Vec<String>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            minify: false,
            treeshake: true,
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_owned(), ".mjs".to_owned()]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Entry module; the CLI argument wins over this
    pub entry: Option<PathBuf>,
    /// Output file; stdout when unset
    pub output: Option<PathBuf>,
    pub minify: bool,
    pub treeshake: bool,
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let options = BundleOptions::default();
        Self {
            entry: None,
            output: None,
            minify: options.minify,
            treeshake: options.treeshake,
            extensions: options.extensions,
        }
    }
}

/// A config file as written on disk; unset keys leave the lower layer alone
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigLayer {
    entry: Option<PathBuf>,
    output: Option<PathBuf>,
    minify: Option<bool>,
    treeshake: Option<bool>,
    extensions: Option<Vec<String>>,
}

impl Config {
    /// Load the full configuration hierarchy
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config) = user_config_path()
            && user_config.is_file()
        {
            debug!("Loading user config from {}", user_config.display());
            config.merge(read_layer(&user_config)?);
        }

        match explicit_path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                config.merge(read_layer(path)?);
            }
            None => {
                let project_config = Path::new(CONFIG_FILE_NAME);
                if project_config.is_file() {
                    debug!("Loading project config from {CONFIG_FILE_NAME}");
                    config.merge(read_layer(project_config)?);
                }
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Parse a single TOML document on top of the defaults
    pub fn from_toml(source: &str) -> Result<Self> {
        let layer: ConfigLayer = toml::from_str(source).context("Invalid rebundle config")?;
        let mut config = Self::default();
        config.merge(layer);
        Ok(config)
    }

    fn merge(&mut self, layer: ConfigLayer) {
        if let Some(entry) = layer.entry {
            self.entry = Some(entry);
        }
        if let Some(output) = layer.output {
            self.output = Some(output);
        }
        if let Some(minify) = layer.minify {
            self.minify = minify;
        }
        if let Some(treeshake) = layer.treeshake {
            self.treeshake = treeshake;
        }
        if let Some(extensions) = layer.extensions {
            self.extensions = extensions;
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(minify) = env_flag(ENV_MINIFY)? {
            self.minify = minify;
        }
        if let Some(treeshake) = env_flag(ENV_TREESHAKE)? {
            self.treeshake = treeshake;
        }
        Ok(())
    }

    pub fn bundle_options(&self) -> BundleOptions {
        BundleOptions {
            minify: self.minify,
            treeshake: self.treeshake,
            extensions: self.extensions.clone(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    etcetera::choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("rebundle").join(CONFIG_FILE_NAME))
}

fn read_layer(path: &Path) -> Result<ConfigLayer> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&source).with_context(|| format!("Invalid config file {}", path.display()))
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(anyhow!("Invalid value for {name}: {other:?}")),
    }
}
