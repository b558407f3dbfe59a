//! Wrapper configuration.
//!
//! The generator location and the project name used to be baked into the
//! wrapper. They are now read once at startup, from the following sources in
//! order, the last one winning:
//!
//! - built-in defaults;
//! - the closest `moc-wrapper.toml` in the current directory or one of its
//!   parents;
//! - `moc-wrapper/moc-wrapper.toml` in the user configuration directory;
//! - any file specified in the `MOC_WRAPPER_CONFIG` environment variable;
//! - environment variables, starting with `MOC_WRAPPER_`.
//!
//! Command-line overrides are applied on top with [`Config::override_with`].

use std::path::Path;

use camino::Utf8PathBuf;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The default filename for configuration files.
pub static DEFAULT_FILENAME: &str = "moc-wrapper.toml";

/// Environment variable naming an additional configuration file.
pub static CONFIG_ENV_VAR: &str = "MOC_WRAPPER_CONFIG";

/// Prefix of the environment variables overriding single values.
pub static ENV_PREFIX: &str = "MOC_WRAPPER_";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// The metaobject compiler, as an absolute path or a name looked up in
    /// `PATH`.
    pub moc_path: Utf8PathBuf,
    /// Appended to `fbcode_dir` to form the `-p` flag.
    pub project_name: String,
    /// Whether a failing generator makes the wrapper fail too.
    ///
    /// Off by default: existing build pipelines expect the wrapper to succeed
    /// even when moc complains.
    pub fail_on_child_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            moc_path: Utf8PathBuf::from("moc"),
            project_name: "patternminer".to_owned(),
            fail_on_child_error: false,
        }
    }
}

/// Values given on the command line, taking precedence over every other
/// source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub moc_path: Option<Utf8PathBuf>,
    pub project_name: Option<String>,
    pub fail_on_child_error: Option<bool>,
}

impl Config {
    /// Load the configuration from all its sources, looking for
    /// `moc-wrapper.toml` from the current working directory upwards.
    ///
    /// # Errors
    ///
    /// If the current directory is unreadable or a source holds an invalid
    /// value, an error is returned.
    pub fn load() -> Result<Self> {
        let path = std::env::current_dir().map_err(|err| {
            Error::from_source(err).with_context("failed to read the current directory")
        })?;

        Self::load_with_current_directory(path)
    }

    /// Load the configuration, using the specified path as the current
    /// directory.
    ///
    /// # Errors
    ///
    /// If a source holds an invalid value, an error is returned.
    pub fn load_with_current_directory(path: impl AsRef<Path>) -> Result<Self> {
        Self::extract(Self::figment(path.as_ref()))
    }

    fn figment(path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Only the closest file is read.
        for dir in path.ancestors() {
            let config_file_path = dir.join(DEFAULT_FILENAME);

            if config_file_path.is_file() {
                figment = figment.merge(Toml::file(config_file_path));
                break;
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_file_path = config_dir.join("moc-wrapper").join(DEFAULT_FILENAME);
            figment = figment.merge(Toml::file(config_file_path));
        }

        if let Some(config_file_path) = std::env::var_os(CONFIG_ENV_VAR) {
            figment = figment.merge(Toml::file(config_file_path));
        }

        // `MOC_WRAPPER_CONFIG` names a file and `MOC_WRAPPER_LOG` the log
        // filter, neither is a configuration value.
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG", "LOG"]))
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment.extract().map_err(|err| {
            Error::from_source(err)
                .with_context("failed to load the configuration")
                .with_explanation(format!(
                    "Check the `{}` files and the `{}*` environment variables.",
                    DEFAULT_FILENAME, ENV_PREFIX
                ))
                .with_exit_code(Some(crate::error::FAILURE_EXIT_CODE))
        })
    }

    /// Override this configuration with values from the command line.
    #[must_use]
    pub fn override_with(self, overrides: &ConfigOverrides) -> Self {
        Self {
            moc_path: overrides.moc_path.clone().unwrap_or(self.moc_path),
            project_name: overrides
                .project_name
                .clone()
                .unwrap_or(self.project_name),
            fail_on_child_error: overrides
                .fail_on_child_error
                .unwrap_or(self.fail_on_child_error),
        }
    }
}
