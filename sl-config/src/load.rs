use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;
use crate::shared::ValidationError;

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// File extensions tried for every configuration layer, in order.
const CONFIG_FILE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Prefix of environment variables overriding file settings (`APP_HOST`).
const ENV_PREFIX: &str = "APP";

/// Separator of nested keys in environment variables (`APP_TIMEOUT__TOTAL_MS`).
const ENV_SEPARATOR: &str = "__";

/// Settings that can be loaded with [`load_config`].
pub trait Config {
    /// Checks invariants serde cannot express.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A configuration file layer. Later layers override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    Base,
    Environment(Environment),
}

impl ConfigLayer {
    fn file_stem(&self) -> &'static str {
        match self {
            ConfigLayer::Base => "base",
            ConfigLayer::Environment(environment) => environment.as_str(),
        }
    }
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLayer::Base => f.write_str("base configuration"),
            ConfigLayer::Environment(environment) => {
                write!(f, "{environment} configuration")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to read the working directory: {0}")]
    WorkingDirectory(#[source] io::Error),

    #[error("failed to determine the runtime environment: {0}")]
    Environment(#[source] io::Error),

    #[error("configuration directory `{}` does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no {layer} found in `{}` (looked for {candidates})", .directory.display())]
    FileNotFound {
        layer: ConfigLayer,
        directory: PathBuf,
        candidates: String,
    },

    #[error("{layer} in `{}` is malformed: {source}", .path.display())]
    InvalidFile {
        layer: ConfigLayer,
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("failed to merge configuration sources: {0}")]
    Merge(#[source] config::ConfigError),

    #[error("configuration does not match the expected shape: {0}")]
    Deserialize(#[source] config::ConfigError),

    #[error("configuration is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

/// Loads and validates settings for the current environment.
///
/// Reads `configuration/base.(yaml|yml|json)` then `configuration/{environment}.(yaml|yml|json)`,
/// where the environment comes from `APP_ENVIRONMENT`. `APP_`-prefixed environment variables are
/// applied last, with `__` separating nested keys.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let working_directory = std::env::current_dir().map_err(LoadConfigError::WorkingDirectory)?;
    let environment = Environment::load().map_err(LoadConfigError::Environment)?;

    load_config_from(&working_directory.join(CONFIGURATION_DIR), environment)
}

/// Same as [`load_config`], from an explicit directory and environment.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut builder = config::Config::builder();
    for layer in [ConfigLayer::Base, ConfigLayer::Environment(environment)] {
        let path = locate_layer(directory, layer)?;
        let file = config::File::from(path.as_path());

        // Each file is parsed alone first, so a syntax error names the file it comes from.
        config::Config::builder()
            .add_source(file.clone())
            .build()
            .map_err(|source| LoadConfigError::InvalidFile {
                layer,
                path: path.clone(),
                source,
            })?;

        builder = builder.add_source(file);
    }

    let overrides = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    let settings: T = builder
        .add_source(overrides)
        .build()
        .map_err(LoadConfigError::Merge)?
        .try_deserialize()
        .map_err(LoadConfigError::Deserialize)?;
    settings.validate()?;

    Ok(settings)
}

fn locate_layer(directory: &Path, layer: ConfigLayer) -> Result<PathBuf, LoadConfigError> {
    let candidates: Vec<PathBuf> = CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{}.{extension}", layer.file_stem())))
        .collect();

    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        return Ok(path.clone());
    }

    Err(LoadConfigError::FileNotFound {
        layer,
        directory: directory.to_path_buf(),
        candidates: candidates
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Endpoint {
        host: String,
        lazy_metadata: bool,
    }

    impl Config for Endpoint {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.host.is_empty() {
                return Err(ValidationError::EmptyHost);
            }
            Ok(())
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sl_config_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_environment_layer_overrides_base() {
        let dir = scratch_dir("override");
        fs::write(
            dir.join("base.yaml"),
            "host: base.example.com\nlazy_metadata: false\n",
        )
        .unwrap();
        fs::write(dir.join("prod.json"), r#"{"host": "prod.example.com"}"#).unwrap();

        let endpoint: Endpoint = load_config_from(&dir, Environment::Prod).unwrap();

        assert_eq!(endpoint.host, "prod.example.com");
        assert!(!endpoint.lazy_metadata);
    }

    #[test]
    fn test_missing_environment_layer() {
        let dir = scratch_dir("missing");
        fs::write(dir.join("base.yml"), "host: a\nlazy_metadata: true\n").unwrap();

        let err = load_config_from::<Endpoint>(&dir, Environment::Dev).unwrap_err();

        assert!(matches!(
            err,
            LoadConfigError::FileNotFound {
                layer: ConfigLayer::Environment(Environment::Dev),
                ..
            }
        ));
        assert!(err.to_string().contains("dev.yaml, dev.yml, dev.json"));
    }

    #[test]
    fn test_malformed_file_is_named() {
        let dir = scratch_dir("malformed");
        fs::write(dir.join("base.json"), "{ not json").unwrap();
        fs::write(dir.join("dev.yaml"), "host: a\n").unwrap();

        let err = load_config_from::<Endpoint>(&dir, Environment::Dev).unwrap_err();

        assert!(matches!(
            err,
            LoadConfigError::InvalidFile {
                layer: ConfigLayer::Base,
                ..
            }
        ));
    }

    #[test]
    fn test_loaded_settings_are_validated() {
        let dir = scratch_dir("invalid");
        fs::write(dir.join("base.yaml"), "host: ''\nlazy_metadata: true\n").unwrap();
        fs::write(dir.join("dev.yaml"), "lazy_metadata: false\n").unwrap();

        let err = load_config_from::<Endpoint>(&dir, Environment::Dev).unwrap_err();

        assert!(matches!(
            err,
            LoadConfigError::Invalid(ValidationError::EmptyHost)
        ));
    }

    #[test]
    fn test_missing_directory() {
        let dir = std::env::temp_dir().join("sl_config_does_not_exist");

        let err = load_config_from::<Endpoint>(&dir, Environment::Dev).unwrap_err();

        assert!(matches!(err, LoadConfigError::DirectoryNotFound(_)));
    }
}
