use crate::cli::{OutputFormat, ReaderArgs};
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use trajstream::engine::config::{ReaderConfig, ReaderConfigBuilder};

const DEFAULT_DECIMALS: usize = 3;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialReaderConfig {
    #[serde(rename = "cache-capacity")]
    cache_capacity: Option<usize>,
    #[serde(rename = "strict-index")]
    strict_index: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    format: Option<OutputFormat>,
    decimals: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    reader: Option<PartialReaderConfig>,
    output: Option<PartialOutputConfig>,
}

/// Output settings after merging the configuration file with command-line flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub decimals: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// Fully resolved settings for one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub reader: ReaderConfig,
    pub output: OutputSettings,
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOverrides {
    pub format: Option<OutputFormat>,
    pub decimals: Option<usize>,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(
        self,
        reader_args: &ReaderArgs,
        overrides: OutputOverrides,
    ) -> Result<AppConfig> {
        let reader = self.reader.unwrap_or_default();
        let output = self.output.unwrap_or_default();

        let mut builder = ReaderConfigBuilder::new();
        if let Some(capacity) = reader_args.cache_capacity.or(reader.cache_capacity) {
            builder = builder.cache_capacity(capacity);
        }
        let strict = reader_args.strict || reader.strict_index.unwrap_or(false);
        let reader_config = builder.strict(strict).build()?;

        let output = OutputSettings {
            format: overrides
                .format
                .or(output.format)
                .unwrap_or_default(),
            decimals: overrides
                .decimals
                .or(output.decimals)
                .unwrap_or(DEFAULT_DECIMALS),
        };
        if output.decimals > 9 {
            return Err(CliError::Config(format!(
                "`output.decimals` must be at most 9, got {}",
                output.decimals
            )));
        }

        debug!(?reader_config, ?output, "Resolved configuration.");
        Ok(AppConfig {
            reader: reader_config,
            output,
        })
    }
}
