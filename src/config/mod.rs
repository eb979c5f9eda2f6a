//! Configuration management.
//!
//! Precedence, lowest first: defaults, the TOML config file, `STACKSORT_*`
//! environment variables, CLI flags.

mod observability;

pub use observability::{LoggingSettings, MetricsSettings, ObservabilitySettings};

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of concurrent snapshot queries per wave.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Largest number of names a destination range may expand to.
pub const MAX_RANGE_DESTINATIONS: u32 = 65_536;

/// Main configuration for stacksort.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Maximum in-flight snapshot queries per wave.
    pub batch_size: usize,
    /// Pause between cycles (zero loops immediately).
    pub loop_delay: Duration,
    /// How the destination set is enumerated.
    pub destinations: DestinationSelector,
    /// Name of the source inventory.
    pub source: String,
    /// Name of the fallback inventory, if any.
    pub fallback: Option<String>,
    /// World file for the simulated backend.
    pub world: Option<PathBuf>,
    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

/// How destination names are enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationSelector {
    /// Explicit list in routing order.
    List(Vec<String>),
    /// `prefix` followed by every number from `start` to `end` inclusive.
    Range {
        /// Name prefix, e.g. `minecraft:chest_`.
        prefix: String,
        /// First number.
        start: u32,
        /// Last number (inclusive).
        end: u32,
    },
}

impl Default for DestinationSelector {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl DestinationSelector {
    /// Expands the selector into destination names, in routing order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::List(names) => names.clone(),
            Self::Range { prefix, start, end } => {
                (*start..=*end).map(|n| format!("{prefix}{n}")).collect()
            },
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            loop_delay: Duration::ZERO,
            destinations: DestinationSelector::default(),
            source: "minecraft:barrel_0".to_string(),
            fallback: None,
            world: None,
            observability: ObservabilitySettings::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Batch size.
    pub batch_size: Option<usize>,
    /// Loop delay in milliseconds.
    pub loop_delay_ms: Option<u64>,
    /// Source inventory name.
    pub source: Option<String>,
    /// Fallback inventory name.
    pub fallback: Option<String>,
    /// World file path.
    pub world: Option<String>,
    /// Destinations section.
    pub destinations: Option<ConfigFileDestinations>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// Destinations section in config file.
///
/// `list` wins over the range fields when both are present.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDestinations {
    /// Explicit names.
    pub list: Option<Vec<String>>,
    /// Range prefix.
    pub prefix: Option<String>,
    /// Range start.
    pub start: Option<u32>,
    /// Range end (inclusive).
    pub end: Option<u32>,
}

impl SortConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// A relative `world` path is resolved against the config file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let mut config = Self::from_toml(&contents)?;
        if let (Some(world), Some(dir)) = (config.world.as_deref(), path.parent())
            && world.is_relative()
        {
            let resolved = dir.join(world);
            config.world = Some(resolved);
        }
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/stacksort/`. Returns
    /// the default configuration if no file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("stacksort").join("config.toml");
        if platform_config.exists()
            && let Ok(config) = Self::load_from_file(&platform_config)
        {
            return config;
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("stacksort")
            .join("config.toml");
        if xdg_config.exists()
            && let Ok(config) = Self::load_from_file(&xdg_config)
        {
            return config;
        }

        Self::default()
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(batch_size) = file.batch_size {
            config.batch_size = batch_size.max(1);
        }
        if let Some(delay) = file.loop_delay_ms {
            config.loop_delay = Duration::from_millis(delay);
        }
        if let Some(source) = file.source {
            config.source = source;
        }
        config.fallback = file.fallback.filter(|name| !is_none_value(name));
        config.world = file.world.map(PathBuf::from);
        if let Some(destinations) = file.destinations {
            config.destinations = destinations.into_selector();
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config
    }

    /// Applies `STACKSORT_*` environment variable overrides.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `STACKSORT_BATCH_SIZE` | Max concurrent snapshot queries |
    /// | `STACKSORT_LOOP_DELAY_MS` | Pause between cycles |
    /// | `STACKSORT_SOURCE` | Source inventory name |
    /// | `STACKSORT_FALLBACK` | Fallback inventory name (`none` clears) |
    /// | `STACKSORT_WORLD` | World file path |
    ///
    /// Logging and metrics overrides are applied when observability is initialized.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("STACKSORT_BATCH_SIZE")
            && let Ok(parsed) = v.parse::<usize>()
        {
            self.batch_size = parsed.max(1);
        }
        if let Ok(v) = std::env::var("STACKSORT_LOOP_DELAY_MS")
            && let Ok(parsed) = v.parse::<u64>()
        {
            self.loop_delay = Duration::from_millis(parsed);
        }
        if let Ok(v) = std::env::var("STACKSORT_SOURCE")
            && !v.trim().is_empty()
        {
            self.source = v;
        }
        if let Ok(v) = std::env::var("STACKSORT_FALLBACK") {
            self.fallback = (!is_none_value(&v)).then_some(v);
        }
        if let Ok(v) = std::env::var("STACKSORT_WORLD")
            && !v.trim().is_empty()
        {
            self.world = Some(PathBuf::from(v));
        }
        self
    }

    /// Checks the configuration for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the source name is empty, the fallback names the
    /// source, or the destination range is inverted or longer than
    /// [`MAX_RANGE_DESTINATIONS`].
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(Error::Config("source inventory name is empty".to_string()));
        }
        if self.fallback.as_deref() == Some(self.source.as_str()) {
            return Err(Error::Config("fallback must differ from source".to_string()));
        }
        if let DestinationSelector::Range { start, end, .. } = &self.destinations {
            if start > end {
                return Err(Error::Config(format!(
                    "destination range start {start} is after end {end}"
                )));
            }
            if end - start >= MAX_RANGE_DESTINATIONS {
                return Err(Error::Config(format!(
                    "destination range {start}..={end} exceeds {MAX_RANGE_DESTINATIONS} inventories"
                )));
            }
        }
        Ok(())
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the world file.
    #[must_use]
    pub fn with_world(mut self, path: impl Into<PathBuf>) -> Self {
        self.world = Some(path.into());
        self
    }
}

impl ConfigFileDestinations {
    fn into_selector(self) -> DestinationSelector {
        if let Some(list) = self.list {
            return DestinationSelector::List(list);
        }
        match (self.prefix, self.start, self.end) {
            (Some(prefix), start, Some(end)) => DestinationSelector::Range {
                prefix,
                start: start.unwrap_or(0),
                end,
            },
            _ => DestinationSelector::default(),
        }
    }
}

fn is_none_value(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("none")
}
