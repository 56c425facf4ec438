//! Process-wide sweep configuration.
//!
//! Configuration is read from an optional TOML file, overridden by command
//! line flags and installed once per process:
//!
//! ```toml
//! regions = ["us-west-2", "us-east-1"]
//! concurrency = 20
//! allow_failures = true
//! sweepers = ["aws_auditmanager_control"]
//! profile = "sandbox"
//! ```
use std::{path::Path, sync::OnceLock};

use snafu::ResultExt;

use crate::{ConfigParseSnafu, ConfigReadSnafu, Result};

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_CONCURRENCY: usize = 10;

static CONFIG: OnceLock<SweepConfig> = OnceLock::new();

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Regions to sweep, in order.
    pub regions: Vec<String>,
    /// Maximum number of deletions in flight per sweep.
    pub concurrency: usize,
    /// Keep sweeping a region after a sweeper fails.
    pub allow_failures: bool,
    /// Names of the sweepers to run. Empty means all of them.
    pub sweepers: Vec<String>,
    /// Named AWS profile, otherwise the default credential chain.
    pub profile: Option<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            regions: vec![DEFAULT_REGION.to_owned()],
            concurrency: DEFAULT_CONCURRENCY,
            allow_failures: false,
            sweepers: vec![],
            profile: None,
        }
    }
}

/// Values that take precedence over a [`SweepConfig`], usually from the
/// command line. Empty and `None` fields leave the config untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    pub regions: Vec<String>,
    pub concurrency: Option<usize>,
    pub allow_failures: bool,
    pub sweepers: Vec<String>,
    pub profile: Option<String>,
}

impl SweepConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads a config file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ConfigReadSnafu { path })?;
        Self::from_toml_str(&contents).context(ConfigParseSnafu { path })
    }

    /// Reads a config file if one is given, the defaults otherwise.
    pub fn read_or_default(path: Option<impl AsRef<Path>>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if !overrides.regions.is_empty() {
            self.regions = overrides.regions;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        self.allow_failures |= overrides.allow_failures;
        if !overrides.sweepers.is_empty() {
            self.sweepers = overrides.sweepers;
        }
        if overrides.profile.is_some() {
            self.profile = overrides.profile;
        }
        self.concurrency = self.concurrency.max(1);
        self
    }

    /// Installs this config as the process-wide one.
    ///
    /// Only the first installation takes effect. Returns whether this one
    /// did.
    pub fn install(self) -> bool {
        match CONFIG.set(self) {
            Ok(()) => true,
            Err(config) => {
                log::warn!("sweep config already installed, ignoring {config:?}");
                false
            }
        }
    }
}

/// The installed config, or the defaults when none was installed.
pub fn global() -> &'static SweepConfig {
    CONFIG.get_or_init(SweepConfig::default)
}

/// Width of the delete orchestrator, at least one.
pub fn concurrency() -> usize {
    global().concurrency.max(1)
}
