//! Run settings: defaults, optional YAML file, command-line overrides.
//!
//! # Example file
//!
//! ```yaml
//! store_root: /srv/dc-archive
//! save_recordings: true
//! concurrency: 4
//! councils: [central, wc]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::ConfigError;

pub const DEFAULT_SITE_ROOT: &str = "https://www.districtcouncils.gov.hk";
pub const DEFAULT_LANGUAGE: &str = "tc_chi";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_RETRIES: usize = 3;

/// The eighteen district councils, in harvesting order.
pub const DEFAULT_COUNCILS: [&str; 18] = [
    "central", "wc", "south", "east", "kt", "ssp", "ytm", "wts", "kc", "island", "tw", "yl",
    "north", "st", "sk", "kwt", "tp", "tm",
];

/// Everything a harvest run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Log intended downloads instead of performing them.
    pub dry_run: bool,
    /// Root directory of the archive.
    pub store_root: PathBuf,
    /// Whether audio recordings are downloaded.
    pub save_recordings: bool,
    /// Capacity of the limiter shared by page fetches and downloads.
    pub concurrency: usize,
    /// Attempts per HTTP request.
    pub retries: usize,
    pub site_root: String,
    pub language: String,
    /// Councils to harvest, in order.
    pub councils: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dry_run: false,
            store_root: PathBuf::from("./data"),
            save_recordings: false,
            concurrency: DEFAULT_CONCURRENCY,
            retries: DEFAULT_RETRIES,
            site_root: DEFAULT_SITE_ROOT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            councils: DEFAULT_COUNCILS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text; missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Build the settings for this invocation and validate them.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let base = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let settings = base.with_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply the values given on the command line.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(store) = &cli.store {
            self.store_root = store.clone();
        }
        self.dry_run |= cli.dry_run;
        self.save_recordings |= cli.recordings;
        if let Some(n) = cli.concurrency {
            self.concurrency = n;
        }
        if let Some(n) = cli.retries {
            self.retries = n;
        }
        if let Some(root) = &cli.site_root {
            self.site_root = root.clone();
        }
        if let Some(language) = &cli.language {
            self.language = language.clone();
        }
        if !cli.councils.is_empty() {
            self.councils = cli.councils.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.retries == 0 {
            return Err(ConfigError::Invalid("retries must be at least 1".into()));
        }
        if self.councils.is_empty() {
            return Err(ConfigError::Invalid("no councils to harvest".into()));
        }
        Ok(())
    }

    /// URL of a council's landing page, e.g.
    /// `https://www.districtcouncils.gov.hk/central/tc_chi/meetings/dcmeetings/dc_meetings.php`.
    pub fn landing_url(&self, council: &str, page: &str) -> String {
        format!(
            "{}/{}/{}/meetings/{}",
            self.site_root.trim_end_matches('/'),
            council,
            self.language,
            page
        )
    }
}
