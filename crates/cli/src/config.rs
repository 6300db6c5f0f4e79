//! CLI configuration utilities

use anyhow::{Context, Result};
use directories::ProjectDirs;
use erp_http::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable prefix; nested keys are separated by `__`
const ENV_PREFIX: &str = "ERP";

/// Effective settings of the command line front end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    /// API endpoints and transport settings
    pub api: ClientConfig,

    /// Where the session tokens are kept; defaults to `<data dir>/session.json`
    pub session_file: Option<PathBuf>,
}

impl ErpConfig {
    /// Load configuration: defaults, then the optional file, then `ERP__*`
    /// environment variables (for example `ERP__API__BASE_URL`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        Ok(settings.try_deserialize()?)
    }

    /// Session file location, honouring the data directory override
    pub fn session_file(&self, data_dir: Option<&Path>) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| data_dir_or_default(data_dir).join("session.json"))
    }
}

/// Platform data directory unless overridden
pub fn data_dir_or_default(data_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = data_dir {
        return dir.to_path_buf();
    }

    if let Some(dirs) = ProjectDirs::from("com", "SiteErp", "erp") {
        dirs.data_dir().to_path_buf()
    } else {
        warn!("Failed to determine platform-specific directories, using ./.erp");
        PathBuf::from(".erp")
    }
}
