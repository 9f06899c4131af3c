//! Configuration parsing and validation.
//!
//! Configuration is loaded from a TOML file; command-line flags override it.
//!
//! ```toml
//! dialect = "sqlite"
//! default_limit = 10
//! max_limit = 100
//! log_level = "info"
//!
//! [profiles.comments]
//! table = "comments"
//! sort = "-created_at,id"
//! fields = ["id", "content", "created_at"]
//! allowed_sort_fields = ["created_at", "id"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use keyseek::{DEFAULT_PAGE_SIZE, SortSpec, is_valid_sql_identifier};
use serde::Deserialize;

use crate::cli::DialectName;
use crate::log::Level;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "keyseek.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQL dialect for rendered queries.
    #[serde(default)]
    pub dialect: DialectName,

    /// Page size when no limit is given.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Largest accepted page size.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// Lowest log level written to stderr.
    #[serde(default)]
    pub log_level: Level,

    /// Named endpoint profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// One paginated endpoint: its table, fixed sort and selectable columns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub table: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    /// Whitelist for sort fields; empty allows any.
    #[serde(default)]
    pub allowed_sort_fields: Vec<String>,
}

const fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_max_limit() -> u32 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectName::default(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            log_level: Level::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `explicit`, else `./keyseek.toml` if it exists, else defaults.
    ///
    /// Returns the path actually read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok((Self::default(), None));
                }
                fallback
            },
        };
        let config = Self::from_file(&path)?;
        Ok((config, Some(path)))
    }

    /// Look up a profile; no name means an empty profile.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile> {
        let Some(name) = name else {
            return Ok(Profile::default());
        };
        self.profiles.get(name).cloned().with_context(|| {
            let known: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
            format!("unknown profile '{name}' (known: {known:?})")
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            anyhow::bail!("default_limit must be positive");
        }
        if self.default_limit > self.max_limit {
            anyhow::bail!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit,
                self.max_limit
            );
        }

        for (name, profile) in &self.profiles {
            profile
                .validate()
                .with_context(|| format!("invalid profile '{name}'"))?;
        }
        Ok(())
    }
}

impl Profile {
    /// The whitelist as borrowed strings, for [`SortSpec::parse`].
    pub fn allowed(&self) -> Vec<&str> {
        self.allowed_sort_fields.iter().map(String::as_str).collect()
    }

    fn validate(&self) -> Result<()> {
        if let Some(table) = &self.table
            && !is_valid_sql_identifier(table)
        {
            anyhow::bail!("table '{table}' is not a valid SQL identifier");
        }
        if let Some(field) = self.fields.iter().find(|f| !is_valid_sql_identifier(f)) {
            anyhow::bail!("field '{field}' is not a valid SQL identifier");
        }
        if let Some(sort) = &self.sort {
            SortSpec::parse(sort, &self.allowed())
                .with_context(|| format!("invalid sort '{sort}'"))?;
        }
        Ok(())
    }
}
