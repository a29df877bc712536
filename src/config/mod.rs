//! Site configuration management for `scriv.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url)                |
//! | `[build]`   | Source/dest roots, document directories, sass     |
//! | `[serve]`   | Development server (port, interface, watch)       |
//! | `[extra]`   | User-defined fields, merged into template `site`  |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//!
//! [build]
//! source = "source"
//! dest = "public"
//! posts = "_posts"
//!
//! [serve]
//! port = 4000
//!
//! [extra]
//! analytics_id = "UA-12345"
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

pub use error::ConfigError;

use base::BaseConfig;
use build::BuildConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing scriv.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub base: BaseConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse `content`, read from `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Load, apply CLI overrides and validate.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        if !config_path.exists() {
            bail!(ConfigError::NotFound(config_path));
        }

        let mut config = Self::from_path(&config_path)?;
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Absolute source root.
    pub fn source(&self) -> &Path {
        &self.build.source
    }

    /// Absolute destination root.
    pub fn dest(&self) -> &Path {
        &self.build.dest
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.dest, cli.dest.as_ref());

        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }

        let root = Self::normalize_path(&root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.update_path_with_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make `source`/`dest` absolute against `root`.
    pub fn update_path_with_root(&mut self, root: &Path) {
        self.set_root(root);
        self.build.source = Self::normalize_path(&root.join(&self.build.source));
        self.build.dest = Self::normalize_path(&root.join(&self.build.dest));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration after CLI overrides were applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let build = &self.build;

        if !build.source.is_dir() {
            return Err(ConfigError::invalid(
                "[build.source]",
                format!("`{}` is not a directory", build.source.display()),
            ));
        }

        if build.dest == build.source {
            return Err(ConfigError::invalid(
                "[build.dest]",
                "must differ from [build.source]",
            ));
        }

        if build.sass.command.is_empty() {
            return Err(ConfigError::invalid(
                "[build.sass.command]",
                "must have at least one element",
            ));
        }

        let document_dirs = [
            ("[build.posts]", Some(&build.posts)),
            ("[build.layouts]", Some(&build.layouts)),
            ("[build.post_layouts]", build.post_layouts.as_ref()),
            ("[build.includes]", build.includes.as_ref()),
        ];
        for (field, dir) in document_dirs {
            if let Some(dir) = dir
                && dir.is_absolute()
            {
                return Err(ConfigError::invalid(field, "must be relative to [build.source]"));
            }
        }

        Ok(())
    }

    /// `site` object handed to templates: `[base]` plus `[extra]`.
    pub fn template_site(&self) -> serde_json::Value {
        let mut site = serde_json::Map::new();
        for (key, value) in &self.extra {
            if let Ok(value) = serde_json::to_value(value) {
                site.insert(key.clone(), value);
            }
        }
        site.insert("title".into(), self.base.title.clone().into());
        site.insert("author".into(), self.base.author.clone().into());
        site.insert("description".into(), self.base.description.clone().into());
        site.insert(
            "url".into(),
            self.base.url.clone().map_or(serde_json::Value::Null, Into::into),
        );
        serde_json::Value::Object(site)
    }
}
