//! Error taxonomy for matching, compiling and watching.
//!
//! Configuration errors live in [`crate::config`]; everything the build core
//! can fail with is an [`Error`]. The binary boundary converts to `anyhow`.

use crate::config::ConfigError;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("failed to compile `{}`", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("I/O error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file watcher failed")]
    Watch(#[from] notify::Error),

    #[error("invalid compiler registry: {0}")]
    Registry(String),
}

impl Error {
    pub fn compile(path: impl Into<PathBuf>, source: impl Into<CompileError>) -> Self {
        Self::Compile {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A compiler's own glob pattern failed to parse.
#[derive(Debug, Error)]
#[error("invalid glob pattern `{pattern}`")]
pub struct MatchError {
    pub pattern: String,
    #[source]
    pub source: glob::PatternError,
}

/// Why a single source file could not be rendered.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid front matter")]
    FrontMatter(#[from] toml::de::Error),

    #[error("unterminated front matter block")]
    UnterminatedFrontMatter,

    #[error("front matter has no `layout` key")]
    MissingLayout,

    #[error("no layout named `{0}`")]
    UnknownLayout(String),

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error(transparent)]
    Template(#[from] handlebars::TemplateError),

    #[error(transparent)]
    Render(#[from] handlebars::RenderError),

    #[error("`{0}` not found, please install it first")]
    CommandNotFound(String),

    #[error("`{command}` failed:\n{stderr}")]
    Command { command: String, stderr: String },

    #[error("source is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
