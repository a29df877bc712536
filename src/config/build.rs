//! `[build]` section configuration.
//!
//! Source and destination roots plus the document directories the
//! compilers look in. Document directories are relative to `source`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in scriv.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "source"          # Source tree
/// dest = "public"            # Output tree
/// posts = "_posts"           # Markdown documents, relative to source
/// layouts = "_layouts"       # Shared layouts
/// post_layouts = "_post_layouts"
/// includes = "_includes"
///
/// [build.sass]
/// command = ["sassc", "--stdin"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    #[serde(default = "defaults::build::dest")]
    #[educe(Default = defaults::build::dest())]
    pub dest: PathBuf,

    /// Markdown documents, `*.md` directly inside this directory.
    #[serde(default = "defaults::build::posts")]
    #[educe(Default = defaults::build::posts())]
    pub posts: PathBuf,

    /// Layout templates every page and post can wrap itself in.
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Layouts for posts only. Falls back to `layouts` when unset.
    #[serde(default)]
    pub post_layouts: Option<PathBuf>,

    /// Reusable fragments, available as `{{> name}}` partials.
    #[serde(default)]
    pub includes: Option<PathBuf>,

    #[serde(default)]
    pub sass: SassConfig,
}

impl BuildConfig {
    /// Directory that holds post layouts.
    pub fn post_layouts_dir(&self) -> &PathBuf {
        self.post_layouts.as_ref().unwrap_or(&self.layouts)
    }
}

/// `[build.sass]` section - stylesheet preprocessor command.
///
/// The source is piped to stdin, stdout becomes the CSS.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SassConfig {
    #[serde(default = "defaults::build::sass::command")]
    #[educe(Default = defaults::build::sass::command())]
    pub command: Vec<String>,
}
