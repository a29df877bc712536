//! Compilers and the dispatch engine.
//!
//! - **posts**: `_posts/*.md` → `<dest>/<stem>/index.html`, fills the document index
//! - **sass**: `*.scss` → `*.css` through an external command
//! - **pages**: `*.hbs` page templates → `*.html`
//! - **dispatch**: walks the source tree, partitions it among compilers,
//!   copies what nobody claims, and routes watch events
//!
//! # Build Flow
//!
//! ```text
//! init() ──► partition() ──► compile_all() per compiler ──► copy unmatched
//!              │                 │
//!              ▼                 ▼
//!        one tree walk     Index stage first, then Render
//! ```
//!
//! Match predicates see paths relative to the source root; `compile` and
//! friends take absolute paths.

pub mod artifacts;
pub mod dispatch;
pub mod pages;
pub mod posts;
pub mod sass;

pub use artifacts::CreatedArtifacts;
pub use dispatch::Dispatcher;

use crate::{
    config::SiteConfig,
    data::DocumentIndex,
    error::{Error, Result},
    matcher::{PathMatch, is_hidden},
    utils::fs::{mirror_path, remove_empty_dirs},
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// When a compiler runs relative to the others.
///
/// Compilers that fill the document index run in the `Index` stage; anything
/// that may list documents runs in `Render`, after every index builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Index,
    Render,
}

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// State shared by all compilers during one build.
#[derive(Debug)]
pub struct Site {
    pub config: SiteConfig,
    pub documents: DocumentIndex,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            documents: DocumentIndex::new(),
        }
    }

    /// `path` relative to the source root (unchanged if outside it).
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(self.config.source()).unwrap_or(path)
    }

    /// Output location mirroring `src`.
    pub fn mirror(&self, src: &Path) -> PathBuf {
        mirror_path(src, self.config.source(), self.config.dest())
    }

    /// Every file under the source root whose relative path `matcher` accepts.
    pub fn find_paths(&self, matcher: &PathMatch) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in walk_source(self.config.source(), self.config.dest()) {
            let (path, rel) = entry?;
            if matcher.matches(&rel) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

/// One category of source file: what it matches, how it compiles, and how it
/// cleans up after itself.
pub trait Compiler: Send {
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage {
        Stage::Render
    }

    /// One-time setup before matching, e.g. building match patterns from
    /// the configuration.
    fn init(&mut self, _site: &Site) -> Result<()> {
        Ok(())
    }

    /// Paths this compiler turns into output.
    fn compile_match(&self) -> &PathMatch;

    /// Paths whose change affects this compiler's output. A superset of
    /// [`Compiler::compile_match`].
    fn watch_match(&self) -> &PathMatch;

    fn compile(&mut self, src: &Path, site: &mut Site) -> Result<()>;

    /// Compile a batch in the given order, stopping at the first error.
    fn compile_all(&mut self, srcs: &[PathBuf], site: &mut Site) -> Result<()> {
        for src in srcs {
            self.compile(src, site)?;
        }
        Ok(())
    }

    /// Delete everything this compiler has produced.
    fn remove_old(&mut self) -> Result<()>;

    /// React to a change of a watched path. Recompiles everything this
    /// compiler owns from a fresh walk.
    fn on_change(&mut self, _src: &Path, _kind: ChangeKind, site: &mut Site) -> Result<()> {
        self.remove_old()?;
        remove_empty_dirs(site.config.dest())?;
        let paths = site.find_paths(self.compile_match())?;
        self.compile_all(&paths, site)
    }
}

/// Files under `source` in a deterministic depth-first order, paired with
/// their source-relative path.
///
/// Hidden directories are not descended into, nor is `dest` when it lives
/// inside `source`.
pub fn walk_source<'a>(
    source: &'a Path,
    dest: &'a Path,
) -> impl Iterator<Item = Result<(PathBuf, PathBuf)>> + 'a {
    WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            if entry.path() == dest {
                return false;
            }
            let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
            !(entry.file_type().is_dir() && is_hidden(rel))
        })
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.into_path();
                let rel = path.strip_prefix(source).unwrap_or(&path).to_path_buf();
                Some(Ok((path, rel)))
            }
            Ok(_) => None,
            Err(err) => {
                let path = err.path().unwrap_or(source).to_path_buf();
                Some(Err(Error::io(path, err.into())))
            }
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::SiteConfig;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    /// A project under a temp dir with `source/` and `public/`, rooted there.
    pub fn site_config(dir: &TempDir, toml: &str) -> SiteConfig {
        fs::create_dir_all(dir.path().join("source")).unwrap();
        let mut config = SiteConfig::parse(Path::new("scriv.toml"), toml).unwrap();
        config.update_path_with_root(dir.path());
        config
    }

    pub fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}
