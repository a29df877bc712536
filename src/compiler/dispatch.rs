//! Compiler registry and build dispatch.
//!
//! A full build runs four phases:
//!
//! 1. **init**: every compiler, in registration order
//! 2. **partition**: one walk of the source tree; each file goes to every
//!    compiler whose `compile_match` accepts it, or to `unmatched`
//! 3. **compile**: each compiler's `compile_all` with its files in walk order
//! 4. **copy**: unmatched files are copied verbatim into the output tree
//!
//! Watch events go through [`Dispatcher::file_changed`], which hands the path
//! to every compiler whose `watch_match` accepts it.

use super::{
    ChangeKind, Compiler, Site, pages::PagesCompiler, posts::PostsCompiler, sass::SassCompiler,
    walk_source,
};
use crate::{
    config::SiteConfig,
    error::{Error, Result},
    log,
    matcher::{PathMatch, no_hidden_no_underscore},
    utils::fs::copy_file,
};
use std::path::{Path, PathBuf};

/// Source files split among compilers.
#[derive(Debug, Default)]
pub struct Partition {
    /// Per compiler, in registration order; paths in walk order
    pub matched: Vec<Vec<PathBuf>>,
    /// Files no compiler claims, to be copied verbatim
    pub unmatched: Vec<PathBuf>,
}

pub struct Dispatcher {
    compilers: Vec<Box<dyn Compiler>>,
    site: Site,
    fallback: PathMatch,
}

impl Dispatcher {
    /// Register `compilers` in order.
    ///
    /// Every [`Stage::Index`](super::Stage::Index) compiler must come before
    /// every `Render` compiler, since renderers may list documents the
    /// index builders produce.
    pub fn new(site: Site, compilers: Vec<Box<dyn Compiler>>) -> Result<Self> {
        for pair in compilers.windows(2) {
            if pair[0].stage() > pair[1].stage() {
                return Err(Error::Registry(format!(
                    "`{}` ({:?} stage) is registered after `{}` ({:?} stage)",
                    pair[1].name(),
                    pair[1].stage(),
                    pair[0].name(),
                    pair[0].stage(),
                )));
            }
        }

        Ok(Self {
            compilers,
            site,
            fallback: no_hidden_no_underscore(),
        })
    }

    /// The built-in compiler set: posts, then sass, then pages.
    pub fn with_default_compilers(config: SiteConfig) -> Result<Self> {
        let compilers: Vec<Box<dyn Compiler>> = vec![
            Box::new(PostsCompiler::new()),
            Box::new(SassCompiler::new()),
            Box::new(PagesCompiler::new()),
        ];
        Self::new(Site::new(config), compilers)
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn compiler_names(&self) -> Vec<&'static str> {
        self.compilers.iter().map(|c| c.name()).collect()
    }

    /// Call `init` on every compiler, in registration order.
    pub fn init(&mut self) -> Result<()> {
        for compiler in &mut self.compilers {
            compiler.init(&self.site)?;
        }
        Ok(())
    }

    /// Walk the source tree once and split it among compilers.
    pub fn partition(&self) -> Result<Partition> {
        let config = &self.site.config;
        let mut partition = Partition {
            matched: vec![Vec::new(); self.compilers.len()],
            unmatched: Vec::new(),
        };

        for entry in walk_source(config.source(), config.dest()) {
            let (path, rel) = entry?;

            let owners: Vec<usize> = self
                .compilers
                .iter()
                .enumerate()
                .filter(|(_, compiler)| compiler.compile_match().matches(&rel))
                .map(|(index, _)| index)
                .collect();

            if owners.len() > 1 {
                let names: Vec<_> = owners.iter().map(|&i| self.compilers[i].name()).collect();
                log!("dispatch"; "`{}` is matched by {}, compiling with each", rel.display(), names.join(", "));
            }

            if owners.is_empty() {
                if self.fallback.matches(&rel) {
                    partition.unmatched.push(path);
                }
            } else {
                for index in owners {
                    partition.matched[index].push(path.clone());
                }
            }
        }

        Ok(partition)
    }

    /// Cold build: init, partition, compile, copy. Stops at the first error.
    pub fn compile_all(&mut self) -> Result<()> {
        self.init()?;
        let partition = self.partition()?;

        for (compiler, paths) in self.compilers.iter_mut().zip(&partition.matched) {
            if paths.is_empty() {
                continue;
            }
            log!("build"; "{}: {} files", compiler.name(), paths.len());
            compiler.compile_all(paths, &mut self.site)?;
        }

        for src in &partition.unmatched {
            copy_file(src, &self.site.mirror(src))?;
        }
        if !partition.unmatched.is_empty() {
            log!("build"; "copied {} files", partition.unmatched.len());
        }

        Ok(())
    }

    /// Route a change of `path` (absolute) to every compiler watching it.
    ///
    /// Returns how many compilers reacted. Changes nobody watches are only
    /// logged: new static files are picked up by the next full build.
    pub fn file_changed(&mut self, path: &Path, kind: ChangeKind) -> Result<usize> {
        let Ok(rel) = path.strip_prefix(self.site.config.source()) else {
            return Ok(0);
        };
        let rel = rel.to_path_buf();

        let mut reacted = 0;
        for compiler in &mut self.compilers {
            if compiler.watch_match().matches(&rel) {
                log!("watch"; "{}: recompiling for {}", compiler.name(), rel.display());
                compiler.on_change(path, kind, &mut self.site)?;
                reacted += 1;
            }
        }

        if reacted == 0 && self.fallback.matches(&rel) {
            log!("watch"; "unmatched change: {} (copied on next full build)", rel.display());
        }
        Ok(reacted)
    }
}
