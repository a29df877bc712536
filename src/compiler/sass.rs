//! Stylesheets: `*.scss` → `*.css`.
//!
//! Partials (`_name.scss`) are never compiled on their own, but a change to
//! one recompiles every stylesheet, since any of them may import it.

use super::{CreatedArtifacts, Compiler, Site};
use crate::{
    error::{Error, Result},
    log,
    matcher::PathMatch,
    render::sass,
    utils::fs::write_file_with_path,
};
use std::path::Path;

pub struct SassCompiler {
    compile_match: PathMatch,
    watch_match: PathMatch,
    artifacts: CreatedArtifacts,
}

impl Default for SassCompiler {
    fn default() -> Self {
        Self {
            compile_match: PathMatch::never(),
            watch_match: PathMatch::never(),
            artifacts: CreatedArtifacts::new(),
        }
    }
}

impl SassCompiler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Compiler for SassCompiler {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn init(&mut self, _site: &Site) -> Result<()> {
        self.compile_match = PathMatch::filename("*.scss", true, true)?;
        self.watch_match = PathMatch::filename("*.scss", true, false)?;
        Ok(())
    }

    fn compile_match(&self) -> &PathMatch {
        &self.compile_match
    }

    fn watch_match(&self) -> &PathMatch {
        &self.watch_match
    }

    fn compile(&mut self, src: &Path, site: &mut Site) -> Result<()> {
        let css = sass::render(src, &site.config.build.sass.command)
            .map_err(|err| Error::compile(src, err))?;

        let dest = site.mirror(src).with_extension("css");
        write_file_with_path(&dest, css)?;
        self.artifacts.record_file(&dest);

        log!("create"; "{} -> {}", site.relative(src).display(), dest.display());
        Ok(())
    }

    fn remove_old(&mut self) -> Result<()> {
        self.artifacts.remove_all()
    }
}
