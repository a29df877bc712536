//! Markdown posts.
//!
//! Every `*.md` directly inside the posts directory becomes
//! `<dest>/<stem>/index.html`, rendered into the layout its front matter
//! names (or `post` when that layout exists). Posts are also the source of
//! the document index, so this compiler runs in the [`Stage::Index`] stage.

use super::{CreatedArtifacts, Compiler, Site, Stage};
use crate::{
    error::{Error, Result},
    log,
    matcher::{PathMatch, union},
    render::{Templates, templates::TEMPLATE_EXTENSION},
    utils::fs::write_file_with_path,
};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Layout used when a post's front matter names none.
const DEFAULT_LAYOUT: &str = "post";

pub struct PostsCompiler {
    compile_match: PathMatch,
    watch_match: PathMatch,
    artifacts: CreatedArtifacts,
}

impl Default for PostsCompiler {
    fn default() -> Self {
        Self {
            compile_match: PathMatch::never(),
            watch_match: PathMatch::never(),
            artifacts: CreatedArtifacts::new(),
        }
    }
}

impl PostsCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&mut self, src: &Path, templates: &Templates, site: &Site) -> Result<()> {
        let Some(doc) = site.documents.get(src) else {
            return Ok(());
        };

        let post = doc.to_json();
        let ctx = json!({
            "site": site.config.template_site(),
            "post": post,
            "page": post,
            "content": doc.content,
        });

        let html = match doc.layout.as_deref() {
            Some(layout) => templates.render_layout(layout, &ctx),
            None if templates.has_layout(DEFAULT_LAYOUT) => {
                templates.render_layout(DEFAULT_LAYOUT, &ctx)
            }
            None => Ok(doc.content.clone()),
        }
        .map_err(|err| Error::compile(src, err))?;

        let out_dir = site.config.dest().join(&doc.slug);
        let out = out_dir.join("index.html");
        write_file_with_path(&out, html)?;
        self.artifacts.record_file(out);
        self.artifacts.record_dir(out_dir);

        log!("create"; "{} -> {}/index.html", site.relative(src).display(), doc.slug);
        Ok(())
    }

    fn load_templates(site: &Site) -> Result<Templates> {
        Templates::load(&Templates::dirs(&site.config), site.documents.to_json())
    }
}

impl Compiler for PostsCompiler {
    fn name(&self) -> &'static str {
        "posts"
    }

    fn stage(&self) -> Stage {
        Stage::Index
    }

    fn init(&mut self, site: &Site) -> Result<()> {
        let build = &site.config.build;
        self.compile_match = PathMatch::in_dir(&build.posts, "*.md", true, false)?;

        let template_glob = format!("*.{TEMPLATE_EXTENSION}");
        let mut watched = vec![
            self.compile_match.clone(),
            PathMatch::in_dir(build.post_layouts_dir(), &template_glob, true, false)?,
            PathMatch::in_dir(&build.layouts, &template_glob, true, false)?,
        ];
        if let Some(includes) = &build.includes {
            watched.push(PathMatch::in_dir(includes, &template_glob, true, false)?);
        }
        self.watch_match = union(watched);
        Ok(())
    }

    fn compile_match(&self) -> &PathMatch {
        &self.compile_match
    }

    fn watch_match(&self) -> &PathMatch {
        &self.watch_match
    }

    fn compile(&mut self, src: &Path, site: &mut Site) -> Result<()> {
        site.documents.get_or_create(src).parse()?;
        let templates = Self::load_templates(site)?;
        self.render(src, &templates, site)
    }

    /// Rebuild the document index from `srcs`, then render every post, so
    /// each one sees the complete listing.
    fn compile_all(&mut self, srcs: &[PathBuf], site: &mut Site) -> Result<()> {
        site.documents.clear();
        for src in srcs {
            site.documents.get_or_create(src).parse()?;
        }
        log!("posts"; "indexed {} documents", site.documents.len());

        let templates = Self::load_templates(site)?;
        for src in srcs {
            self.render(src, &templates, site)?;
        }
        Ok(())
    }

    fn remove_old(&mut self) -> Result<()> {
        self.artifacts.remove_all()
    }
}
