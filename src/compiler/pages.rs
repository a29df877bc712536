//! Handlebars pages: `*.hbs` → `*.html`.
//!
//! A page names its layout in front matter. The page body is rendered as a
//! template first, then handed to the layout as `content`:
//!
//! ```text
//! +++
//! layout = "base"
//! title = "Archive"
//! +++
//! {{#each (posts)}}<a href="{{url}}">{{title}}</a>{{/each}}
//! ```
//!
//! Pages may list posts, so they re-render whenever a post changes.

use super::{CreatedArtifacts, Compiler, Site};
use crate::{
    data::toml_to_json,
    error::{CompileError, Error, Result},
    log,
    matcher::{PathMatch, exclude, union},
    render::{Templates, templates::TEMPLATE_EXTENSION},
    utils::{front_matter, fs::write_file_with_path},
};
use serde_json::{Value, json};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct PagesCompiler {
    compile_match: PathMatch,
    watch_match: PathMatch,
    artifacts: CreatedArtifacts,
}

impl Default for PagesCompiler {
    fn default() -> Self {
        Self {
            compile_match: PathMatch::never(),
            watch_match: PathMatch::never(),
            artifacts: CreatedArtifacts::new(),
        }
    }
}

impl PagesCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile_with(&mut self, src: &Path, templates: &Templates, site: &Site) -> Result<()> {
        let content = fs::read_to_string(src).map_err(|err| Error::io(src, err))?;
        let html = render_page(&content, templates, site.config.template_site())
            .map_err(|err| Error::compile(src, err))?;

        let dest = site.mirror(src).with_extension("html");
        write_file_with_path(&dest, html)?;
        self.artifacts.record_file(&dest);

        log!("create"; "{} -> {}", site.relative(src).display(), dest.display());
        Ok(())
    }
}

fn render_page(content: &str, templates: &Templates, site: Value) -> Result<String, CompileError> {
    let (front, body) = front_matter::parse(content)?;
    let layout = front
        .get("layout")
        .and_then(toml::Value::as_str)
        .ok_or(CompileError::MissingLayout)?
        .to_owned();

    let page = toml_to_json(&toml::Value::Table(front));
    let mut ctx = json!({ "site": site, "page": page });
    let body = templates.render_str(body, &ctx)?;
    ctx["content"] = Value::String(body);

    templates.render_layout(&layout, &ctx)
}

impl Compiler for PagesCompiler {
    fn name(&self) -> &'static str {
        "pages"
    }

    fn init(&mut self, site: &Site) -> Result<()> {
        let build = &site.config.build;
        let template_glob = format!("*.{TEMPLATE_EXTENSION}");

        let template_dirs = build
            .includes
            .iter()
            .chain([&build.layouts])
            .chain(build.post_layouts.iter())
            .map(|dir| PathMatch::in_dir(dir, &template_glob, true, false))
            .collect::<Result<Vec<_>, _>>()?;
        self.compile_match = exclude(
            PathMatch::filename(&template_glob, true, true)?,
            template_dirs,
        );

        let post_layouts = match &build.post_layouts {
            Some(dir) => vec![PathMatch::in_dir(dir, &template_glob, true, false)?],
            None => Vec::new(),
        };
        self.watch_match = union([
            exclude(PathMatch::filename(&template_glob, true, false)?, post_layouts),
            PathMatch::in_dir(&build.posts, "*.md", true, false)?,
        ]);
        Ok(())
    }

    fn compile_match(&self) -> &PathMatch {
        &self.compile_match
    }

    fn watch_match(&self) -> &PathMatch {
        &self.watch_match
    }

    fn compile(&mut self, src: &Path, site: &mut Site) -> Result<()> {
        let templates = Templates::load(&Templates::dirs(&site.config), site.documents.to_json())?;
        self.compile_with(src, &templates, site)
    }

    fn compile_all(&mut self, srcs: &[PathBuf], site: &mut Site) -> Result<()> {
        let templates = Templates::load(&Templates::dirs(&site.config), site.documents.to_json())?;
        for src in srcs {
            self.compile_with(src, &templates, site)?;
        }
        Ok(())
    }

    fn remove_old(&mut self) -> Result<()> {
        self.artifacts.remove_all()
    }
}
