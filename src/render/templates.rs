//! Handlebars template registry.
//!
//! Every `*.hbs` file directly inside the include, layout and post layout
//! directories is registered under its file stem, so it can be used both as
//! a layout (`layout = "base"`) and as a partial (`{{> base}}`). Later
//! directories override earlier ones on a name clash, in the order
//! includes, layouts, post layouts.
//!
//! The `posts` helper exposes the document listing:
//!
//! ```handlebars
//! {{#each (posts 5)}}<a href="{{url}}">{{title}}</a>{{/each}}
//! ```

use crate::{
    config::SiteConfig,
    error::{CompileError, Error, Result},
    log,
};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, ScopedJson,
};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const TEMPLATE_EXTENSION: &str = "hbs";

pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Load templates from `dirs` (missing directories are skipped) and
    /// register the `posts` helper over `posts`, already sorted.
    pub fn load(dirs: &[PathBuf], posts: Vec<Value>) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_helper("posts", Box::new(PostsHelper { posts }));

        for dir in dirs {
            for path in template_files(dir)? {
                let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };
                let source = fs::read_to_string(&path).map_err(|err| Error::io(&path, err))?;
                if registry.has_template(name) {
                    log!("template"; "`{name}` from {} overrides an earlier template", path.display());
                }
                registry
                    .register_template_string(name, source)
                    .map_err(|err| Error::compile(&path, err))?;
            }
        }

        Ok(Self { registry })
    }

    /// Directories templates are loaded from, absolute.
    pub fn dirs(config: &SiteConfig) -> Vec<PathBuf> {
        let build = &config.build;
        let source = config.source();
        build
            .includes
            .iter()
            .chain([&build.layouts])
            .chain(build.post_layouts.iter())
            .map(|dir| source.join(dir))
            .collect()
    }

    pub fn has_layout(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Render the registered template `layout` with `ctx`.
    pub fn render_layout(&self, layout: &str, ctx: &Value) -> Result<String, CompileError> {
        if !self.has_layout(layout) {
            return Err(CompileError::UnknownLayout(layout.to_owned()));
        }
        Ok(self.registry.render(layout, ctx)?)
    }

    /// Render an inline template string with `ctx`.
    pub fn render_str(&self, template: &str, ctx: &Value) -> Result<String, CompileError> {
        Ok(self.registry.render_template(template, ctx)?)
    }
}

/// `*.hbs` files directly inside `dir`, sorted by name.
fn template_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| Error::io(dir, err))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// `posts` / `posts N`: the sorted listing, at most N entries (0 = all).
struct PostsHelper {
    posts: Vec<Value>,
}

impl HelperDef for PostsHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let limit = h
            .param(0)
            .and_then(|param| param.value().as_u64())
            .map_or(0, |limit| limit as usize);
        let end = if limit == 0 {
            self.posts.len()
        } else {
            limit.min(self.posts.len())
        };
        Ok(ScopedJson::Derived(Value::Array(self.posts[..end].to_vec())))
    }
}
