//! A single markdown document and its front matter.

use crate::{
    error::{CompileError, Error, Result},
    render::markdown,
    utils::{date, front_matter},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Front matter keys with a dedicated field; everything else lands in `meta`.
const KNOWN_KEYS: &[&str] = &["title", "author", "description", "date", "layout"];

/// One document, exposed to templates as a JSON object.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    /// Absolute source path, the index key
    #[serde(skip)]
    pub path: PathBuf,

    /// File stem, used as the output directory name
    pub slug: String,

    /// `/<slug>`
    pub url: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Publication timestamp, used for ordering
    #[serde(skip)]
    pub published: Option<NaiveDateTime>,

    /// `published` as `YYYY-MM-DD` for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Layout template name, without extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Remaining front matter keys
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,

    /// Rendered HTML body
    pub content: String,
}

impl Document {
    /// An unparsed document for `path`.
    pub fn new(path: &Path) -> Self {
        let slug = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            url: format!("/{slug}"),
            title: slug.clone(),
            slug,
            ..Self::default()
        }
    }

    /// Re-read front matter and body from disk.
    pub fn parse(&mut self) -> Result<()> {
        let bytes = fs::read(&self.path).map_err(|err| Error::io(&self.path, err))?;
        let content =
            String::from_utf8(bytes).map_err(|err| Error::compile(&self.path, err))?;
        self.parse_str(&content)
            .map_err(|err| Error::compile(&self.path, err))
    }

    fn parse_str(&mut self, content: &str) -> Result<(), CompileError> {
        let (front, body) = front_matter::parse(content)?;

        self.title = string_field(&front, "title").unwrap_or_else(|| self.slug.clone());
        self.author = string_field(&front, "author");
        self.description = string_field(&front, "description");
        self.layout = string_field(&front, "layout");

        self.published = match front.get("date") {
            Some(value) => Some(
                date::from_toml(value).ok_or_else(|| CompileError::InvalidDate(value.to_string()))?,
            ),
            None => None,
        };
        self.date = self.published.map(|dt| dt.format("%Y-%m-%d").to_string());

        self.meta = front
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), toml_to_json(value)))
            .collect();

        self.content = markdown::to_html(body);
        Ok(())
    }

    /// Template context value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn string_field(table: &toml::Table, key: &str) -> Option<String> {
    table.get(key).and_then(toml::Value::as_str).map(str::to_owned)
}

/// TOML to JSON, with datetimes as their string form.
pub fn toml_to_json(value: &toml::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(key, value)| (key.clone(), toml_to_json(value)))
                .collect(),
        ),
    }
}
