//! Path classification predicates.
//!
//! A [`PathMatch`] is a pure, shareable `Fn(&Path) -> bool`. Compilers build
//! theirs from the two base predicates and combine them:
//!
//! ```text
//! filename_match("*.scss", hidden, underscore)   glob on the last segment
//! path_match("_posts/*.md", hidden, underscore)  glob on the whole path
//! union / intersect / exclude                    boolean combinators
//! ```
//!
//! Paths are matched as given, which for the build core means relative to
//! the source root. Hidden (`.x`) and underscore (`_x`) exclusion is checked
//! on every segment, so `.b/c.scss` is hidden even though `c.scss` is not.
//!
//! Only `/`-separated paths are supported; backslash paths on Windows are a
//! known limitation.

use crate::error::MatchError;
use glob::{MatchOptions, Pattern};
use std::{
    fmt,
    path::{Component, Path},
    sync::Arc,
};

/// Shell-style matching where `*` and `?` never cross a `/`.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A composable path predicate.
#[derive(Clone)]
pub struct PathMatch(Arc<dyn Fn(&Path) -> bool + Send + Sync>);

impl fmt::Debug for PathMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathMatch(..)")
    }
}

impl PathMatch {
    pub fn new(f: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn matches(&self, path: &Path) -> bool {
        (self.0)(path)
    }

    /// Matches nothing. The identity element of [`union`].
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    /// Match glob `pattern` against the final path segment.
    pub fn filename(
        pattern: &str,
        ignore_hidden: bool,
        ignore_underscore: bool,
    ) -> Result<Self, MatchError> {
        let pattern = compile(pattern)?;
        Ok(Self::new(move |path| {
            if is_excluded(path, ignore_hidden, ignore_underscore) {
                return false;
            }
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches_with(name, GLOB_OPTIONS))
        }))
    }

    /// Match glob `pattern` against the whole path.
    pub fn path(
        pattern: &str,
        ignore_hidden: bool,
        ignore_underscore: bool,
    ) -> Result<Self, MatchError> {
        let pattern = compile(pattern)?;
        Ok(Self::new(move |path| {
            if is_excluded(path, ignore_hidden, ignore_underscore) {
                return false;
            }
            path.to_str()
                .is_some_and(|path| pattern.matches_with(path, GLOB_OPTIONS))
        }))
    }

    /// Match every file directly inside `dir` whose name matches `file_glob`.
    /// Glob metacharacters in `dir` are escaped.
    pub fn in_dir(
        dir: &Path,
        file_glob: &str,
        ignore_hidden: bool,
        ignore_underscore: bool,
    ) -> Result<Self, MatchError> {
        let dir = dir.to_string_lossy();
        let dir = dir.trim_end_matches('/');
        let pattern = if dir.is_empty() || dir == "." {
            file_glob.to_owned()
        } else {
            format!("{}/{file_glob}", Pattern::escape(dir))
        };
        Self::path(&pattern, ignore_hidden, ignore_underscore)
    }
}

/// True iff every predicate is true. Stops at the first false.
pub fn intersect(funcs: impl IntoIterator<Item = PathMatch>) -> PathMatch {
    let funcs: Vec<_> = funcs.into_iter().collect();
    PathMatch::new(move |path| funcs.iter().all(|f| f.matches(path)))
}

/// True iff any predicate is true. Stops at the first true.
pub fn union(funcs: impl IntoIterator<Item = PathMatch>) -> PathMatch {
    let funcs: Vec<_> = funcs.into_iter().collect();
    PathMatch::new(move |path| funcs.iter().any(|f| f.matches(path)))
}

/// True iff `f` is true and no predicate in `excludes` is.
pub fn exclude(f: PathMatch, excludes: impl IntoIterator<Item = PathMatch>) -> PathMatch {
    let excludes: Vec<_> = excludes.into_iter().collect();
    PathMatch::new(move |path| f.matches(path) && !excludes.iter().any(|e| e.matches(path)))
}

/// Any segment starts with `.`.
pub fn is_hidden(path: &Path) -> bool {
    any_segment_starts_with(path, '.')
}

/// Any segment starts with `_`.
pub fn is_underscored(path: &Path) -> bool {
    any_segment_starts_with(path, '_')
}

/// Default filter for files nobody compiles: neither hidden nor underscored.
pub fn no_hidden_no_underscore() -> PathMatch {
    PathMatch::new(|path| !is_hidden(path) && !is_underscored(path))
}

fn is_excluded(path: &Path, ignore_hidden: bool, ignore_underscore: bool) -> bool {
    (ignore_hidden && is_hidden(path)) || (ignore_underscore && is_underscored(path))
}

fn any_segment_starts_with(path: &Path, marker: char) -> bool {
    path.components().any(|c| match c {
        Component::Normal(segment) => segment
            .to_str()
            .is_some_and(|segment| segment.starts_with(marker)),
        _ => false,
    })
}

fn compile(pattern: &str) -> Result<Pattern, MatchError> {
    Pattern::new(pattern).map_err(|source| MatchError {
        pattern: pattern.to_owned(),
        source,
    })
}
