//! File system watcher for live recompilation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   mpsc    ┌───────────────────────────────────────────┐
//! │  notify  │ ────────► │ WatchLoop (one event at a time)           │
//! │ watcher  │           │                                           │
//! └──────────┘           │  hidden / dest / dir?  ──► skip           │
//!      ▲                 │  signature unchanged   ──► skip           │
//!      │ new dirs        │  otherwise             ──► Dispatcher     │
//!      └──────────────── │                          .file_changed()  │
//!                        └───────────────────────────────────────────┘
//! ```
//!
//! Each source directory gets its own non-recursive watch so hidden
//! directories are never watched. Directories created later are registered
//! when their create event arrives.
//!
//! Errors from a single rebuild, or from watching one new directory, are
//! chimed and the loop keeps going; only a broken event source ends it.

mod signature;

pub use signature::FileSignatureStore;

use crate::{
    chime,
    compiler::{ChangeKind, Dispatcher},
    error::{Error, Result},
    log,
    matcher::is_hidden,
};
use notify::{Event, EventKind, RecursiveMode, Watcher, event::ModifyKind};
use std::{
    path::{Path, PathBuf},
    sync::mpsc,
};
use walkdir::WalkDir;

pub struct WatchLoop {
    dispatcher: Dispatcher,
    signatures: FileSignatureStore,
}

impl WatchLoop {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            signatures: FileSignatureStore::new(),
        }
    }

    fn source(&self) -> &Path {
        self.dispatcher.site().config.source()
    }

    fn dest(&self) -> &Path {
        self.dispatcher.site().config.dest()
    }

    /// Source-relative path, or `None` for paths the loop never reacts to:
    /// outside the source, inside the destination, or hidden.
    fn watchable(&self, path: &Path) -> Option<PathBuf> {
        if path.starts_with(self.dest()) {
            return None;
        }
        let rel = path.strip_prefix(self.source()).ok()?;
        (!is_hidden(rel)).then(|| rel.to_path_buf())
    }

    /// Non-hidden directories under `root` (itself included), skipping dest.
    fn dirs_under(&self, root: &Path) -> Vec<PathBuf> {
        let dest = self.dest();
        WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| {
                entry.file_type().is_dir()
                    && entry.path() != dest
                    && (entry.depth() == 0 || self.watchable(entry.path()).is_some())
            })
            .filter_map(|entry| entry.ok())
            .map(walkdir::DirEntry::into_path)
            .collect()
    }

    /// Record the signature of every watchable file, so the first event for
    /// an untouched file is absorbed and deleting a file that existed at
    /// startup counts as a change.
    pub fn prime(&mut self) -> Result<()> {
        let files: Vec<PathBuf> = WalkDir::new(self.source())
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || self.watchable(entry.path()).is_some())
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .collect();

        for file in files {
            self.signatures.record(&file)?;
        }
        Ok(())
    }

    /// React to one changed path. Returns whether it was a real change.
    pub fn handle_path(&mut self, path: &Path, kind: ChangeKind) -> Result<bool> {
        let Some(rel) = self.watchable(path) else {
            return Ok(false);
        };
        if path.is_dir() {
            return Ok(false);
        }
        if !self.signatures.has_changed(path)? {
            return Ok(false);
        }

        log!("watch"; "changed: {}", rel.display());
        self.dispatcher.file_changed(path, kind)?;
        Ok(true)
    }

    /// Register a watch on `dir` and every watchable directory below it.
    /// Files already inside a freshly created or moved-in directory are
    /// handled as created.
    fn register(&mut self, watcher: &mut impl Watcher, dir: &Path, scan: bool) -> Result<()> {
        for sub in self.dirs_under(dir) {
            watcher.watch(&sub, RecursiveMode::NonRecursive)?;
        }
        if scan {
            let files: Vec<PathBuf> = WalkDir::new(dir)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .collect();
            for file in files {
                report(self.handle_path(&file, ChangeKind::Created));
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, watcher: &mut impl Watcher, event: Event) {
        let Some(kind) = change_kind(&event.kind) else {
            return;
        };

        for path in &event.paths {
            if path.is_dir() {
                if brings_new_dir(&event.kind) && self.watchable(path).is_some() {
                    log!("watch"; "watching new directory {}", path.display());
                    report(self.register(watcher, path, true));
                }
                continue;
            }
            report(self.handle_path(path, kind));
        }
    }

    /// Watch the source tree and recompile on change. Blocks until the
    /// event channel closes.
    pub fn run(mut self) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;

        let source = self.source().to_path_buf();
        self.register(&mut watcher, &source, false)?;
        self.prime()?;
        log!("watch"; "watching {} ({} files)", source.display(), self.signatures.len());

        for event in rx {
            self.handle_event(&mut watcher, event?);
        }
        Ok(())
    }
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Created or renamed-in directories need a watch of their own.
fn brings_new_dir(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

/// Chime a failed reaction with its cause chain; the loop carries on.
fn report<T>(result: Result<T>) {
    if let Err(err) = result {
        chime!("{}", error_chain(&err));
    }
}

fn error_chain(err: &Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_support::{site_config, write};
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RenameMode};
    use std::fs;
    use tempfile::TempDir;

    fn watch_loop(dir: &TempDir) -> WatchLoop {
        let config = site_config(dir, "[build.sass]\ncommand = [\"cat\"]");
        let source = config.source().to_path_buf();
        write(&source.join("_layouts/base.hbs"), "<body>{{{content}}}</body>");
        write(&source.join("index.hbs"), "+++\nlayout = \"base\"\n+++\n{{#each (posts)}}{{title}}{{/each}}");
        write(&source.join("style.scss"), "a{}");

        let mut dispatcher = Dispatcher::with_default_compilers(config).unwrap();
        dispatcher.compile_all().unwrap();
        let mut watch = WatchLoop::new(dispatcher);
        watch.prime().unwrap();
        watch
    }

    #[test]
    fn test_double_event_triggers_one_recompile() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let style = watch.source().join("style.scss");
        let css = watch.dest().join("style.css");

        write(&style, "b{}");
        assert!(watch.handle_path(&style, ChangeKind::Modified).unwrap());
        assert_eq!(fs::read_to_string(&css).unwrap(), "b{}");

        // the output is removed out from under us: a second recompile
        // would bring it back
        fs::remove_file(&css).unwrap();
        assert!(!watch.handle_path(&style, ChangeKind::Modified).unwrap());
        assert!(!css.exists());
    }

    #[test]
    fn test_primed_unchanged_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let style = watch.source().join("style.scss");
        assert!(!watch.handle_path(&style, ChangeKind::Modified).unwrap());
    }

    #[test]
    fn test_hidden_and_dest_paths_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let hidden = watch.source().join(".cache/x.scss");
        let output = watch.dest().join("style.css");
        write(&hidden, "x");

        assert!(!watch.handle_path(&hidden, ChangeKind::Created).unwrap());
        assert!(!watch.handle_path(&output, ChangeKind::Modified).unwrap());
        assert!(watch.watchable(&hidden).is_none());
    }

    #[test]
    fn test_new_post_rebuilds_listing() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let post = watch.source().join("_posts/new.md");
        write(&post, "+++\ntitle = \"New\"\n+++\nbody");

        assert!(watch.handle_path(&post, ChangeKind::Created).unwrap());

        let index = fs::read_to_string(watch.dest().join("index.html")).unwrap();
        assert_eq!(index, "<body>New</body>");
        assert!(watch.dest().join("new/index.html").exists());
    }

    #[test]
    fn test_deleted_post_is_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let post = watch.source().join("_posts/gone.md");
        write(&post, "bye");
        watch.handle_path(&post, ChangeKind::Created).unwrap();
        assert!(watch.dest().join("gone/index.html").exists());

        fs::remove_file(&post).unwrap();
        assert!(watch.handle_path(&post, ChangeKind::Removed).unwrap());
        assert!(!watch.dest().join("gone").exists());
    }

    #[test]
    fn test_vanished_unknown_file_is_not_a_change() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let temp = watch.source().join("style.scss~");
        assert!(!watch.handle_path(&temp, ChangeKind::Removed).unwrap());
    }

    #[test]
    fn test_unmatched_change_is_only_logged() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let logo = watch.source().join("logo.png");
        write(&logo, "png");

        assert!(watch.handle_path(&logo, ChangeKind::Created).unwrap());
        assert!(!watch.dest().join("logo.png").exists());
    }

    /// Records watch requests; refuses all of them when `fail` is set.
    #[derive(Default)]
    struct StubWatcher {
        watched: Vec<PathBuf>,
        fail: bool,
    }

    impl Watcher for StubWatcher {
        fn new<F: notify::EventHandler>(_: F, _: notify::Config) -> notify::Result<Self> {
            Ok(Self::default())
        }

        fn watch(&mut self, path: &Path, _: RecursiveMode) -> notify::Result<()> {
            self.watched.push(path.to_path_buf());
            if self.fail {
                return Err(notify::Error::path_not_found());
            }
            Ok(())
        }

        fn unwatch(&mut self, _: &Path) -> notify::Result<()> {
            Ok(())
        }

        fn kind() -> notify::WatcherKind {
            notify::WatcherKind::NullWatcher
        }
    }

    #[test]
    fn test_unwatchable_new_dir_keeps_loop_running() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let mut watcher = StubWatcher {
            fail: true,
            ..StubWatcher::default()
        };
        let notes = watch.source().join("notes");
        write(&notes.join("a.scss"), "a{}");

        let created = Event::new(EventKind::Create(CreateKind::Folder)).add_path(notes.clone());
        watch.handle_event(&mut watcher, created);
        assert_eq!(watcher.watched, [notes]);

        let style = watch.source().join("style.scss");
        write(&style, "c{}");
        let modified =
            Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(style);
        watch.handle_event(&mut watcher, modified);
        assert_eq!(fs::read_to_string(watch.dest().join("style.css")).unwrap(), "c{}");
    }

    #[test]
    fn test_moved_in_dir_is_watched_and_scanned() {
        let dir = TempDir::new().unwrap();
        let mut watch = watch_loop(&dir);
        let mut watcher = StubWatcher::default();
        let moved = watch.source().join("moved");
        write(&moved.join("deep/x.scss"), "x{}");

        let renamed =
            Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To))).add_path(moved.clone());
        watch.handle_event(&mut watcher, renamed);

        assert!(watcher.watched.contains(&moved));
        assert!(watcher.watched.contains(&moved.join("deep")));
        let css = watch.dest().join("moved/deep/x.css");
        assert_eq!(fs::read_to_string(css).unwrap(), "x{}");
    }

    #[test]
    fn test_brings_new_dir() {
        assert!(brings_new_dir(&EventKind::Create(CreateKind::Folder)));
        assert!(brings_new_dir(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!brings_new_dir(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
    }

    #[test]
    fn test_dirs_under_skips_hidden_and_dest() {
        let dir = TempDir::new().unwrap();
        let watch = watch_loop(&dir);
        let source = watch.source().to_path_buf();
        fs::create_dir_all(source.join(".git/objects")).unwrap();
        fs::create_dir_all(source.join("notes/deep")).unwrap();

        let dirs = watch.dirs_under(&source);

        assert!(dirs.contains(&source));
        assert!(dirs.contains(&source.join("notes/deep")));
        assert!(dirs.contains(&source.join("_layouts")));
        assert!(!dirs.iter().any(|d| d.starts_with(source.join(".git"))));
    }

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(
            change_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            change_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(change_kind(&EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn test_error_chain_includes_cause() {
        let err = Error::compile("a.md", crate::error::CompileError::MissingLayout);
        assert_eq!(
            error_chain(&err),
            "failed to compile `a.md`: front matter has no `layout` key"
        );
    }
}
