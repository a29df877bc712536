//! Parsed documents shared between compilers.
//!
//! The posts compiler fills the [`DocumentIndex`] during the index stage; the
//! render stage reads it through the `posts` template helper.
//!
//! ```text
//! posts (Index)  ── parse every _posts/*.md ──►  DocumentIndex
//!                                                     │
//! pages (Render) ◄── {{#each (posts 5)}} ─────────────┘
//! ```

mod document;
mod store;

pub use document::{Document, toml_to_json};
pub use store::DocumentIndex;
