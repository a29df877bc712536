//! Format renderers the compilers call through.
//!
//! Each is a plain function of source content (plus context) to output; none
//! of them knows about paths in the output tree or about other compilers.

pub mod markdown;
pub mod sass;
pub mod templates;

pub use templates::Templates;
