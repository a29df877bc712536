//! Utility modules for the static site generator.

pub mod date;
pub mod exec;
pub mod front_matter;
pub mod fs;
