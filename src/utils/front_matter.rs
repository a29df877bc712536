//! Front matter splitting.
//!
//! A source file may start with a TOML block fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "Hello"
//! layout = "post"
//! +++
//! # Body
//! ```

use crate::error::CompileError;

const DELIMITER: &str = "+++";

/// Split `content` into `(front_matter, body)`.
///
/// Files that do not open with the delimiter have an empty front matter.
pub fn split(content: &str) -> Result<(&str, &str), CompileError> {
    let Some(rest) = strip_delimiter_line(content) else {
        return Ok(("", content));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(CompileError::UnterminatedFrontMatter)
}

/// Split and decode the front matter as a TOML table.
pub fn parse(content: &str) -> Result<(toml::Table, &str), CompileError> {
    let (front, body) = split(content)?;
    Ok((toml::from_str(front)?, body))
}

fn strip_delimiter_line(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(DELIMITER)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}
