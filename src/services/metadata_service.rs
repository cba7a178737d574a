use std::io::{self, BufRead};

use serde::Deserialize;

use crate::errors::WikiError;

/// Line opening and closing a front matter block
pub const DELIMITER: &str = "---";

/// Page metadata carried in front matter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub tags: Vec<String>,
    pub draft: bool,
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Read the front matter block from the leading lines of a Markdown file.
///
/// Blank lines before the opening delimiter are skipped. Returns the lines
/// between the delimiters, or [`WikiError::MetadataNotFound`] when the first
/// non-blank line is not a delimiter or the block is never closed.
pub fn read_meta<R: BufRead>(reader: R) -> Result<Vec<String>, WikiError> {
    let mut found = false;
    let mut meta = Vec::new();

    // Lines are split as bytes: only the block itself has to be UTF-8.
    for line in reader.split(b'\n') {
        let line = line?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
        if !found {
            if line.trim_ascii().is_empty() {
                continue;
            }
            if line == DELIMITER.as_bytes() {
                found = true;
                continue;
            }
            return Err(WikiError::MetadataNotFound);
        }
        if line == DELIMITER.as_bytes() {
            return Ok(meta);
        }
        let text = std::str::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        meta.push(text.to_string());
    }
    Err(WikiError::MetadataNotFound)
}

/// Parse front matter lines into [`Meta`]
pub fn parse_meta(lines: &[String]) -> Result<Meta, WikiError> {
    let text = lines.join("\n");
    if is_blank(&text) {
        return Ok(Meta::default());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(&text)?;
    if value.is_null() {
        return Ok(Meta::default());
    }
    Ok(serde_yaml::from_value(value)?)
}

/// Return the Markdown body with a leading front matter block removed
pub fn strip_front_matter(raw: &str) -> &str {
    let mut offset = 0;
    let mut found = false;
    for line in raw.split_inclusive('\n') {
        let end = offset + line.len();
        let text = strip_cr(line.trim_end_matches('\n'));
        if !found {
            if is_blank(text) {
                offset = end;
                continue;
            }
            if text != DELIMITER {
                return raw;
            }
            found = true;
        } else if text == DELIMITER {
            return &raw[end..];
        }
        offset = end;
    }
    raw
}
