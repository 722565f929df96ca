//! Locator records
//!
//! A registry file is a sequence of locator records, one per line.

use std::path::Path;

use url::Url;

use crate::error::{RegistryError, Result};

/// Encode a locator as a single newline-terminated line
///
/// `Url` serialization never contains a line break, so each record is
/// exactly one line.
pub fn encode_record(locator: &Url) -> String {
    let mut line = String::with_capacity(locator.as_str().len() + 1);
    line.push_str(locator.as_str());
    line.push('\n');
    line
}

/// Parse the full contents of a registry file
///
/// Blank lines are skipped. The first line that is not a valid URL fails
/// the whole file; no partial result is returned.
pub fn parse_records(content: &str, path: &Path) -> Result<Vec<Url>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            Url::parse(line).map_err(|source| RegistryError::MalformedRecord {
                line: line.to_string(),
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}
