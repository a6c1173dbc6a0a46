// Payload loading for pvreplace
// Payloads are resolved once, before any URL is read

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Load payloads from a comma-separated list or a `.txt` file.
///
/// A `.txt` source is read one payload per line, skipping blank lines.
/// Anything else is split on ','. Entries are trimmed; duplicates and order
/// are kept as given.
pub fn load_payloads(source: &str) -> Result<Vec<String>> {
    if source.ends_with(".txt") {
        return read_list_file(Path::new(source));
    }
    Ok(split_list(source))
}

/// Percent-encode every payload, reserved characters included.
pub fn encode_payloads(payloads: &[String]) -> Vec<String> {
    payloads
        .iter()
        .map(|p| urlencoding::encode(p).into_owned())
        .collect()
}

/// Comma list split shared by payloads and ignore prefixes.
pub fn split_list(source: &str) -> Vec<String> {
    source.split(',').map(|s| s.trim().to_string()).collect()
}

/// Non-empty trimmed lines of a list file.
pub fn read_list_file(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
