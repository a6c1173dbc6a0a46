// Raw HTTP request mode for pvreplace
//
// Mutates requests saved from an intercepting proxy instead of bare URLs.
// Each request is replayed once per payload, line by line:
//   - lines starting with an ignore prefix are kept verbatim
//   - injectable headers get the payload appended to their value
//   - every other line has each `=value` replaced by the payload
// A blank line separates the blocks of consecutive payloads.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::engine::{emit, Flow, RunStats};
use crate::error::{Error, Result};
use crate::locator::value_sites;
use crate::mutator::splice;

lazy_static! {
    static ref INJECTABLE_HEADER: Regex =
        Regex::new(r"^(User-Agent|Referer|Cookie|X-Forwarded-For|X-Real-IP):\s*(.*)$").unwrap();
}

/// Line-level mutator for raw requests
#[derive(Debug, Clone, Default)]
pub struct RawRequestMutator {
    ignore_prefixes: Vec<String>,
}

impl RawRequestMutator {
    pub fn new(ignore_prefixes: Vec<String>) -> Self {
        // An empty prefix would match every line
        let ignore_prefixes = ignore_prefixes
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { ignore_prefixes }
    }

    pub fn is_ignored(&self, line: &str) -> bool {
        self.ignore_prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    pub fn mutate_line(&self, line: &str, payload: &str) -> String {
        if self.is_ignored(line) {
            return line.to_string();
        }
        if let Some(caps) = INJECTABLE_HEADER.captures(line) {
            return format!("{}: {}{}", &caps[1], &caps[2], payload);
        }
        let sites = value_sites(line, 0);
        if sites.is_empty() {
            return line.to_string();
        }
        splice(line, &sites, |_| format!("={}", payload))
    }

    /// Mutated lines of one request for one payload, without the separator.
    pub fn mutate_request(&self, content: &str, payload: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| self.mutate_line(line, payload))
            .collect()
    }

    /// Write every request file once per payload.
    pub fn run<W: Write>(
        &self,
        files: &[PathBuf],
        payloads: &[String],
        sink: &mut W,
        cancel: &AtomicBool,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();

        for path in files {
            let content = fs::read_to_string(path).map_err(|source| Error::ReadFile {
                path: path.clone(),
                source,
            })?;
            info!("processing raw request {}", path.display());
            stats.lines += content.lines().count();

            for payload in payloads {
                let block = self.mutate_request(&content, payload);
                for line in block.iter().map(String::as_str).chain(std::iter::once("")) {
                    if cancel.load(Ordering::SeqCst) {
                        stats.interrupted = true;
                        return Ok(stats);
                    }
                    if emit(sink, line)? == Flow::Stop {
                        stats.sink_closed = true;
                        return Ok(stats);
                    }
                    stats.emitted += 1;
                }
            }
        }

        debug!(files = files.len(), emitted = stats.emitted, "raw requests done");
        Ok(stats)
    }
}

/// Request files under `path`: the file itself, or the regular files directly
/// inside a directory, sorted by name.
pub fn collect_request_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(0)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| Error::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    if files.is_empty() {
        return Err(Error::NoRawFiles {
            path: path.to_path_buf(),
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_gets_payload_appended() {
        let m = RawRequestMutator::default();
        assert_eq!(
            m.mutate_line("User-Agent: Mozilla/5.0", "FUZZ"),
            "User-Agent: Mozilla/5.0FUZZ"
        );
        assert_eq!(m.mutate_line("Referer:http://a", "'"), "Referer: http://a'");
    }

    #[test]
    fn test_values_replaced_on_other_lines() {
        let m = RawRequestMutator::default();
        assert_eq!(
            m.mutate_line("GET /a?x=1&y=2 HTTP/1.1", "FUZZ"),
            "GET /a?x=FUZZ&y=FUZZ HTTP/1.1"
        );
        assert_eq!(m.mutate_line("Host: x.com", "FUZZ"), "Host: x.com");
    }

    #[test]
    fn test_ignored_prefixes() {
        let m = RawRequestMutator::new(vec!["Cookie".to_string(), " ".to_string()]);
        assert!(m.is_ignored("Cookie: a=b"));
        assert_eq!(m.mutate_line("Cookie: a=b", "FUZZ"), "Cookie: a=b");
        assert!(!m.is_ignored("Host: x.com"));
    }
}
