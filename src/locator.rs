// Part Locator
//
// Finds the spans of a URL that a given PartKind targets. Nothing here
// mutates; the combiner in mutator.rs turns sites into output URLs.
//
// URLs are never parsed canonically. The locator only carves out two
// regions textually:
//   query: from the first '?' before any '#', up to '#' or end of string
//   path:  from the first '/' after "scheme://" (or a leading "//")
//          up to '?', '#' or end
//
// Example:
//   Input:  "http://x.com/admin/index.php?a=1&b=2", ParamValue
//   Output: [Site(30..32), Site(34..36)]   // "=1", "=2"

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

use crate::models::{PartKind, Site};

/// Script extensions that mark a path segment as a filename.
pub const SCRIPT_EXTENSIONS: [&str; 6] = ["php", "asp", "aspx", "jsp", "jspx", "xml"];

lazy_static! {
    // '=' plus the value, stopping at the next pair or whitespace
    static ref PARAM_VALUE: Regex = Regex::new(r"=[^&\s]*").unwrap();

    // Key between a '?'/'&' delimiter and '='; group 1 is the key only
    static ref PARAM_NAME: Regex = Regex::new(r"[?&]([^&=]+)=").unwrap();

    static ref PATH_SEGMENT: Regex = Regex::new(r"[^/]+").unwrap();

    // Anchored so "page.aspx" is never read as "page.asp" + "x"
    static ref SCRIPT_FILE: Regex =
        Regex::new(&format!(r"^(.+)\.({})$", SCRIPT_EXTENSIONS.join("|"))).unwrap();
}

/// Locate every site `part` targets in `url`, left to right.
pub fn locate(url: &str, part: PartKind) -> Vec<Site> {
    match part {
        PartKind::ParamValue => query_range(url)
            .map(|q| value_sites(&url[q.clone()], q.start))
            .unwrap_or_default(),
        PartKind::ParamName => query_range(url)
            .map(|q| name_sites(&url[q.clone()], q.start))
            .unwrap_or_default(),
        PartKind::PathSuffix => script_files(url).into_iter().map(|f| f.stem).collect(),
        PartKind::PathSuffixSlash => script_files(url)
            .into_iter()
            .map(|f| Site::at(f.segment.end))
            .collect(),
        PartKind::PathSegment => parent_directory(url).into_iter().collect(),
        PartKind::ExtFilename => script_files(url)
            .into_iter()
            .next()
            .map(|f| f.stem)
            .into_iter()
            .collect(),
    }
}

/// `=value` sites in an arbitrary piece of text, offset by `base`.
///
/// Used on the query slice of a URL and on whole lines of raw requests.
pub fn value_sites(text: &str, base: usize) -> Vec<Site> {
    PARAM_VALUE
        .find_iter(text)
        .map(|m| Site::new(base + m.start(), base + m.end()))
        .collect()
}

fn name_sites(query: &str, base: usize) -> Vec<Site> {
    PARAM_NAME
        .captures_iter(query)
        .filter_map(|caps| caps.get(1))
        .map(|m| Site::new(base + m.start(), base + m.end()))
        .collect()
}

/// Byte range of the query, including the leading '?'.
///
/// A '?' inside the fragment (hash routes) does not start a query.
pub fn query_range(url: &str) -> Option<Range<usize>> {
    let end = url.find('#').unwrap_or(url.len());
    let start = url[..end].find('?')?;
    Some(start..end)
}

/// Byte range of the path, starting at its leading '/'.
pub fn path_range(url: &str) -> Option<Range<usize>> {
    let limit = url.find(['?', '#']).unwrap_or(url.len());
    let head = &url[..limit];
    // "//host/..." is protocol-relative: the host is not a path segment
    let authority_start = match head.find("://") {
        Some(i) => i + 3,
        None if head.starts_with("//") => 2,
        None => 0,
    };
    let start = authority_start + head[authority_start..].find('/')?;
    Some(start..limit)
}

/// A path segment recognized as a script filename.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScriptFile {
    /// Index of the segment among all non-empty path segments
    index: usize,
    segment: Range<usize>,
    stem: Site,
}

fn path_segments(url: &str) -> Vec<Range<usize>> {
    let Some(path) = path_range(url) else {
        return Vec::new();
    };
    PATH_SEGMENT
        .find_iter(&url[path.clone()])
        .map(|m| path.start + m.start()..path.start + m.end())
        .collect()
}

fn script_files(url: &str) -> Vec<ScriptFile> {
    path_segments(url)
        .into_iter()
        .enumerate()
        .filter_map(|(index, segment)| {
            let caps = SCRIPT_FILE.captures(&url[segment.clone()])?;
            let stem = caps.get(1)?;
            Some(ScriptFile {
                index,
                stem: Site::new(segment.start + stem.start(), segment.start + stem.end()),
                segment,
            })
        })
        .collect()
}

/// Parent directory of the last script file that has one.
fn parent_directory(url: &str) -> Option<Site> {
    let segments = path_segments(url);
    script_files(url)
        .iter()
        .rev()
        .find(|f| f.index > 0)
        .map(|f| {
            let parent = &segments[f.index - 1];
            Site::new(parent.start, parent.end)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(url: &str, part: PartKind) -> Vec<&str> {
        locate(url, part).iter().map(|s| s.content(url)).collect()
    }

    #[test]
    fn test_query_range_stops_at_fragment() {
        let url = "http://x.com/a?x=1#frag";
        assert_eq!(&url[query_range(url).unwrap()], "?x=1");
        assert_eq!(query_range("http://x.com/a"), None);
    }

    #[test]
    fn test_query_inside_fragment_is_ignored() {
        let url = "http://x.com/a#/route?x=1";
        assert_eq!(query_range(url), None);
        assert!(texts(url, PartKind::ParamValue).is_empty());
        assert!(texts("http://x.com/a.php#x?y=1", PartKind::ParamName).is_empty());
    }

    #[test]
    fn test_protocol_relative_host_is_not_a_segment() {
        let url = "//x.com/index.php";
        assert_eq!(&url[path_range(url).unwrap()], "/index.php");
        assert!(texts(url, PartKind::PathSegment).is_empty());
        assert_eq!(texts("//x.com/admin/index.php", PartKind::PathSegment), vec!["admin"]);
    }

    #[test]
    fn test_names_and_values_see_the_same_pairs() {
        let url = "http://x.com/?a b=1&c=2";
        assert_eq!(texts(url, PartKind::ParamName), vec!["a b", "c"]);
        assert_eq!(
            locate(url, PartKind::ParamName).len(),
            locate(url, PartKind::ParamValue).len()
        );
    }

    #[test]
    fn test_path_range_skips_authority() {
        let url = "https://x.com/a/b.php?q=1";
        assert_eq!(&url[path_range(url).unwrap()], "/a/b.php");
        assert_eq!(path_range("https://x.com"), None);
        assert_eq!(&"x.com/page.php"[path_range("x.com/page.php").unwrap()], "/page.php");
    }

    #[test]
    fn test_param_values() {
        assert_eq!(
            texts("http://x.com/a?x=1&y=&z=abc", PartKind::ParamValue),
            vec!["=1", "=", "=abc"]
        );
    }

    #[test]
    fn test_param_values_ignore_path() {
        // '=' before the query is not a parameter
        assert_eq!(
            texts("http://x.com/a=b/c?x=1", PartKind::ParamValue),
            vec!["=1"]
        );
        assert!(texts("http://x.com/a=b", PartKind::ParamValue).is_empty());
    }

    #[test]
    fn test_param_names_keep_delimiters() {
        let url = "http://x.com/a?id=1&name=bob&flag";
        assert_eq!(texts(url, PartKind::ParamName), vec!["id", "name"]);
        let sites = locate(url, PartKind::ParamName);
        assert_eq!(&url[sites[0].span.start - 1..sites[0].span.start], "?");
        assert_eq!(&url[sites[1].span.start - 1..sites[1].span.start], "&");
    }

    #[test]
    fn test_path_suffix_all_script_segments() {
        assert_eq!(
            texts("http://x.com/a.php/b/c.aspx?x=1", PartKind::PathSuffix),
            vec!["a", "c"]
        );
    }

    #[test]
    fn test_every_script_extension_recognized() {
        for ext in SCRIPT_EXTENSIONS {
            let url = format!("http://x.com/dir/name.{}", ext);
            assert_eq!(texts(&url, PartKind::PathSuffix), vec!["name"], "{}", ext);
        }
    }

    #[test]
    fn test_extension_must_be_whole() {
        assert!(texts("http://x.com/page.phpx", PartKind::PathSuffix).is_empty());
        assert!(texts("http://x.com/page.html", PartKind::PathSuffix).is_empty());
        assert_eq!(texts("http://x.com/v1.2.jspx", PartKind::PathSuffix), vec!["v1.2"]);
    }

    #[test]
    fn test_host_is_never_a_segment() {
        assert!(texts("http://feed.xml/", PartKind::PathSuffix).is_empty());
        assert!(texts("http://x.com/index.php", PartKind::PathSegment).is_empty());
    }

    #[test]
    fn test_path_segment_is_parent_of_last_script() {
        assert_eq!(
            texts("http://x.com/admin/index.php?a=1", PartKind::PathSegment),
            vec!["admin"]
        );
        assert_eq!(
            texts("http://x.com/a/b/c.php/d", PartKind::PathSegment),
            vec!["b"]
        );
    }

    #[test]
    fn test_ext_filename_first_only() {
        assert_eq!(
            texts("http://x.com/a.php/b.php", PartKind::ExtFilename),
            vec!["a"]
        );
    }

    #[test]
    fn test_path_suffix_slash_sites_are_empty_spans() {
        let url = "http://x.com/a/index.php?x=1";
        let sites = locate(url, PartKind::PathSuffixSlash);
        assert_eq!(sites.len(), 1);
        assert!(sites[0].span.is_empty());
        assert_eq!(&url[..sites[0].span.start], "http://x.com/a/index.php");
    }

    #[test]
    fn test_query_extension_is_not_a_path() {
        assert!(texts("http://x.com/a?file=x.php", PartKind::PathSuffix).is_empty());
    }
}
