// Core data models for pvreplace
// Mutation policy axes and the site spans the locator hands to the combiner

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::Error;

/// Which syntactic element of the URL receives the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// `=value` pairs inside the query string
    ParamValue,
    /// Parameter keys preceded by `?` or `&`
    ParamName,
    /// Filename stem of every script segment in the path
    PathSuffix,
    /// `/payload` appended after every script segment
    PathSuffixSlash,
    /// Parent directory of the last script segment
    PathSegment,
    /// Filename stem of the first script segment only
    ExtFilename,
}

impl PartKind {
    /// Every URL part, in the order `all` expands to.
    pub const ALL: [PartKind; 6] = [
        PartKind::ParamValue,
        PartKind::ParamName,
        PartKind::PathSuffix,
        PartKind::PathSuffixSlash,
        PartKind::PathSegment,
        PartKind::ExtFilename,
    ];

    /// Parts that emit the URL unchanged in `Multiple` mode when nothing matched.
    pub fn passes_through_unmatched(&self) -> bool {
        matches!(
            self,
            PartKind::ParamValue | PartKind::ParamName | PartKind::ExtFilename
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::ParamValue => "param-value",
            PartKind::ParamName => "param-name",
            PartKind::PathSuffix => "path-suffix",
            PartKind::PathSuffixSlash => "path-suffix-slash",
            PartKind::PathSegment => "path-segment",
            PartKind::ExtFilename => "ext-filename",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PartKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "param-value" => Ok(PartKind::ParamValue),
            "param-name" => Ok(PartKind::ParamName),
            "path-suffix" => Ok(PartKind::PathSuffix),
            "path-suffix-slash" => Ok(PartKind::PathSuffixSlash),
            "path-segment" => Ok(PartKind::PathSegment),
            // path-ext is the historical name
            "ext-filename" | "path-ext" => Ok(PartKind::ExtFilename),
            other => Err(Error::InvalidPolicy {
                axis: "part",
                value: other.to_string(),
            }),
        }
    }
}

/// A part selection as written by the user: one part, or every part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartSelector {
    One(PartKind),
    All,
    /// `headers` from older configs; header fuzzing only exists in raw mode
    Headers,
}

impl PartSelector {
    pub fn parts(&self) -> Vec<PartKind> {
        match self {
            PartSelector::One(part) => vec![*part],
            PartSelector::All => PartKind::ALL.to_vec(),
            PartSelector::Headers => Vec::new(),
        }
    }
}

impl FromStr for PartSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PartSelector::All),
            "headers" => Ok(PartSelector::Headers),
            _ => s.parse().map(PartSelector::One),
        }
    }
}

/// How the payload combines with the original content of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombineMode {
    Replace,
    Prefix,
    Postfix,
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineMode::Replace => write!(f, "replace"),
            CombineMode::Prefix => write!(f, "prefix"),
            CombineMode::Postfix => write!(f, "postfix"),
        }
    }
}

impl FromStr for CombineMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(CombineMode::Replace),
            "prefix" => Ok(CombineMode::Prefix),
            "postfix" => Ok(CombineMode::Postfix),
            other => Err(Error::InvalidPolicy {
                axis: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether each site gets its own output or all sites share one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceMode {
    Single,
    Multiple,
}

impl fmt::Display for OccurrenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceMode::Single => write!(f, "single"),
            OccurrenceMode::Multiple => write!(f, "multiple"),
        }
    }
}

impl FromStr for OccurrenceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(OccurrenceMode::Single),
            "multiple" => Ok(OccurrenceMode::Multiple),
            other => Err(Error::InvalidPolicy {
                axis: "mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Immutable description of one mutation: where, how, and how often
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationPolicy {
    pub part: PartKind,
    pub combine: CombineMode,
    pub occurrence: OccurrenceMode,
}

impl MutationPolicy {
    pub fn new(part: PartKind, combine: CombineMode, occurrence: OccurrenceMode) -> Self {
        Self {
            part,
            combine,
            occurrence,
        }
    }
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self::new(
            PartKind::ParamValue,
            CombineMode::Replace,
            OccurrenceMode::Multiple,
        )
    }
}

impl fmt::Display for MutationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.part, self.combine, self.occurrence)
    }
}

/// A half-open byte span of the URL that one mutation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub span: Range<usize>,
}

impl Site {
    pub fn new(start: usize, end: usize) -> Self {
        Self { span: start..end }
    }

    /// Zero-width site used for pure insertions.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Text of the site inside `url`.
    pub fn content<'a>(&self, url: &'a str) -> &'a str {
        &url[self.span.clone()]
    }
}
