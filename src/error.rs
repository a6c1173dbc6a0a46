// Error types for pvreplace
// Mutation itself is total; everything here comes from setup or I/O around it

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A part/type/mode value that names no known policy.
    #[error("invalid fuzzing {axis}: {value}")]
    InvalidPolicy { axis: &'static str, value: String },

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedConfigVersion { found: u32, supported: u32 },

    #[error("config {} has no active configurations", path.display())]
    EmptyConfig { path: PathBuf },

    #[error("no raw request files found in {}", path.display())]
    NoRawFiles { path: PathBuf },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The URL stream could not be read.
    #[error("error reading input: {0}")]
    Input(#[source] std::io::Error),

    /// The output sink failed for a reason other than a closed pipe.
    #[error("error writing output: {0}")]
    Output(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors caused by bad flags or configuration rather than bad input.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::InvalidPolicy { .. }
                | Error::ConfigParse { .. }
                | Error::UnsupportedConfigVersion { .. }
                | Error::EmptyConfig { .. }
        )
    }

    /// Errors caused by failing to read the URL or request stream.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Error::Input(_) | Error::ReadFile { .. } | Error::Walk { .. } | Error::NoRawFiles { .. }
        )
    }
}
