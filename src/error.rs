// ⚠️ Import Errors
// One error type for the whole pipeline, one exit status per failure kind

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ImportError> = std::result::Result<T, E>;

/// Everything that can stop an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    // ========================================================================
    // ACQUISITION
    // ========================================================================
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("no archive member matching '{pattern}' was extracted")]
    NoMatchingMember { pattern: String },

    #[error("more than one archive member matches '{pattern}': {candidates:?}")]
    AmbiguousMember {
        pattern: String,
        candidates: Vec<String>,
    },

    #[error("invalid member pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("archive member '{0}' would escape the work directory")]
    UnsafeMember(String),

    #[error("loader has no local work file")]
    NoWorkFile,

    // ========================================================================
    // RECORDS
    // ========================================================================
    #[error("cannot parse record {record}: {message}")]
    Parse { record: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("feature {index}: {message}")]
    Feature { index: usize, message: String },

    // ========================================================================
    // STORAGE
    // ========================================================================
    #[error("database error: {0}")]
    Persist(#[from] rusqlite::Error),

    #[error("dataset '{dataset}' is locked by run {holder} since {since}")]
    Locked {
        dataset: String,
        holder: String,
        since: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Parse failure for the record at `record` (1-based count of records read).
    pub fn parse(record: usize, message: impl Into<String>) -> Self {
        ImportError::Parse {
            record,
            message: message.into(),
        }
    }

    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            ImportError::Fetch { .. } | ImportError::HttpStatus { .. } => 2,
            ImportError::Archive { .. }
            | ImportError::NoMatchingMember { .. }
            | ImportError::AmbiguousMember { .. }
            | ImportError::Pattern(_)
            | ImportError::UnsafeMember(_)
            | ImportError::NoWorkFile => 3,
            ImportError::Parse { .. } | ImportError::Csv(_) => 4,
            ImportError::Persist(_) => 5,
            ImportError::Io(_) => 6,
            ImportError::Locked { .. } => 7,
            ImportError::Shapefile(_) | ImportError::Feature { .. } => 8,
        }
    }

    /// Short machine-readable kind, stored in the run log.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Fetch { .. } | ImportError::HttpStatus { .. } => "fetch",
            ImportError::Archive { .. }
            | ImportError::NoMatchingMember { .. }
            | ImportError::AmbiguousMember { .. }
            | ImportError::Pattern(_)
            | ImportError::UnsafeMember(_)
            | ImportError::NoWorkFile => "archive",
            ImportError::Parse { .. } | ImportError::Csv(_) => "parse",
            ImportError::Persist(_) => "persist",
            ImportError::Io(_) => "io",
            ImportError::Locked { .. } => "locked",
            ImportError::Shapefile(_) | ImportError::Feature { .. } => "shapefile",
        }
    }
}
