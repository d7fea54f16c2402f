use std::io;
use std::path::PathBuf;

/// Everything that can abort a reverse, build or audit run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not allocate a directory for {suggestion:?} under {}: {attempts} names taken", parent.display())]
    AllocationExhausted {
        parent: PathBuf,
        suggestion: String,
        attempts: usize,
    },

    #[error("{name:?} is not a usable directory name")]
    InvalidDirName { name: String },

    #[error("{}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} not found among any known paths", name.display())]
    NotFound { name: PathBuf },

    #[error("malformed skeleton at {node}: {message}")]
    MalformedSkeleton { node: String, message: String },

    #[error("malformed save document at {node}: {message}")]
    MalformedDocument { node: String, message: String },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }
}
