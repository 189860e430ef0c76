//! Error types for problem-file operations.
//!
//! Structural failures (I/O, corrupt tiling, caller misuse) are reported through
//! [`ProblemError`]. Elements that fall outside the tolerance model are not errors:
//! they are counted in [`Score`](crate::Score) and reported through the violation callback.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while opening, decoding or encoding a problem file.
#[derive(Debug)]
pub enum ProblemError {
    /// The directory given to the reader contains no regular file.
    EmptyDirectory {
        /// The directory that was searched.
        path: PathBuf,
    },
    /// Opening, reading, seeking or writing the underlying stream failed.
    ///
    /// A truncated file surfaces here as [`io::ErrorKind::UnexpectedEof`].
    Io(io::Error),
    /// The file content contradicts its own header, e.g. a tile descriptor that does
    /// not cover the matrix it describes.
    CorruptFile {
        /// Human-readable error message.
        message: String,
    },
    /// Input validation error on the caller side (buffer sizes, pitches, shapes).
    ValidationError {
        /// Human-readable error message.
        message: String,
    },
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemError::EmptyDirectory { path } => {
                write!(f, "directory \"{}\" contains no file", path.display())
            }
            ProblemError::Io(err) => write!(f, "I/O error: {}", err),
            ProblemError::CorruptFile { message } => write!(f, "Corrupt problem file: {}", message),
            ProblemError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
        }
    }
}

impl std::error::Error for ProblemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProblemError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ProblemError {
    fn from(err: io::Error) -> Self {
        ProblemError::Io(err)
    }
}

/// Result type alias for problem-file operations.
pub type Result<T> = std::result::Result<T, ProblemError>;

/// Creates an empty-directory error.
pub fn empty_directory(path: impl AsRef<Path>) -> ProblemError {
    ProblemError::EmptyDirectory {
        path: path.as_ref().to_path_buf(),
    }
}

/// Creates a corrupt-file error.
pub fn corrupt_file(message: impl Into<String>) -> ProblemError {
    ProblemError::CorruptFile {
        message: message.into(),
    }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> ProblemError {
    ProblemError::ValidationError {
        message: message.into(),
    }
}
