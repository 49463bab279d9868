//! Error kinds for the pipeline.
//!
//! Pure computational degeneracies (zero-variance PCA axes, empty palettes)
//! are recovered locally and never surface here. Configuration problems are
//! validated eagerly, before any byte is written; I/O problems propagate
//! immediately from the writer.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid argument: {message}"))]
    InvalidArgument { message: String },

    #[snafu(display("histogram exceeded addressable capacity: {message}"))]
    Capacity { message: String },

    #[snafu(display("I/O error while writing GIF stream: {source}"))]
    Ioerror { source: std::io::Error },

    #[snafu(display("internal invariant violated: {message}"))]
    Internal { message: String },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Ioerror { source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn invalid_argument(message: impl Into<String>) -> Error {
    Error::InvalidArgument {
        message: message.into(),
    }
}

pub(crate) fn internal(message: impl Into<String>) -> Error {
    Error::Internal {
        message: message.into(),
    }
}
