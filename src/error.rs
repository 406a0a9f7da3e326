use std::fmt::Display;

/// Index layer errors.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Invalid user input, typically out-of-range constructor parameters.
    InvalidInput(String),
    /// An OS-level failure, typically background thread creation.
    Io(String),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

/// A pmemindex Result returning Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
