use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A process file, report or random file could not be read or written.
    Io { path: PathBuf, source: io::Error },
    /// Reading from or writing to the terminal failed.
    Console(io::Error),
    /// A record line did not match `pid arrival burst priority [completion turnaround waiting]`.
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },
    DuplicatePid { path: PathBuf, pid: usize },
    InvalidProcess { pid: usize, reason: &'static str },
    InvalidArgument(&'static str),
    /// A policy string such as `R0` or `X`.
    InvalidSpec(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Console(source) => write!(f, "console: {}", source),
            Error::Parse {
                path,
                line,
                content,
            } => write!(
                f,
                "{}:{}: malformed process record '{}'",
                path.display(),
                line,
                content
            ),
            Error::DuplicatePid { path, pid } => {
                write!(f, "{}: pid {} appears more than once", path.display(), pid)
            }
            Error::InvalidProcess { pid, reason } => write!(f, "process P{}: {}", pid, reason),
            Error::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            Error::InvalidSpec(spec) => write!(
                f,
                "invalid scheduler specification: {}. Must be one of F, R<num>, P, N, J or S",
                spec
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } | Error::Console(source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::Console(source)
    }
}
