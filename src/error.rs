use std::{io, num::ParseIntError, path::PathBuf, process::ExitStatus};

use thiserror::Error;

use crate::myprocess::Pid;

/// Why a process source could not answer a question about a process.
///
/// None of these are fatal: the sampling loop treats every variant as
/// "no observation this cycle".
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("field `{field}` missing from `{path}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("invalid number '{value}': {source}")]
    InvalidNumber {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },

    #[error("process {0} not found")]
    NotFound(Pid),
}

impl ProbeError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProbeError::Read {
            path: path.into(),
            source,
        }
    }
}

/// Parses a decimal count, keeping the offending text for the error.
pub(crate) fn parse_number<T>(value: &str) -> Result<T, ProbeError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    value.parse().map_err(|source| ProbeError::InvalidNumber {
        value: value.to_string(),
        source,
    })
}

/// Fatal errors of the wrapper itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to start command `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] io::Error),
}
