use std::io;

/// `ENOENT`: nothing to run with or nothing found.
pub const CONFIGURATION_EXIT_CODE: i32 = 2;
/// `E2BIG`: environment block or command line over the native limit.
pub const TOO_LARGE_EXIT_CODE: i32 = 7;
/// `EBADF`: an inherited environment entry that cannot be parsed.
pub const BAD_ENVIRONMENT_EXIT_CODE: i32 = 9;
pub const SPAWN_EXIT_CODE: i32 = 126;
pub const NOT_FOUND_EXIT_CODE: i32 = 127;
/// Returned when the child had to be killed.
pub const TERMINATED_EXIT_CODE: i32 = 137;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Configuration(String),

    #[error("Cannot find PROGRAM '{0}'")]
    Resolution(String),

    #[error("Malformed environment entry '{0}'")]
    MalformedEnvironment(String),

    #[error("{what} is too large ({size} > {limit} characters)")]
    TooLarge {
        what: &'static str,
        size: usize,
        limit: usize,
    },

    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Not a failure: the exit code to hand back to the caller.
    #[error("exit code {0}")]
    Code(i32),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => CONFIGURATION_EXIT_CODE,
            Error::Resolution(_) => NOT_FOUND_EXIT_CODE,
            Error::MalformedEnvironment(_) => BAD_ENVIRONMENT_EXIT_CODE,
            Error::TooLarge { .. } => TOO_LARGE_EXIT_CODE,
            Error::Spawn { .. } => SPAWN_EXIT_CODE,
            Error::Code(code) => *code,
        }
    }
}

pub trait IntoResult<T> {
    fn into_result(self) -> Result<T, Error>;
}

impl IntoResult<()> for Result<i32, Error> {
    fn into_result(self) -> Result<(), Error> {
        match self {
            Ok(0) => Ok(()),
            Ok(code) => Err(Error::Code(code)),
            Err(err) => Err(err),
        }
    }
}
