use rustyline::error::ReadlineError;
use std::collections::TryReserveError;
use std::io;

/// Errors that end the whole shell process.
///
/// Everything else (bad builtin arguments, failed `chdir`, programs that
/// cannot be spawned) is reported on the error stream and the loop goes on.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Growing the line buffer or the token table failed.
    #[error("allocation error")]
    Allocation(#[from] TryReserveError),
    /// Reading the command source failed.
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    /// The interactive line editor failed.
    #[error("line editor: {0}")]
    Editor(ReadlineError),
}
