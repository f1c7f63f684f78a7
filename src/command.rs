use crate::env::Environment;
use std::ffi::OsStr;
use std::fmt::Display;
use std::io::Write;

/// Name used to prefix every diagnostic written to the error stream.
pub const SHELL_NAME: &str = "ksh";

/// Loop continuation flag returned by every dispatched command.
///
/// This is not a process exit code: an external program failing with a
/// non-zero code still yields [`Status::Continue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Prompt for the next line.
    Continue,
    /// Leave the read loop.
    Stop,
}

/// Output streams a command writes to.
///
/// Builtins run in-process and write through these handles; external
/// programs inherit the real process streams instead.
pub struct Streams<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl<'a> Streams<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// Implemented by builtins through a blanket impl in the `builtin` module.
pub trait ExecutableCommand {
    fn execute(self: Box<Self>, io: &mut Streams<'_>, env: &mut Environment) -> Status;
}

/// Registry entry that builds a command instance from its arguments.
pub trait CommandFactory {
    /// Exact, case-sensitive name the command is invoked by.
    fn name(&self) -> &'static str;

    /// Create a command for the given arguments (command name excluded).
    ///
    /// Arguments are passed through untouched; a builtin never rejects them.
    fn create(&self, args: &[&OsStr]) -> Box<dyn ExecutableCommand>;
}

/// Write one diagnostic line, prefixed with the shell name.
///
/// A failure to write the diagnostic itself is ignored: there is nowhere
/// left to report it.
pub fn report(err: &mut dyn Write, message: impl Display) {
    let _ = writeln!(err, "{SHELL_NAME}: {message}");
    let _ = err.flush();
}
