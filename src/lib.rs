//! A tiny interactive shell.
//!
//! Each line read from the command source is split on whitespace into an
//! argument vector. The first token names either a builtin (`cd`, `help`,
//! `exit`), which runs inside the shell process, or an external program,
//! which runs as a child process the shell waits for before prompting again.
//! There are no pipelines, redirections, quoting, expansions, history or
//! job control.
//!
//! The main entry point is [`Interpreter`]; [`reader`] provides the line
//! sources it reads from and [`external`] the process facility it launches
//! programs through.

#[cfg(not(unix))]
compile_error!("ksh runs programs with fork/execvp/waitpid and needs a unix host");

pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod reader;

pub use command::{Status, Streams};
pub use error::ShellError;
pub use interpreter::{DEFAULT_PROMPT, Interpreter, Options, Outcome};
