use crate::command::{CommandFactory, ExecutableCommand, Status, Streams, report};
use crate::env::Environment;
use anyhow::{Context, Result, bail};
use std::env;
use std::ffi::OsStr;
use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are executed directly in-process without spawning a child
/// process. Their arguments are taken as typed: nothing is parsed as an
/// option, so `exit --help` still exits and `cd -x` enters a directory
/// named `-x`.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Build the command from its arguments (command name excluded).
    fn from_args(args: &[&OsStr]) -> Self;

    /// Executes the command using the shell's output streams and environment.
    ///
    /// Errors are reported on the error stream by the caller and never stop the loop.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Status>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, io: &mut Streams<'_>, env: &mut Environment) -> Status {
        match BuiltinCommand::execute(*self, &mut *io.out, env) {
            Ok(status) => status,
            Err(e) => {
                report(&mut *io.err, format_args!("{e:#}"));
                Status::Continue
            }
        }
    }
}

/// Factory allows creating instances of a builtin from its arguments.
pub(crate) struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn create(&self, args: &[&OsStr]) -> Box<dyn ExecutableCommand> {
        Box::new(T::from_args(args))
    }
}

/// Read-only table of builtins, kept in registration order.
pub struct Registry {
    entries: Vec<Box<dyn CommandFactory>>,
}

impl Registry {
    /// Create a registry from factories; earlier entries win on lookup.
    pub fn new(entries: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { entries }
    }

    /// Find the first builtin whose name equals `name` exactly, byte for byte.
    pub fn lookup(&self, name: impl AsRef<OsStr>) -> Option<&dyn CommandFactory> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|entry| name == entry.name())
            .map(|entry| entry.as_ref())
    }

    /// Names of all builtins, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    /// The shell's builtins: `cd`, `help`, `exit`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
        ])
    }
}

/// Change the current working directory.
///
/// Only the first argument is used; any further ones are ignored.
pub struct Cd {
    pub target: Option<PathBuf>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_args(args: &[&OsStr]) -> Self {
        Self {
            target: args.first().map(PathBuf::from),
        }
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Status> {
        let Some(target) = self.target else {
            bail!("expected argument to \"cd\"");
        };

        env::set_current_dir(&target).with_context(|| format!("cd: {}", target.display()))?;
        Ok(Status::Continue)
    }
}

/// Describe the shell and list its builtins. Arguments are ignored.
pub struct Help;

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn from_args(_args: &[&OsStr]) -> Self {
        Help
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Status> {
        writeln!(stdout, "ksh: a small interactive shell")?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout, "The following are built in:")?;
        for name in &env.builtins {
            writeln!(stdout, " {name}")?;
        }
        writeln!(
            stdout,
            "Use the man command for more information on other programs."
        )?;
        Ok(Status::Continue)
    }
}

/// Leave the shell. Arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn from_args(_args: &[&OsStr]) -> Self {
        Exit
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Status> {
        Ok(Status::Stop)
    }
}
