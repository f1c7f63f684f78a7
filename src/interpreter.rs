use crate::builtin::Registry;
use crate::command::{Status, Streams, report};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{self, Launcher, OsProcesses, ProcessFacility};
use crate::lexer::{self, Argv};
use crate::reader::LineSource;

/// Prompt printed before every read unless configured otherwise.
pub const DEFAULT_PROMPT: &str = "> ";

/// Why the read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The `exit` builtin ran.
    Exited,
    /// The line source reached end of input.
    EndOfInput,
}

/// Tunables for an [`Interpreter`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Text shown before each line is read.
    pub prompt: String,
    /// Echo every dispatched command on the error stream before running it,
    /// and how each external program ended.
    pub trace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            trace: false,
        }
    }
}

/// A minimal interactive shell that runs builtins in-process and everything
/// else as a child process.
///
/// Example
/// ```
/// use ksh::{Interpreter, Status, Streams};
/// let mut sh: Interpreter = Interpreter::default();
/// let (mut out, mut err) = (Vec::<u8>::new(), Vec::<u8>::new());
/// let status = sh.run_line(b"exit", &mut Streams::new(&mut out, &mut err)).unwrap();
/// assert_eq!(status, Status::Stop);
/// ```
pub struct Interpreter<P = OsProcesses> {
    env: Environment,
    registry: Registry,
    launcher: Launcher<P>,
    options: Options,
}

impl<P: ProcessFacility> Interpreter<P> {
    /// Create an interpreter with a custom builtin table and process facility.
    pub fn new(registry: Registry, facility: P, options: Options) -> Self {
        Self {
            env: Environment::new(registry.names()),
            registry,
            launcher: Launcher::new(facility),
            options,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn launcher(&self) -> &Launcher<P> {
        &self.launcher
    }

    /// Run one argument vector: builtins first, then external programs.
    ///
    /// A blank vector is a silent no-op.
    pub fn dispatch(&mut self, argv: &Argv<'_>, io: &mut Streams<'_>) -> Status {
        let Some(name) = argv.command() else {
            return Status::Continue;
        };

        if self.options.trace {
            report(&mut *io.err, format_args!("+ {argv}"));
        }

        match self.registry.lookup(name) {
            Some(factory) => factory.create(argv.args()).execute(io, &mut self.env),
            None => {
                let status = self.launcher.launch(argv.as_slice(), &mut *io.err);
                let trace = self.options.trace;
                if let Some(done) = self.launcher.last_status().filter(|_| trace) {
                    report(
                        &mut *io.err,
                        format_args!("{}: {}", name.to_string_lossy(), external::describe(done)),
                    );
                }
                status
            }
        }
    }

    /// Tokenize and dispatch a single line of raw input bytes.
    pub fn run_line(&mut self, line: &[u8], io: &mut Streams<'_>) -> Result<Status, ShellError> {
        let argv = lexer::split_line(line)?;
        Ok(self.dispatch(&argv, io))
    }

    /// Read-eval loop: prompt, read, tokenize, dispatch, until `exit` or end of input.
    ///
    /// The line and its argument vector live for one iteration only.
    pub fn repl(
        &mut self,
        source: &mut dyn LineSource,
        io: &mut Streams<'_>,
    ) -> Result<Outcome, ShellError> {
        loop {
            let Some(line) = source.read_line(&self.options.prompt)? else {
                return Ok(Outcome::EndOfInput);
            };
            if self.run_line(&line, io)? == Status::Stop {
                return Ok(Outcome::Exited);
            }
        }
    }
}

impl Interpreter<OsProcesses> {
    /// Interpreter with the default builtins, real processes and the given options.
    pub fn with_options(options: Options) -> Self {
        Self::new(Registry::default(), OsProcesses, options)
    }
}

impl Default for Interpreter<OsProcesses> {
    /// Builtins `cd`, `help`, `exit`, real child processes and the `"> "` prompt.
    fn default() -> Self {
        Self::with_options(Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::StreamReader;
    use crate::test_support::lock_current_dir;
    use std::env as stdenv;
    use std::ffi::{OsStr, OsString};
    use std::fs;
    use std::io::{self, Cursor};
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    #[derive(Default)]
    struct Recorder {
        spawned: Vec<Vec<OsString>>,
        waited: Vec<u32>,
    }

    impl ProcessFacility for Recorder {
        fn spawn(&mut self, argv: &[&OsStr]) -> io::Result<u32> {
            self.spawned.push(argv.iter().map(|arg| arg.to_os_string()).collect());
            Ok(self.spawned.len() as u32)
        }

        fn wait(&mut self, pid: u32) -> io::Result<ExitStatus> {
            self.waited.push(pid);
            // Report a failing child: it must not stop the loop.
            Ok(ExitStatus::from_raw(1 << 8))
        }
    }

    fn recording() -> Interpreter<Recorder> {
        Interpreter::new(Registry::default(), Recorder::default(), Options::default())
    }

    fn run_session<P: ProcessFacility>(
        sh: &mut Interpreter<P>,
        input: impl AsRef<[u8]>,
    ) -> (Outcome, String, String) {
        let mut prompt: Vec<u8> = Vec::new();
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        let outcome = {
            let input = Cursor::new(input.as_ref().to_vec());
            let mut source = StreamReader::new(input, &mut prompt);
            sh.repl(&mut source, &mut Streams::new(&mut out, &mut err))
                .expect("repl failed")
        };
        let mut stdout = prompt;
        stdout.extend(out);
        (
            outcome,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn dispatch_line<P: ProcessFacility>(
        sh: &mut Interpreter<P>,
        line: &str,
    ) -> (Status, String, String) {
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        let status = sh
            .run_line(line.as_bytes(), &mut Streams::new(&mut out, &mut err))
            .unwrap();
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_blank_line_is_noop() {
        let mut sh = recording();
        for line in ["", "   ", "\t\r\x07"] {
            let (status, out, err) = dispatch_line(&mut sh, line);
            assert_eq!(status, Status::Continue);
            assert!(out.is_empty());
            assert!(err.is_empty());
        }
        assert!(sh.launcher().facility().spawned.is_empty());
    }

    #[test]
    fn test_exit_stops() {
        let mut sh = recording();
        let (status, _, _) = dispatch_line(&mut sh, "exit");
        assert_eq!(status, Status::Stop);
    }

    #[test]
    fn test_builtin_names_are_case_sensitive() {
        let mut sh = recording();
        let (status, _, _) = dispatch_line(&mut sh, "EXIT");
        assert_eq!(status, Status::Continue);
        assert_eq!(sh.launcher().facility().spawned, vec![vec!["EXIT"]]);
    }

    #[test]
    fn test_help_lists_three_builtins() {
        let mut sh = recording();
        let (status, out, _) = dispatch_line(&mut sh, "help");
        assert_eq!(status, Status::Continue);
        let listed: Vec<&str> = out
            .lines()
            .filter_map(|l| l.strip_prefix(' '))
            .collect();
        assert_eq!(listed, vec!["cd", "help", "exit"]);
        assert!(sh.launcher().facility().spawned.is_empty());
    }

    #[test]
    fn test_cd_without_argument_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut sh = recording();

        let (status, _, err) = dispatch_line(&mut sh, "cd");

        assert_eq!(status, Status::Continue);
        assert!(err.starts_with("ksh: "));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_external_command_is_spawned_with_verbatim_argv() {
        let mut sh = recording();
        let (status, out, err) = dispatch_line(&mut sh, "  grep -r  $HOME \"x\"  ");

        assert_eq!(status, Status::Continue);
        assert!(out.is_empty());
        assert!(err.is_empty());
        assert_eq!(
            sh.launcher().facility().spawned,
            vec![vec!["grep", "-r", "$HOME", "\"x\""]]
        );
        assert_eq!(sh.launcher().facility().waited, vec![1]);
    }

    #[test]
    fn test_repeated_command_spawns_independent_children() {
        let mut sh = recording();
        let (outcome, _, _) = run_session(&mut sh, "true\ntrue\n");

        assert_eq!(outcome, Outcome::EndOfInput);
        assert_eq!(sh.launcher().facility().spawned.len(), 2);
        assert_eq!(sh.launcher().facility().waited, vec![1, 2]);
    }

    #[test]
    fn test_repl_stops_on_exit_without_another_prompt() {
        let mut sh = recording();
        let (outcome, stdout, _) = run_session(&mut sh, "\nexit\nls\n");

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(stdout, "> > ");
        assert!(sh.launcher().facility().spawned.is_empty());
    }

    #[test]
    fn test_repl_ends_on_eof() {
        let mut sh = recording();
        let (outcome, stdout, err) = run_session(&mut sh, "");
        assert_eq!(outcome, Outcome::EndOfInput);
        assert_eq!(stdout, "> ");
        assert!(err.is_empty());
    }

    #[test]
    fn test_repl_runs_partial_last_line() {
        let mut sh = recording();
        let (outcome, _, _) = run_session(&mut sh, "ls -a");
        assert_eq!(outcome, Outcome::EndOfInput);
        assert_eq!(sh.launcher().facility().spawned, vec![vec!["ls", "-a"]]);
    }

    #[test]
    fn test_custom_prompt_and_trace() {
        let options = Options {
            prompt: "ksh$ ".to_string(),
            trace: true,
        };
        let mut sh = Interpreter::new(Registry::default(), Recorder::default(), options);
        let (outcome, stdout, err) = run_session(&mut sh, "echo  hi\nexit\n");

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(stdout, "ksh$ ksh$ ");
        assert_eq!(err, "ksh: + echo hi\nksh: echo: exit 1\nksh: + exit\n");
    }

    #[test]
    fn test_missing_program_keeps_shell_alive() {
        let mut sh: Interpreter = Interpreter::default();
        let (status, _, _) = dispatch_line(&mut sh, "ksh-no-such-program --flag");
        assert_eq!(status, Status::Continue);
        // The forked child reports the failed exec and exits with status 1.
        assert_eq!(sh.launcher().last_status().and_then(|s| s.code()), Some(1));

        let (outcome, _, _) = run_session(&mut sh, "ksh-no-such-program\nexit\n");
        assert_eq!(outcome, Outcome::Exited);
    }

    #[test]
    fn test_real_child_exit_code_does_not_stop_loop() {
        let mut sh: Interpreter = Interpreter::default();
        let (status, _, err) = dispatch_line(&mut sh, "sh -c false");
        assert_eq!(status, Status::Continue);
        assert!(err.is_empty());
    }

    #[test]
    fn test_builtin_arguments_are_never_options() {
        let mut sh = recording();

        let (status, out, err) = dispatch_line(&mut sh, "help -v");
        assert_eq!(status, Status::Continue);
        assert!(out.starts_with("ksh: a small interactive shell\n"), "got {out:?}");
        assert!(err.is_empty());

        for line in ["exit --help", "exit -1"] {
            let (status, out, err) = dispatch_line(&mut sh, line);
            assert_eq!(status, Status::Stop, "{line}");
            assert!(out.is_empty() && err.is_empty(), "{line}");
        }
        assert!(sh.launcher().facility().spawned.is_empty());
    }

    #[test]
    fn test_cd_dash_named_directory() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(canonical.join("-x")).unwrap();
        let mut sh = recording();

        stdenv::set_current_dir(&canonical).unwrap();
        let (status, _, err) = dispatch_line(&mut sh, "cd -x");

        assert_eq!(status, Status::Continue);
        assert!(err.is_empty(), "got {err:?}");
        assert_eq!(stdenv::current_dir().unwrap(), canonical.join("-x"));

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_non_utf8_line_reaches_child_unchanged() {
        let options = Options {
            prompt: String::new(),
            trace: true,
        };
        let mut sh = Interpreter::new(Registry::default(), Recorder::default(), options);
        let (outcome, _, err) = run_session(&mut sh, b"printf caf\xe9 \xff\n");

        assert_eq!(outcome, Outcome::EndOfInput);
        let spawned = &sh.launcher().facility().spawned[0];
        assert_eq!(spawned[0], "printf");
        assert_eq!(spawned[1].as_bytes(), b"caf\xe9");
        assert_eq!(spawned[2].as_bytes(), b"\xff");
        assert!(err.starts_with("ksh: + printf caf\u{fffd} \u{fffd}\n"), "got {err:?}");
    }
}
