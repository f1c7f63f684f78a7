use argh::FromArgs;
use ksh::reader::{EditorReader, LineSource, StreamReader};
use ksh::{DEFAULT_PROMPT, Interpreter, Options, ShellError, Streams};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

#[derive(FromArgs)]
/// A small interactive shell: builtins cd, help and exit, everything else runs as a program.
struct Args {
    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// text printed before each command line.
    prompt: String,

    #[argh(switch)]
    /// use an editable input line when standard input is a terminal.
    edit: bool,

    #[argh(switch)]
    /// echo each command on standard error before running it.
    trace: bool,
}

fn line_source(edit: bool) -> Result<Box<dyn LineSource>, ShellError> {
    if edit && io::stdin().is_terminal() {
        return Ok(Box::new(EditorReader::new()?));
    }
    Ok(Box::new(StreamReader::new(io::stdin(), io::stdout())))
}

fn run(args: Args) -> Result<(), ShellError> {
    let mut source = line_source(args.edit)?;
    let mut sh: Interpreter = Interpreter::with_options(Options {
        prompt: args.prompt,
        trace: args.trace,
    });

    let mut out = io::stdout();
    let mut err = io::stderr();
    sh.repl(source.as_mut(), &mut Streams::new(&mut out, &mut err))?;
    Ok(())
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ksh::command::report(&mut io::stderr(), e);
            ExitCode::FAILURE
        }
    }
}
