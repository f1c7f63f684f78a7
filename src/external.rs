use crate::command::{SHELL_NAME, Status, report};
use std::ffi::{CString, OsStr};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::ptr;

/// Host facilities for running an external program to completion.
pub trait ProcessFacility {
    /// Start `argv[0]` (resolved through `PATH`) with the remaining tokens as
    /// arguments, inheriting the shell's standard streams. Returns the child's pid.
    fn spawn(&mut self, argv: &[&OsStr]) -> io::Result<u32>;

    /// Block until the child exits or is killed by a signal.
    fn wait(&mut self, pid: u32) -> io::Result<ExitStatus>;
}

/// Real processes, created with `fork` + `execvp` and reaped with `waitpid`.
///
/// Only a failed `fork` is an error for the shell. If `execvp` fails, the
/// child prints `ksh: <program>: <reason>` on its standard error and exits
/// with status 1, which the shell then reaps like any other exit.
#[derive(Debug, Default)]
pub struct OsProcesses;

impl ProcessFacility for OsProcesses {
    fn spawn(&mut self, argv: &[&OsStr]) -> io::Result<u32> {
        let Some(program) = argv.first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };
        let args = argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "nul byte in argument"))?;
        let mut ptrs: Vec<*const libc::c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        ptrs.push(ptr::null());

        // Everything the child touches is built before forking.
        let mut prefix = format!("{SHELL_NAME}: ").into_bytes();
        prefix.extend_from_slice(program.as_bytes());
        prefix.extend_from_slice(b": ");

        // SAFETY: the child only runs `exec_child`, which makes raw system
        // calls on memory prepared above.
        match unsafe { libc::fork() } {
            -1 => Err(io::Error::last_os_error()),
            0 => exec_child(&ptrs, &prefix),
            pid => Ok(pid as u32),
        }
    }

    fn wait(&mut self, pid: u32) -> io::Result<ExitStatus> {
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        let mut status: libc::c_int = 0;
        loop {
            // SAFETY: `status` is a valid, writable c_int for the duration of the call.
            let ret = unsafe { libc::waitpid(pid, &mut status, libc::WUNTRACED) };
            if ret == -1 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            // A stopped child has not terminated yet.
            if libc::WIFEXITED(status) || libc::WIFSIGNALED(status) {
                return Ok(ExitStatus::from_raw(status));
            }
        }
    }
}

/// Body of a freshly forked child: become `argv[0]`, or say why not and exit 1.
fn exec_child(argv: &[*const libc::c_char], prefix: &[u8]) -> ! {
    // SAFETY: `argv` is a null-terminated array of pointers into CStrings the
    // parent still owns in this address space; `strerror` returns a
    // NUL-terminated string.
    unsafe {
        // The Rust runtime ignores SIGPIPE; programs expect the default.
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        libc::execvp(argv[0], argv.as_ptr());

        let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
        let reason = libc::strerror(errno);
        libc::write(libc::STDERR_FILENO, prefix.as_ptr().cast(), prefix.len());
        libc::write(libc::STDERR_FILENO, reason.cast(), libc::strlen(reason));
        libc::write(libc::STDERR_FILENO, b"\n".as_ptr().cast(), 1);
        libc::_exit(libc::EXIT_FAILURE)
    }
}

/// Runs external commands one at a time, blocking until each one finishes.
#[derive(Debug, Default)]
pub struct Launcher<P> {
    facility: P,
    last_status: Option<ExitStatus>,
}

impl<P: ProcessFacility> Launcher<P> {
    pub fn new(facility: P) -> Self {
        Self {
            facility,
            last_status: None,
        }
    }

    pub fn facility(&self) -> &P {
        &self.facility
    }

    /// How the most recently launched child ended, if it was spawned and reaped.
    pub fn last_status(&self) -> Option<ExitStatus> {
        self.last_status
    }

    /// Spawn `argv` and wait for it to terminate.
    ///
    /// Spawn and wait failures are reported on `err`. The program's own exit
    /// status never stops the shell, so this always returns [`Status::Continue`].
    pub fn launch(&mut self, argv: &[&OsStr], err: &mut dyn Write) -> Status {
        self.last_status = None;
        let pid = match self.facility.spawn(argv) {
            Ok(pid) => pid,
            Err(e) => {
                let program = argv.first().copied().unwrap_or_default();
                report(err, format_args!("{}: {e}", program.to_string_lossy()));
                return Status::Continue;
            }
        };

        match self.facility.wait(pid) {
            Ok(status) => self.last_status = Some(status),
            Err(e) => report(err, e),
        }
        Status::Continue
    }
}

/// Short human description of how a child ended, e.g. `exit 1` or `signal 9`.
pub fn describe(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("exit {code}"),
        (None, Some(signal)) if status.core_dumped() => format!("signal {signal} (core dumped)"),
        (None, Some(signal)) => format!("signal {signal}"),
        (None, None) => "unknown".to_string(),
    }
}
