//! Line sources feeding the read loop.

use crate::error::ShellError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, ErrorKind, Read, Write};

/// Initial size of the line buffer, and the amount it grows by when full.
pub const LINE_CHUNK: usize = 1024;

/// Something the shell can pull command lines from.
pub trait LineSource {
    /// Show `prompt` and read one line, without its trailing newline.
    ///
    /// The line is returned as raw bytes; it need not be valid UTF-8.
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>, ShellError>;
}

/// Reads lines byte by byte from a plain stream, writing the prompt to `out`.
pub struct StreamReader<R, W> {
    input: R,
    out: W,
}

impl<R: Read, W: Write> StreamReader<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Read raw bytes up to (not including) the next newline.
    ///
    /// The buffer starts at [`LINE_CHUNK`] bytes and grows by the same
    /// fixed amount whenever it fills up.
    fn read_raw(&mut self) -> Result<Option<Vec<u8>>, ShellError> {
        let mut buffer: Vec<u8> = Vec::new();
        buffer.try_reserve_exact(LINE_CHUNK)?;

        loop {
            match self.read_byte()? {
                None if buffer.is_empty() => return Ok(None),
                None | Some(b'\n') => return Ok(Some(buffer)),
                Some(byte) => {
                    if buffer.len() == buffer.capacity() {
                        buffer.try_reserve_exact(LINE_CHUNK)?;
                    }
                    buffer.push(byte);
                }
            }
        }
    }
}

impl<R: Read, W: Write> LineSource for StreamReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>, ShellError> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        self.read_raw()
    }
}

/// Interactive line editing backed by `rustyline`.
///
/// Lines are never added to the editor's history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self, ShellError> {
        let editor = DefaultEditor::new().map_err(ShellError::Editor)?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line.into_bytes())),
            Err(ReadlineError::Eof) => Ok(None),
            // Ctrl-C discards the line being edited.
            Err(ReadlineError::Interrupted) => Ok(Some(Vec::new())),
            Err(err) => Err(ShellError::Editor(err)),
        }
    }
}
