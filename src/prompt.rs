//! Interactive prompting.
//!
//! Prompts are written to stderr so stdout only carries the final report.
//! End of input is treated as an empty answer, which accepts the default
//! when there is one.

use std::{
    io::{self, BufRead, Stderr, StdinLock, Write},
    path::Path
};

use crate::error::{BootstrapResult, file_read_error, file_write_error};

/// Asks the operator for a value
pub trait Prompter {
    /// Ask `question`; an empty answer yields `default` when given
    fn ask(&mut self, question: &str, default: Option<&str>) -> BootstrapResult<String>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, question: &str, default: Option<&str>) -> BootstrapResult<String> {
        (**self).ask(question, default)
    }
}

/// Line-oriented prompter over any reader/writer pair
pub struct LinePrompter<R, W> {
    input:  R,
    output: W
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output
        }
    }

    /// Consume the prompter, returning the output sink
    pub fn into_output(self) -> W {
        self.output
    }
}

impl LinePrompter<StdinLock<'static>, Stderr> {
    /// Prompter reading stdin and writing to stderr
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str, default: Option<&str>) -> BootstrapResult<String> {
        let stdio = Path::new("<stdio>");
        let line = match default {
            Some(default) => format!("{} [{}]: ", question, default),
            None => format!("{}: ", question)
        };
        self.output
            .write_all(line.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| file_write_error(stdio, e))?;

        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .map_err(|e| file_read_error(stdio, e))?;

        let answer = answer.trim();
        match default {
            Some(default) if answer.is_empty() => Ok(default.to_string()),
            _ => Ok(answer.to_string())
        }
    }
}
