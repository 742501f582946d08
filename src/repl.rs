//! Read-eval-print loop.
//!
//! An interactive terminal gets line editing and history through
//! rustyline. A script file or piped stdin is read line by line and only
//! results are written out. Either way a failing statement prints its error
//! and the loop moves on; end of input (or Ctrl-C) ends the session.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::config::InputSource;
use crate::database::Database;
use crate::printer::{format_error, render_rows};

const FAREWELL: &str = "Goodbye!";

pub struct Repl<'r> {
    db: Database<'r>,
    prompt: String,
    banner: Option<String>,
}

impl<'r> Repl<'r> {
    pub fn new(db: Database<'r>, prompt: impl Into<String>, banner: Option<String>) -> Self {
        Self {
            db,
            prompt: prompt.into(),
            banner,
        }
    }

    pub fn database(&self) -> &Database<'r> {
        &self.db
    }

    /// Runs until the input is exhausted.
    pub fn run(&mut self, input: &InputSource, history: Option<&Path>) -> Result<()> {
        match input {
            InputSource::Stdin if io::stdin().is_terminal() => self.run_interactive(history),
            InputSource::Stdin => {
                let stdin = io::stdin();
                self.run_script(stdin.lock(), &mut io::stdout().lock())
            }
            InputSource::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("cannot open input file {}", path.display()))?;
                self.run_script(BufReader::new(file), &mut io::stdout().lock())
            }
        }
    }

    /// Evaluates every line of `reader`, writing results to `out`.
    /// Bytes that are not valid UTF-8 are replaced, so such a line fails as
    /// a statement instead of ending the session.
    pub fn run_script<R: BufRead, W: Write>(&mut self, mut reader: R, out: &mut W) -> Result<()> {
        if let Some(banner) = &self.banner {
            writeln!(out, "{banner}")?;
        }
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .context("failed to read statement")?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(text) = self.eval(line) {
                writeln!(out, "{text}")?;
            }
        }
        writeln!(out, "{FAREWELL}")?;
        Ok(())
    }

    fn run_interactive(&mut self, history: Option<&Path>) -> Result<()> {
        let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
        if let Some(path) = history {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }
        if let Some(banner) = &self.banner {
            println!("{banner}");
        }

        loop {
            match editor.readline(&self.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = editor.add_history_entry(line.as_str()) {
                            debug!(error = %e, "history entry not recorded");
                        }
                    }
                    if let Some(text) = self.eval(&line) {
                        println!("{text}");
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    println!("{FAREWELL}");
                    break;
                }
                Err(err) => return Err(err).context("failed to read input"),
            }
        }

        if let Some(path) = history {
            if let Err(e) = editor.save_history(path) {
                warn!(path = %path.display(), error = %e, "failed to save history");
            }
        }
        Ok(())
    }

    /// Runs one statement and renders what should be printed for it.
    /// Blank lines print nothing.
    pub fn eval(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }
        match self.db.execute(line) {
            Ok(outcome) => Some(match outcome.notice {
                Some(notice) => notice,
                None => render_rows(&self.db.schema().fields(), &outcome.rows),
            }),
            Err(err) => {
                debug!(%line, error = %err, "statement failed");
                Some(format_error(&err))
            }
        }
    }
}
