//! Line sources for the interactive loop
//!
//! [`Terminal`] edits lines with rustyline: tab completion, a status hint after the
//! cursor and a validator that refuses to submit a line the status analysis rejects.
//! [`ScriptedInput`] feeds predetermined lines, for tests and embedding.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use colored::Colorize;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hint, Hinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{CompletionType, Config, Context, Editor, Helper};

use crate::completion::Candidate;
use crate::config::ShellConfig;
use crate::error::{CliError, CliResult};
use crate::session::Shell;

const ERROR_MARK: &str = "✗";

/// Input shared by a session and the sub-sessions it enters
pub type SharedInput = Rc<RefCell<dyn LineSource>>;

/// Where the interactive loop reads its lines from
pub trait LineSource {
    /// Next line, or `None` at end of input. `shell` serves completion and validation.
    fn read_line(&mut self, prompt: &str, shell: &mut dyn Shell) -> CliResult<Option<String>>;
}

// =============================================================================
// SCRIPTED INPUT
// =============================================================================

/// Predetermined lines; end of input once they run out
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Rc::default(),
        }
    }

    /// Prompts shown so far, shared with the input once it is handed to a session
    pub fn prompts(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.prompts)
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str, _shell: &mut dyn Shell) -> CliResult<Option<String>> {
        let line = self.lines.pop_front();
        if line.is_some() {
            self.prompts.borrow_mut().push(prompt.to_string());
        }
        Ok(line)
    }
}

// =============================================================================
// TERMINAL
// =============================================================================

pub struct Terminal {
    history: Vec<String>,
    history_file: Option<PathBuf>,
    color: bool,
}

impl Terminal {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            history: Vec::new(),
            history_file: config.history_file.clone(),
            color: config.color,
        }
    }

    fn editor<'a>(&self, shell: &'a mut dyn Shell) -> CliResult<Editor<LineAssist<'a>, DefaultHistory>> {
        let config = Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();
        let mut editor: Editor<LineAssist<'a>, DefaultHistory> =
            Editor::with_config(config).map_err(readline_error)?;

        match &self.history_file {
            Some(path) if path.exists() => {
                if let Err(error) = editor.load_history(path) {
                    tracing::debug!(%error, path = %path.display(), "could not load history");
                }
            }
            Some(_) => {}
            None => {
                for entry in &self.history {
                    let _ = editor.add_history_entry(entry.as_str());
                }
            }
        }
        editor.set_helper(Some(LineAssist {
            shell: RefCell::new(shell),
            color: self.color,
        }));
        Ok(editor)
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str, shell: &mut dyn Shell) -> CliResult<Option<String>> {
        let mut editor = self.editor(shell)?;
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                    self.history.push(line.clone());
                    if let Some(path) = &self.history_file {
                        if let Err(error) = editor.append_history(path) {
                            tracing::debug!(%error, path = %path.display(), "could not save history");
                        }
                    }
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(error) => Err(readline_error(error)),
        }
    }
}

fn readline_error(error: ReadlineError) -> CliError {
    match error {
        ReadlineError::Io(error) => CliError::Io(error),
        other => CliError::Internal(format!("terminal failure: {}", other)),
    }
}

/// File-system candidates for a partially typed path
pub fn complete_path(partial: &str) -> Vec<Candidate> {
    let files = FilenameCompleter::new();
    match files.complete_path(partial, partial.len()) {
        Ok((start, pairs)) => pairs
            .into_iter()
            .map(|pair| Candidate {
                replacement: pair.replacement,
                display: pair.display,
                start,
            })
            .collect(),
        Err(error) => {
            tracing::debug!(%error, "path completion failed");
            Vec::new()
        }
    }
}

// =============================================================================
// EDITOR HELPER
// =============================================================================

struct LineAssist<'a> {
    shell: RefCell<&'a mut dyn Shell>,
    color: bool,
}

impl Completer for LineAssist<'_> {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self.shell.borrow_mut().complete(line, pos);
        let start = candidates.first().map_or(pos, |c| c.start);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.display,
                replacement: c.replacement,
            })
            .collect();
        Ok((start, pairs))
    }
}

/// Shown after the cursor, never inserted
struct StatusHint(String);

impl Hint for StatusHint {
    fn display(&self) -> &str {
        &self.0
    }

    fn completion(&self) -> Option<&str> {
        None
    }
}

impl Hinter for LineAssist<'_> {
    type Hint = StatusHint;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<StatusHint> {
        if pos < line.len() || line.trim().is_empty() {
            return None;
        }
        match self.shell.borrow_mut().inspect(line) {
            Ok(status) if status.is_empty() => None,
            Ok(status) => Some(StatusHint(format!("   {}", status))),
            Err(error) => Some(StatusHint(format!("   {} {}", ERROR_MARK, error))),
        }
    }
}

impl Highlighter for LineAssist<'_> {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if !self.color {
            return Cow::Borrowed(hint);
        }
        if hint.trim_start().starts_with(ERROR_MARK) {
            Cow::Owned(hint.red().to_string())
        } else {
            Cow::Owned(hint.dimmed().to_string())
        }
    }
}

impl Validator for LineAssist<'_> {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.trim().is_empty() {
            return Ok(ValidationResult::Valid(None));
        }
        // a trailing separator commits the last token
        match self.shell.borrow_mut().inspect(&format!("{} ", input)) {
            Ok(_) => Ok(ValidationResult::Valid(None)),
            Err(error) => Ok(ValidationResult::Invalid(Some(format!(
                "  {} {}",
                ERROR_MARK, error
            )))),
        }
    }
}

impl Helper for LineAssist<'_> {}
