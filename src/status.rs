//! Live Validator
//!
//! Status-bar analysis of a partial line: a breadcrumb of the addressed command's
//! parameters with the slot being typed marked, or a blocking [`LineError`]. Pure;
//! delegated remainders are handed back to the session.
//!
//! The argument index is the zero-based index of the token being typed among the
//! command's arguments. Without a variadic form, an index past the slot just after
//! the last fixed parameter is "too many inputs"; that slot itself is not flagged so
//! the error appears only once a separator commits to another argument.

use std::fmt;

use shell_types::Signature;
use thiserror::Error;

use crate::compiler::CompiledSet;
use crate::registry::KindTag;
use crate::reserved;
use crate::resolver::{coerce, keyword_token};
use crate::tokenizer::{self, Mode};

/// Blocking validation message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LineError {
    pub message: String,
}

impl LineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parameter breadcrumb for the status bar
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub cells: Vec<String>,
    /// Cell of the slot being typed
    pub active: Option<usize>,
    /// Type label of the active slot
    pub detail: Option<String>,
}

impl StatusLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cells.join(" "))?;
        if let Some(detail) = &self.detail {
            write!(f, "  :  {}", detail)?;
        }
        Ok(())
    }
}

/// Result of inspecting a line
#[derive(Debug, Clone, PartialEq)]
pub enum Inspection {
    Status(StatusLine),
    /// Validate the text after byte `offset` in the sub-session of `delegate`
    Forward { delegate: String, offset: usize },
}

/// Inspect a partial line
pub fn inspect<T>(commands: &CompiledSet<T>, line: &str) -> Result<Inspection, LineError> {
    let empty = Ok(Inspection::Status(StatusLine::empty()));
    let tokens = tokenizer::split_spans(line, Mode::Lenient)
        .map_err(|_| LineError::new("missing closing quotation"))?;
    let Some(last) = tokens.last() else {
        return empty;
    };
    let trailing = last.end < line.len();

    // (text, end offset) with help tokens dropped
    let mut words: Vec<(&str, usize)> = tokens
        .iter()
        .filter(|t| !reserved::is_help(&t.text))
        .map(|t| (t.text.as_str(), t.end))
        .collect();
    if trailing {
        words.push(("", line.len()));
    }
    let Some(&(first, first_end)) = words.first() else {
        return empty;
    };

    if reserved::is_read(first) {
        let extra_is_separator = words.len() == 3 && words[2].0.is_empty();
        if words.len() > 2 && !extra_is_separator {
            return Err(LineError::new(
                "reading from a file accepts a single path (wrap paths containing spaces in quotes)",
            ));
        }
        return empty;
    }

    let via_settings = reserved::is_settings(first);
    let (name, args) = if via_settings {
        match words.get(1) {
            Some(&(name, _)) => (name, &words[2..]),
            None => return empty,
        }
    } else {
        (first, &words[1..])
    };

    let Some(command) = commands.get(name) else {
        return empty;
    };
    match (command.tag(), via_settings) {
        (KindTag::Delegate, false) => {
            return Ok(Inspection::Forward {
                delegate: name.to_string(),
                offset: first_end,
            })
        }
        (KindTag::Setting, true) | (KindTag::Operation, false) => {}
        _ => return empty,
    }

    let args: Vec<&str> = args.iter().map(|&(text, _)| text).collect();
    inspect_arguments(name, command.signature(), &args).map(Inspection::Status)
}

fn inspect_arguments(
    name: &str,
    signature: &Signature,
    args: &[&str],
) -> Result<StatusLine, LineError> {
    let fixed = signature.fixed_count();
    let variadic = signature.has_variadic();
    let index = args.len().checked_sub(1);

    if let Some(i) = index {
        if !variadic && i > fixed {
            return Err(LineError::new(format!("too many inputs for '{}'", name)));
        }
    }

    // every token but the one being typed
    let completed = &args[..index.unwrap_or(0)];
    let positional = completed.iter().filter(|t| keyword_token(t).is_none());
    for (param, token) in signature.params().iter().zip(positional) {
        coerce(param, token).map_err(|e| LineError::new(e.to_string()))?;
    }

    let mut cells: Vec<String> = signature.params().iter().map(|p| p.label()).collect();
    if variadic {
        cells.push(variadic_cell(signature));
    }

    let status = match index {
        None => StatusLine {
            cells,
            active: None,
            detail: None,
        },
        Some(i) if !variadic && i >= fixed => StatusLine::empty(),
        Some(i) => {
            let shown = if variadic { i.min(fixed) } else { i };
            let detail = match signature.param(shown) {
                Some(param) => param.type_label(),
                None => variadic_detail(signature, fixed, args),
            };
            StatusLine {
                cells,
                active: Some(shown),
                detail: Some(detail),
            }
        }
    };
    Ok(status)
}

fn variadic_cell(signature: &Signature) -> String {
    let mut parts = Vec::new();
    if let Some(name) = signature.varargs_name() {
        parts.push(format!("*{}", name));
    }
    if let Some(name) = signature.varkw_name() {
        parts.push(format!("**{}", name));
    }
    format!("{{{}}}", parts.join(", "))
}

fn variadic_detail(signature: &Signature, fixed: usize, args: &[&str]) -> String {
    let present: Vec<&str> = args.iter().copied().filter(|t| !t.is_empty()).collect();
    let keywords = present.iter().filter(|t| keyword_token(t).is_some()).count();
    let positional = (present.len() - keywords).saturating_sub(fixed);

    let mut parts = Vec::new();
    if signature.varargs_name().is_some() {
        parts.push(format!("list [items={}]", positional));
    }
    if signature.varkw_name().is_some() {
        parts.push(format!("dict [items={}]", keywords));
    }
    parts.join(", ")
}

// =============================================================================
// TESTS
// =============================================================================
